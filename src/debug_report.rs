use querysync::{CompiledRules, Filter, FilterSet, StructuredFilters};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

/// One applied `--set` edit and the query it produced.
pub struct EditStep {
    pub label: String,
    pub query: String,
    /// Whether the edit changed the query or the filters.
    pub changed: bool,
}

pub fn print_run(
    input: &str,
    rules: &CompiledRules,
    changed: FilterSet,
    steps: &[EditStep],
    filters: &StructuredFilters,
    color: bool,
) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Query: \"{}\"", input), ansi::CYAN)));

    println!("\n{}", palette.paint("━━━ Blocks ━━━", ansi::GRAY));
    print_blocks(input, rules, &palette);

    println!("\n{}", palette.paint("━━━ Extracted ━━━", ansi::GRAY));
    if changed.is_empty() {
        println!("{}", palette.dim("  No filters found"));
    } else {
        let names: Vec<String> = changed.iter_names().map(|(name, _)| name.to_lowercase()).collect();
        println!("  {} {}", palette.dim("changed:"), palette.paint(names.join(", "), ansi::YELLOW));
    }

    if !steps.is_empty() {
        println!("\n{}", palette.paint("━━━ Edits ━━━", ansi::GRAY));
        for (idx, step) in steps.iter().enumerate() {
            let status = if step.changed {
                palette.paint("✓", ansi::GREEN)
            } else {
                palette.paint("✗ no change", ansi::YELLOW)
            };
            println!(
                "  {} {} {}",
                palette.paint(format!("[{}]", idx), ansi::GRAY),
                palette.paint(&step.label, ansi::BLUE),
                status
            );
            println!("      {} {}", palette.dim("query:"), palette.bold(&step.query));
        }
    }

    println!("\n{}", palette.paint("━━━ Filters ━━━", ansi::GRAY));
    print_filters(filters, &palette);
    println!();
}

fn print_blocks(input: &str, rules: &CompiledRules, palette: &ansi::Palette) {
    let blocks = querysync::tokenize(input);
    if blocks.is_empty() {
        println!("{}", palette.dim("  (empty)"));
        return;
    }

    for (idx, block) in blocks.iter().enumerate() {
        let claimed = match rules.classify(block) {
            Some(filter) => palette.paint(filter_name(filter), ansi::BLUE),
            None => palette.dim("text"),
        };
        println!(
            "  {} {} {} {} {}",
            palette.paint(format!("[{}]", idx), ansi::GRAY),
            palette.bold(palette.paint(&block.text, ansi::GREEN)),
            palette.dim("│"),
            palette.paint(format!("span {}..{}", block.range.start, block.range.end), ansi::YELLOW),
            claimed
        );
    }
}

fn print_filters(filters: &StructuredFilters, palette: &ansi::Palette) {
    let field = |name: &str, value: Option<String>| match value {
        Some(value) => println!("  {} {}", palette.dim(format!("{name:<15}")), palette.paint(value, ansi::GREEN)),
        None => println!("  {} {}", palette.dim(format!("{name:<15}")), palette.dim("-")),
    };

    field("username", filters.username.clone());
    field(
        "category",
        filters.category.as_ref().map(|c| match &c.parent_slug {
            Some(parent) => format!("{parent}:{} (id {})", c.slug, c.id),
            None => format!("{} (id {})", c.slug, c.id),
        }),
    );
    let mode = if filters.all_tags { "all" } else { "any" };
    field("tags", filters.tags.as_ref().map(|t| format!("{} ({mode})", t.join(", "))));
    field("in", filters.in_filter.clone());
    let flags: Vec<&str> = querysync::SpecialIn::ALL
        .into_iter()
        .filter(|flag| filters.special_in.get(*flag))
        .map(|flag| flag.as_str())
        .collect();
    field("in flags", (!flags.is_empty()).then(|| flags.join(", ")));
    field("status", filters.status.as_ref().map(|s| s.to_string()));
    field("min_post_count", filters.min_post_count.clone());
    field("post time", filters.post_time.days.as_ref().map(|days| format!("{} {days}", filters.post_time.when)));
}

fn filter_name(filter: Filter) -> &'static str {
    match filter {
        Filter::Username => "username",
        Filter::Category => "category",
        Filter::Tags => "tags",
        Filter::In => "in",
        Filter::SpecialIn(flag) => match flag {
            querysync::SpecialIn::Title => "in:title",
            querysync::SpecialIn::Likes => "in:likes",
            querysync::SpecialIn::Personal => "in:personal",
            querysync::SpecialIn::Seen => "in:seen",
        },
        Filter::Status => "status",
        Filter::MinPostCount => "min_post_count",
        Filter::PostTime => "post time",
    }
}
