mod debug_report;

use chrono::NaiveDate;
use debug_report::EditStep;
use querysync::{FilterEdit, PostTime, SearchSession, SpecialIn, Status, SyncConfig, When, registry};
use serde::Serialize;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "QUERYSYNC_LOG";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(err.code);
    }
}

struct CliArgs {
    input: String,
    config: Option<PathBuf>,
    current_user: bool,
    no_tagging: bool,
    edits: Vec<String>,
    json: bool,
    color: bool,
}

struct CliError {
    message: String,
    code: i32,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

fn invalid(message: impl Into<String>) -> CliError {
    CliError { message: message.into(), code: 2 }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    query: &'a str,
    filters: &'a querysync::StructuredFilters,
}

fn run(args: CliArgs) -> Result<(), CliError> {
    let mut config = match &args.config {
        Some(path) => SyncConfig::load(path).map_err(|err| invalid(format!("error: {err}")))?,
        None => SyncConfig::default(),
    };
    if args.current_user {
        config.settings.current_user_present = true;
    }
    if args.no_tagging {
        config.settings.tagging_enabled = false;
    }

    registry::register_search_options(&config.extensions).map_err(|err| invalid(format!("error: {err}")))?;
    let mut session = SearchSession::new(config.catalog(), config.settings.clone())
        .map_err(|err| CliError { message: format!("error: {err}"), code: 1 })?;

    let changed = session.apply_query(args.input.trim());

    let mut steps = Vec::new();
    for raw in &args.edits {
        let edit = parse_edit(raw)?;
        let before = (session.query().to_string(), session.filters().clone());
        match edit {
            CliEdit::Filter(edit) => session.edit(edit),
            CliEdit::SelectCategory(id) => session.select_category(id),
        };
        let changed = before.0 != session.query() || &before.1 != session.filters();
        steps.push(EditStep { label: raw.clone(), query: session.query().to_string(), changed });
    }

    if args.json {
        let report = JsonReport { query: session.query(), filters: session.filters() };
        let json = serde_json::to_string_pretty(&report)
            .map_err(|err| CliError { message: format!("error: {err}"), code: 1 })?;
        println!("{json}");
    } else {
        debug_report::print_run(args.input.trim(), session.rules(), changed, &steps, session.filters(), args.color);
    }
    Ok(())
}

enum CliEdit {
    Filter(FilterEdit),
    SelectCategory(Option<u64>),
}

/// Parse one `--set FIELD=VALUE` argument. An empty value clears the field.
fn parse_edit(raw: &str) -> Result<CliEdit, CliError> {
    let (field, value) =
        raw.split_once('=').ok_or_else(|| invalid(format!("error: --set expects FIELD=VALUE, got '{raw}'")))?;
    let text = || if value.is_empty() { None } else { Some(value.to_string()) };

    let edit = match field {
        "username" | "user" => FilterEdit::Username(text()),
        "category" => {
            let id = match value {
                "" => None,
                _ => Some(value.parse::<u64>().map_err(|_| invalid(format!("error: invalid category id '{value}'")))?),
            };
            return Ok(CliEdit::SelectCategory(id));
        }
        "tags" => FilterEdit::Tags(text().map(|v| v.split(',').map(str::to_string).collect())),
        "all_tags" => FilterEdit::AllTags(parse_bool(field, value)?),
        "in" => FilterEdit::In(text()),
        "status" => FilterEdit::Status(text().map(Status::from)),
        "min_post_count" => FilterEdit::MinPostCount(text()),
        "when" => FilterEdit::PostWhen(When::from(value)),
        "days" => FilterEdit::PostDays(text()),
        "date" => {
            let date = NaiveDate::parse_from_str(value, PostTime::DATE_FORMAT)
                .map_err(|_| invalid(format!("error: invalid date '{value}' (expected YYYY-MM-DD)")))?;
            FilterEdit::PostDate(date)
        }
        _ => match field.strip_prefix("in:").map(str::parse::<SpecialIn>) {
            Some(Ok(flag)) => FilterEdit::SpecialIn(flag, parse_bool(field, value)?),
            _ => return Err(invalid(format!("error: unknown field '{field}'\n\n{}", help_text()))),
        },
    };
    Ok(CliEdit::Filter(edit))
}

fn parse_bool(field: &str, value: &str) -> Result<bool, CliError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        _ => Err(invalid(format!("error: {field} expects true/false, got '{value}'"))),
    }
}

fn parse_args() -> Result<CliArgs, String> {
    let mut input: Option<String> = None;
    let mut config = None;
    let mut current_user = false;
    let mut no_tagging = false;
    let mut edits = Vec::new();
    let mut json = false;
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("querysync {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "--json" => json = true,
            "--user" => current_user = true,
            "--no-tagging" => no_tagging = true,
            "--config" | "-c" => {
                let value = args.next().ok_or_else(|| "error: --config expects a path".to_string())?;
                config = Some(PathBuf::from(value));
            }
            "--set" | "-s" => {
                let value = args.next().ok_or_else(|| "error: --set expects FIELD=VALUE".to_string())?;
                edits.push(value);
            }
            "--input" | "-i" => {
                let value = args.next().ok_or_else(|| "error: --input expects a value".to_string())?;
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(value);
            }
            "--" => {
                let rest = args.collect::<Vec<_>>().join(" ");
                if !rest.trim().is_empty() {
                    if input.is_some() {
                        return Err("error: input provided multiple times".to_string());
                    }
                    input = Some(rest);
                }
                break;
            }
            _ if arg.starts_with("--config=") => {
                config = Some(PathBuf::from(arg.trim_start_matches("--config=")));
            }
            _ if arg.starts_with("--set=") => {
                edits.push(arg.trim_start_matches("--set=").to_string());
            }
            _ if arg.starts_with("--input=") => {
                let value = arg.trim_start_matches("--input=");
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(value.to_string());
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                let rest = std::iter::once(arg).chain(args).collect::<Vec<_>>().join(" ");
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(rest);
                break;
            }
        }
    }

    // An empty query is valid when edits build one from scratch.
    let input = match input {
        Some(value) => value,
        None if !edits.is_empty() || io::stdin().is_terminal() => String::new(),
        None => read_stdin_input()?,
    };

    if input.trim().is_empty() && edits.is_empty() {
        return Err(format!("error: no input provided\n\n{}", help_text()));
    }

    Ok(CliArgs { input, config, current_user, no_tagging, edits, json, color })
}

fn read_stdin_input() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer)
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "querysync {version}

Extract search filters from a query string and write structured edits back.

Usage:
  querysync [OPTIONS] [--] <query...>
  querysync [OPTIONS] --input <query>

Options:
  -i, --input <query>        Query to parse. If omitted, reads remaining args
                             or stdin when no args are provided.
  -c, --config <path>        JSON config with settings, option extensions and
                             the category catalog.
  -s, --set <field=value>    Apply a structured edit (repeatable, in order).
                             Fields: username, category (id), tags (a,b),
                             all_tags, in, in:title, in:likes, in:personal,
                             in:seen, status, min_post_count, when, days,
                             date (YYYY-MM-DD). An empty value clears.
  --user                     Treat a user as signed in (widens in: values).
  --no-tagging               Disable tag extraction and serialization.
  --json                     Print the final query and filters as JSON.
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Environment:
  {log_env}               Log filter (tracing EnvFilter syntax). Default: warn

Exit codes:
  0  Success.
  1  Internal error.
  2  Invalid arguments, config or missing input.
",
        version = env!("CARGO_PKG_VERSION"),
        log_env = LOG_ENV
    )
}
