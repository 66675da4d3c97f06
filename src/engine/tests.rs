use crate::{
    CategoryCatalog, CategoryRef, FilterEdit, FilterSet, OptionExtensions, SearchOptions, SearchSession, SessionSettings,
    SpecialIn, Status, StructuredFilters, When,
};
use chrono::NaiveDate;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

fn catalog() -> CategoryCatalog {
    CategoryCatalog::new(vec![
        CategoryRef::new(5, "bugs"),
        CategoryRef::new(6, "support"),
        CategoryRef::with_parent(7, "howto", "support"),
        CategoryRef::new(8, "general"),
    ])
}

fn session_with(settings: SessionSettings) -> SearchSession<CategoryCatalog> {
    SearchSession::with_options(catalog(), settings, Arc::new(SearchOptions::default())).unwrap()
}

fn session() -> SearchSession<CategoryCatalog> {
    session_with(SessionSettings { current_user_present: true, tagging_enabled: true })
}

fn tags(values: &[&str]) -> Option<Vec<String>> {
    Some(values.iter().map(|v| v.to_string()).collect())
}

/// Extract `query` into a fresh session and return the filters.
fn extract_fresh(query: &str) -> StructuredFilters {
    let mut fresh = session();
    fresh.apply_query(query);
    fresh.filters().clone()
}

// --- Extraction ----------------------------------------------------------------

#[test]
fn extracts_every_filter() {
    let mut s = session();
    let changed = s.apply_query(
        "@Sam #support:howto tags:a,b in:bookmarks in:title status:closed before:2020-01-01 min_post_count:5 words",
    );

    let f = s.filters();
    assert_eq!(f.username.as_deref(), Some("sam"));
    assert_eq!(f.category.as_ref().map(|c| c.id), Some(7));
    assert_eq!(f.tags, tags(&["a", "b"]));
    assert!(!f.all_tags);
    assert_eq!(f.in_filter.as_deref(), Some("bookmarks"));
    assert!(f.special_in.title);
    assert!(!f.special_in.seen);
    assert_eq!(f.status, Some(Status::Closed));
    assert_eq!(f.post_time.when, When::Before);
    assert_eq!(f.post_time.days.as_deref(), Some("2020-01-01"));
    assert_eq!(f.min_post_count.as_deref(), Some("5"));

    assert!(changed.contains(FilterSet::USERNAME | FilterSet::CATEGORY | FilterSet::TAGS | FilterSet::IN_TITLE));
    assert!(!changed.contains(FilterSet::ALL_TAGS));
}

#[test]
fn extraction_is_idempotent() {
    let queries = [
        "hello world #general @sam",
        "category:5 tags:x+y in:seen after:2019-02-03 status:open",
        "user:bob with:images #release::tag min_post_count:10",
        "",
    ];

    for query in queries {
        let mut s = session();
        s.apply_query(query);
        let first = s.filters().clone();
        assert_eq!(s.apply_query(query), FilterSet::empty(), "query {query:?}");
        assert_eq!(s.filters(), &first, "query {query:?}");
    }
}

#[test]
fn removing_a_token_clears_its_field() {
    let mut s = session();
    s.apply_query("@sam #bugs tags:a in:first in:likes status:open after:2020-01-01 min_post_count:2");
    let changed = s.apply_query("");

    let f = s.filters();
    assert!(f.username.is_none());
    assert!(f.category.is_none());
    assert!(f.tags.is_none());
    assert!(f.in_filter.is_none());
    assert!(!f.special_in.likes);
    assert!(f.status.is_none());
    assert!(f.post_time.days.is_none());
    assert!(f.min_post_count.is_none());
    assert_eq!(f.post_time.when, When::Before);
    assert!(changed.contains(FilterSet::USERNAME | FilterSet::POST_TIME | FilterSet::IN_LIKES));
}

#[test]
fn post_time_direction_follows_the_string() {
    let mut s = session();
    s.apply_query("after:2020-01-01 words");
    assert_eq!(s.filters().post_time.when, When::After);

    s.apply_query("words");
    assert_eq!(s.filters(), &extract_fresh("words"));
    assert_eq!(s.filters().post_time.when, When::Before);

    assert_eq!(s.edit(FilterEdit::PostDays(Some("2021-01-01".to_string()))), "words before:2021-01-01");
}

#[test]
fn category_resolution_forms() {
    let cases: Vec<(&str, Option<u64>)> = vec![
        ("category:5 foo", Some(5)),
        ("#bugs", Some(5)),
        ("#BUGS", Some(5)),
        ("#support:howto", Some(7)),
        ("category:support:howto", Some(7)),
        ("#howto", None),
        ("#unknown", None),
        ("category:404", None),
    ];

    for (query, expected) in cases {
        assert_eq!(extract_fresh(query).category.map(|c| c.id), expected, "query {query:?}");
    }
}

#[test]
fn unresolved_category_keeps_the_current_one() {
    let mut s = session();
    s.apply_query("#bugs");
    assert_eq!(s.apply_query("#nonexistent"), FilterSet::empty());
    assert_eq!(s.filters().category.as_ref().map(|c| c.id), Some(5));
}

#[test]
fn tag_join_character_sets_mode() {
    let cases: Vec<(&str, Option<Vec<String>>, bool)> = vec![
        ("tags:a+b", tags(&["a", "b"]), true),
        ("tags:a,b", tags(&["a", "b"]), false),
        ("tag:Solo", tags(&["Solo"]), false),
        ("#release::tag", tags(&["release"]), false),
        ("tags:a,,b", tags(&["a", "b"]), false),
        ("tags:", None, false),
    ];

    for (query, expected, all) in cases {
        let f = extract_fresh(query);
        assert_eq!(f.tags, expected, "query {query:?}");
        assert_eq!(f.all_tags, all, "query {query:?}");
    }
}

#[test]
fn tag_category_lookalike_is_only_a_tag() {
    let f = extract_fresh("#bugs::tag");
    assert_eq!(f.tags, tags(&["bugs"]));
    assert!(f.category.is_none());
}

#[test]
fn tagging_disabled_skips_tags() {
    let mut s = session_with(SessionSettings { tagging_enabled: false, ..Default::default() });
    s.apply_query("tags:a,b rest");
    assert!(s.filters().tags.is_none());

    assert_eq!(s.edit(FilterEdit::Tags(tags(&["c"]))), "tags:a,b rest");
    assert!(s.filters().tags.is_none());
}

#[test]
fn in_values_depend_on_signed_in_user() {
    let mut anonymous = session_with(SessionSettings::default());
    anonymous.apply_query("in:bookmarks");
    assert!(anonymous.filters().in_filter.is_none());

    let mut signed_in = session();
    signed_in.apply_query("IN:Bookmarks");
    assert_eq!(signed_in.filters().in_filter.as_deref(), Some("bookmarks"));
}

#[test]
fn special_flags_do_not_touch_in_filter() {
    let f = extract_fresh("in:first in:seen in:personal");
    assert_eq!(f.in_filter.as_deref(), Some("first"));
    assert!(f.special_in.seen);
    assert!(f.special_in.personal);
    assert!(!f.special_in.title);
}

#[test]
fn post_time_keyword_sets_when() {
    let f = extract_fresh("AFTER:2021-12-31");
    assert_eq!(f.post_time.when, When::After);
    assert_eq!(f.post_time.days.as_deref(), Some("2021-12-31"));
    assert_eq!(f.post_time.date(), NaiveDate::from_ymd_opt(2021, 12, 31));
}

#[test]
fn duplicates_use_the_first_occurrence() {
    let mut s = session();
    s.apply_query("status:open status:closed");
    assert_eq!(s.filters().status, Some(Status::Open));

    // The edit rewrites the first block and leaves the duplicate untouched.
    assert_eq!(s.edit(FilterEdit::Status(Some(Status::Archived))), "status:archived status:closed");
}

#[test]
fn payload_case_rules() {
    let f = extract_fresh("@MixedCase min_post_count:ABC before:Yesterday tags:CamelTag");
    assert_eq!(f.username.as_deref(), Some("mixedcase"));
    assert_eq!(f.min_post_count.as_deref(), Some("abc"));
    assert_eq!(f.post_time.days.as_deref(), Some("Yesterday"));
    assert_eq!(f.tags, tags(&["CamelTag"]));
}

#[test]
fn empty_payload_clears() {
    let mut s = session();
    s.apply_query("@sam before:2020-01-01");
    s.apply_query("@ before:");
    assert!(s.filters().username.is_none());
    assert!(s.filters().post_time.days.is_none());
}

// --- Serialization -------------------------------------------------------------

#[test]
fn category_by_id_then_clear() {
    let mut s = session();
    s.apply_query("category:5 foo");
    assert_eq!(s.filters().category, Some(CategoryRef::new(5, "bugs")));

    assert_eq!(s.edit(FilterEdit::Category(None)), "foo");
    assert!(s.filters().category.is_none());
}

#[test]
fn category_rendering() {
    let mut s = session();
    s.apply_query("words");
    assert_eq!(s.select_category(Some(7)), "words #support:howto");
    assert_eq!(s.select_category(Some(5)), "words #bugs");

    s.apply_query("category:5 words");
    assert_eq!(s.select_category(Some(8)), "category:8 words");
    assert_eq!(s.select_category(Some(404)), "words");
}

#[test]
fn tags_all_mode_round_trip() {
    let mut s = session();
    s.edit(FilterEdit::AllTags(true));
    assert_eq!(s.edit(FilterEdit::Tags(tags(&["a", "b"]))), "tags:a+b");

    let f = extract_fresh("tags:a+b");
    assert!(f.all_tags);
    assert_eq!(f.tags, tags(&["a", "b"]));

    assert_eq!(s.edit(FilterEdit::AllTags(false)), "tags:a,b");
    assert_eq!(s.edit(FilterEdit::Tags(None)), "");
}

#[test]
fn tag_suffix_form_converges_to_canonical() {
    let mut s = session();
    s.apply_query("#release::tag words");
    assert_eq!(s.edit(FilterEdit::Tags(tags(&["release", "beta"]))), "tags:release,beta words");
}

#[test]
fn status_round_trip() {
    let mut s = session();
    s.apply_query("status:open widgets");
    assert_eq!(s.filters().status, Some(Status::Open));
    assert_eq!(s.edit(FilterEdit::Status(None)), "widgets");
}

#[test]
fn independent_special_flags() {
    let mut s = session();
    s.edit(FilterEdit::SpecialIn(SpecialIn::Title, true));
    assert_eq!(s.edit(FilterEdit::SpecialIn(SpecialIn::Seen, true)), "in:title in:seen");
    assert!(s.filters().special_in.title && s.filters().special_in.seen);

    let f = extract_fresh(s.query());
    assert!(f.special_in.title && f.special_in.seen);

    assert_eq!(s.edit(FilterEdit::SpecialIn(SpecialIn::Title, false)), "in:seen");
    assert!(!s.filters().special_in.title);
    assert!(s.filters().special_in.seen);
}

#[test]
fn in_filter_keyword() {
    let mut s = session();
    assert_eq!(s.edit(FilterEdit::In(Some("images".to_string()))), "with:images");
    assert_eq!(s.edit(FilterEdit::In(Some("Wiki".to_string()))), "in:wiki");
    assert_eq!(s.filters().in_filter.as_deref(), Some("wiki"));

    // A value the session does not offer is ignored.
    assert_eq!(s.edit(FilterEdit::In(Some("nope".to_string()))), "in:wiki");
    assert_eq!(s.filters().in_filter.as_deref(), Some("wiki"));

    // The generic in block never eats a special flag block.
    s.edit(FilterEdit::SpecialIn(SpecialIn::Likes, true));
    assert_eq!(s.edit(FilterEdit::In(None)), "in:likes");
}

#[test]
fn post_time_edits() {
    let mut s = session();
    s.apply_query("words");
    assert_eq!(s.edit(FilterEdit::PostWhen(When::After)), "words");
    assert_eq!(s.filters().post_time.when, When::After);

    let date = NaiveDate::from_ymd_opt(2022, 5, 9).unwrap();
    assert_eq!(s.edit(FilterEdit::PostDate(date)), "words after:2022-05-09");
    assert_eq!(s.edit(FilterEdit::PostWhen(When::Before)), "words before:2022-05-09");
    assert_eq!(s.edit(FilterEdit::PostWhen(When::After)), "words after:2022-05-09");
    // Clearing the date removes the block, and the direction goes back to its default.
    assert_eq!(s.edit(FilterEdit::PostDays(None)), "words");
    assert_eq!(s.filters().post_time.when, When::Before);
}

#[test]
fn username_and_post_count_edits_are_normalized() {
    let mut s = session();
    assert_eq!(s.edit(FilterEdit::Username(Some("  Sam ".to_string()))), "@sam");
    assert_eq!(s.filters().username.as_deref(), Some("sam"));
    assert_eq!(s.edit(FilterEdit::MinPostCount(Some("7".to_string()))), "@sam min_post_count:7");
    assert_eq!(s.edit(FilterEdit::Username(Some(String::new()))), "min_post_count:7");

    // Whitespace would split the token across blocks.
    assert_eq!(s.edit(FilterEdit::Username(Some("two words".to_string()))), "min_post_count:7");
    assert!(s.filters().username.is_none());
}

#[test]
fn edits_replace_in_place() {
    let mut s = session();
    s.apply_query("before @alice after");
    assert_eq!(s.edit(FilterEdit::Username(Some("bob".to_string()))), "before @bob after");
}

#[test]
fn edits_act_on_block_boundaries_only() {
    // The old token text also occurs inside an unrelated quoted phrase.
    let mut s = session();
    s.apply_query(r#""find status:open here" status:open"#);
    assert_eq!(s.filters().status, Some(Status::Open));
    assert_eq!(s.edit(FilterEdit::Status(Some(Status::Closed))), r#""find status:open here" status:closed"#);
    assert_eq!(s.edit(FilterEdit::Status(None)), r#""find status:open here""#);
}

#[test]
fn serialized_query_feeds_back_as_a_no_op() {
    let mut s = session();
    s.apply_query("some words");
    s.edit(FilterEdit::Username(Some("sam".to_string())));
    s.select_category(Some(7));
    s.edit(FilterEdit::AllTags(true));
    s.edit(FilterEdit::Tags(tags(&["x", "y"])));
    s.edit(FilterEdit::In(Some("watching".to_string())));
    s.edit(FilterEdit::SpecialIn(SpecialIn::Personal, true));
    s.edit(FilterEdit::Status(Some(Status::NoReplies)));
    s.edit(FilterEdit::MinPostCount(Some("3".to_string())));
    s.edit(FilterEdit::PostWhen(When::After));
    s.edit(FilterEdit::PostDays(Some("2020-02-02".to_string())));

    let query = s.query().to_string();
    assert_eq!(
        query,
        "some words @sam #support:howto tags:x+y in:watching in:personal status:noreplies min_post_count:3 after:2020-02-02"
    );

    let model = s.filters().clone();
    assert_eq!(s.apply_query(&query), FilterSet::empty());
    assert_eq!(s.filters(), &model);
    assert_eq!(extract_fresh(&query), model);
}

#[test]
fn whitespace_is_canonicalized_on_edit() {
    let mut s = session();
    s.apply_query("  lots   of\tspace ");
    assert_eq!(s.edit(FilterEdit::SpecialIn(SpecialIn::Seen, true)), "lots of space in:seen");
}

// --- Notifications -------------------------------------------------------------

#[test]
fn listeners_fire_once_per_change() {
    let queries = Rc::new(RefCell::new(Vec::<String>::new()));
    let categories = Rc::new(RefCell::new(Vec::<Option<u64>>::new()));

    let mut s = session();
    let q = Rc::clone(&queries);
    let c = Rc::clone(&categories);
    s.on_query_change(move |query| q.borrow_mut().push(query.to_string()))
        .on_category_change(move |category| c.borrow_mut().push(category.map(|c| c.id)));

    s.apply_query("#bugs words");
    s.apply_query("#bugs words");
    s.edit(FilterEdit::Status(Some(Status::Open)));
    s.select_category(None);

    assert_eq!(*queries.borrow(), vec!["#bugs words status:open".to_string(), "words status:open".to_string()]);
    assert_eq!(*categories.borrow(), vec![Some(5), None]);
}

#[test]
fn rejected_edit_emits_nothing() {
    let count = Rc::new(RefCell::new(0));
    let mut s = session();
    let counter = Rc::clone(&count);
    s.on_query_change(move |_| *counter.borrow_mut() += 1);

    s.edit(FilterEdit::Status(Some(Status::Other("bogus".to_string()))));
    s.edit(FilterEdit::Tags(tags(&["has space"])));
    s.edit(FilterEdit::Category(Some(CategoryRef::with_parent(9, "howto", "sup port"))));
    s.edit(FilterEdit::Category(Some(CategoryRef::with_parent(9, "how:to", "support"))));
    s.edit(FilterEdit::Category(Some(CategoryRef::new(9, "two words"))));
    assert_eq!(*count.borrow(), 0);
    assert_eq!(s.query(), "");
    assert!(s.filters().category.is_none());
}

// --- Registered options ----------------------------------------------------------

#[test]
fn registered_options_extend_the_grammar() {
    let mut options = SearchOptions::default();
    options
        .extend(&OptionExtensions {
            in_options_for_all: vec!["polls".to_string()],
            status_options: vec!["solved".to_string()],
            post_time_options: vec!["on".to_string()],
            with_keyword_options: vec!["polls".to_string()],
            ..Default::default()
        })
        .unwrap();
    let mut s = SearchSession::with_options(catalog(), SessionSettings::default(), Arc::new(options)).unwrap();

    s.apply_query("status:solved on:2020-01-01 in:polls");
    let f = s.filters();
    assert_eq!(f.status, Some(Status::Other("solved".to_string())));
    assert_eq!(f.post_time.when, When::Other("on".to_string()));
    assert_eq!(f.in_filter.as_deref(), Some("polls"));

    assert_eq!(s.edit(FilterEdit::In(Some("polls".to_string()))), "status:solved on:2020-01-01 with:polls");
}
