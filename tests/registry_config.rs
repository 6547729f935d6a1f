// tests/registry_config.rs
//
// Taxonomy loading: validation failures surface at load time, never per request.

use std::io::Write as _;

use makeup_recommender::error::RuleTable;
use makeup_recommender::{ConfigurationError, Registry};

const TONES: &str = r##"
[tones]
warm = ["봄웜", "가을웜"]
cool = ["여쿨", "겨쿨"]
"##;

fn with_tones(body: &str) -> String {
    format!("{TONES}\n{body}")
}

#[test]
fn minimal_file_compiles() {
    let reg = Registry::from_toml_str(&with_tones(
        r##"
[[mood_groups]]
key = "group_lovely"
labels = ["러블리"]

[[mood_tags]]
tag = "#과즙상"
kind = "label"
labels = ["러블리"]

[[constraints]]
tag = "#무쌍"
patterns = ['무\s*쌍']
"##,
    ))
    .expect("minimal taxonomy");

    assert_eq!(reg.mood_tags().len(), 1);
    assert_eq!(reg.constraint_tags(), vec!["#무쌍".to_string()]);
    let group = reg.mood_groups().get("group_lovely").expect("group");
    assert_eq!(group.display, "group_lovely", "display defaults to the key");
    assert_eq!(reg.tones().unclassified(), "미분류");
}

#[test]
fn malformed_constraint_regex_fails_at_load() {
    let err = Registry::from_toml_str(&with_tones(
        r##"
[[constraints]]
tag = "#오버립"
patterns = ['오버\s*립', '(unclosed']
"##,
    ))
    .expect_err("bad regex must be rejected");

    match err {
        ConfigurationError::InvalidPattern {
            table, tag, pattern, ..
        } => {
            assert_eq!(table, RuleTable::Constraint);
            assert_eq!(tag, "#오버립");
            assert_eq!(pattern, "(unclosed");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn duplicate_tag_in_one_table_fails() {
    let err = Registry::from_toml_str(&with_tones(
        r##"
[[mood_tags]]
tag = "#청순"
kind = "label"
labels = ["청순"]

[[mood_tags]]
tag = "#청순"
kind = "label"
labels = ["내추럴"]
"##,
    ))
    .expect_err("duplicate must be rejected");
    assert!(matches!(err, ConfigurationError::DuplicateTag { .. }));
}

#[test]
fn hybrid_without_keywords_fails() {
    let err = Registry::from_toml_str(&with_tones(
        r##"
[[occasion_tags]]
tag = "#하객/결혼식"
kind = "hybrid"
labels = ["격식있는"]
"##,
    ))
    .expect_err("empty hybrid must be rejected");
    assert!(matches!(err, ConfigurationError::EmptyRule { .. }));
}

#[test]
fn unknown_rule_kind_is_a_parse_error() {
    let err = Registry::from_toml_str(&with_tones(
        r##"
[[mood_tags]]
tag = "#청순"
kind = "fuzzy"
labels = ["청순"]
"##,
    ))
    .expect_err("unknown kind must be rejected");
    assert!(matches!(err, ConfigurationError::Parse(_)));
}

#[test]
fn unknown_tag_lookup_names_its_table() {
    let reg = Registry::builtin().expect("builtin taxonomy");
    let err = reg
        .constraints()
        .require("#없음")
        .expect_err("unknown tag");
    assert_eq!(err.to_string(), "unknown constraint tag `#없음`");
}

#[test]
fn loads_from_a_file_and_reports_missing_ones() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    write!(
        file,
        "{}",
        with_tones(
            r##"
[[styles]]
tag = "#제니"
include = ["제니", "Jennie"]
hard_ids = [7]
"##
        )
    )
    .expect("write taxonomy");

    let reg = Registry::load(Some(file.path())).expect("load from file");
    let style = reg.styles().get("#제니").expect("style");
    assert!(style.is_hard_id(7));
    assert!(style.include_keywords().contains(&"jennie".to_string()));

    let missing = file.path().with_extension("missing.toml");
    let err = Registry::load(Some(&missing)).expect_err("missing file");
    assert!(matches!(err, ConfigurationError::Read { .. }));
}

#[test]
fn no_path_means_the_embedded_taxonomy() {
    let reg = Registry::load(None).expect("embedded taxonomy");
    assert_eq!(reg.occasion_tags().len(), 6);
    assert_eq!(reg.mood_tags().len(), 18);
    assert_eq!(reg.styles().len(), 7);
    assert_eq!(reg.constraints().len(), 6);
}
