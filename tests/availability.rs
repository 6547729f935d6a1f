// tests/availability.rs
//
// Constraint-tag availability and compatibility over the current context.

use makeup_recommender::catalog::{preprocess, RawCount, RawVideoRecord};
use makeup_recommender::{CatalogHandle, FilterContext, Recommender, Registry};

fn row(id: u64, tone: &str, occasions: &str, moods: &str, text: &str) -> RawVideoRecord {
    RawVideoRecord {
        id: Some(RawCount::Int(id)),
        title: Some(text.to_string()),
        tone: Some(tone.to_string()),
        occasions: Some(occasions.to_string()),
        moods: Some(moods.to_string()),
        views: Some(RawCount::Int(1_000)),
        likes: Some(RawCount::Int(50)),
        published_at: Some("2025-01-01".to_string()),
        ..RawVideoRecord::default()
    }
}

fn recommender() -> Recommender {
    Recommender::new(
        Registry::builtin().expect("builtin taxonomy"),
        CatalogHandle::new(preprocess(vec![
            row(1, "봄웜", "출근/등교", "청순", "노파데 데일리 애교살"),
            row(2, "봄웜", "출근/등교", "러블리", "노아이라인 애교살 포인트"),
            row(3, "여쿨", "출근/등교", "시크", "무쌍 메이크업"),
            row(4, "가을웜", "데이트", "러블리", "오버립 코랄"),
        ])),
    )
}

fn warm_commute(rec: &Recommender) -> FilterContext {
    FilterContext::builder()
        .tone("봄웜")
        .occasion_group("출근/등교")
        .build(rec.registry())
        .expect("valid context")
}

fn tags(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

#[test]
fn available_lists_only_constraints_with_matches_in_registry_order() {
    let rec = recommender();
    let ctx = warm_commute(&rec);
    let available = rec.available_tags(&ctx).expect("available");
    assert_eq!(available, tags(&["#노아이라인", "#노파데", "#애교살"]));
}

#[test]
fn tag_without_matches_is_unavailable_and_incompatible() {
    let rec = recommender();
    let ctx = warm_commute(&rec);

    // Only the cool row mentions 무쌍, and the warm request filtered it out.
    let available = rec.available_tags(&ctx).expect("available");
    assert!(!available.contains(&"#무쌍".to_string()));

    let compatible = rec
        .compatible_tags(&tags(&["#무쌍"]), &ctx)
        .expect("compatible");
    assert!(compatible.is_empty());
}

#[test]
fn dead_end_anywhere_in_the_selection_yields_empty() {
    let rec = recommender();
    let ctx = warm_commute(&rec);
    // #노파데 alone narrows to row 1; #무쌍 then empties it.
    let compatible = rec
        .compatible_tags(&tags(&["#노파데", "#무쌍"]), &ctx)
        .expect("compatible");
    assert_eq!(compatible, Vec::<String>::new());

    let compatible = rec
        .compatible_tags(&tags(&["#무쌍", "#노파데"]), &ctx)
        .expect("compatible");
    assert_eq!(compatible, Vec::<String>::new());
}

#[test]
fn compatible_keeps_selection_and_co_occurring_tags() {
    let rec = recommender();
    let ctx = warm_commute(&rec);

    let compatible = rec
        .compatible_tags(&tags(&["#애교살"]), &ctx)
        .expect("compatible");
    assert_eq!(compatible, tags(&["#노아이라인", "#노파데", "#애교살"]));

    let compatible = rec
        .compatible_tags(&tags(&["#노파데"]), &ctx)
        .expect("compatible");
    assert_eq!(compatible, tags(&["#노파데", "#애교살"]));
}

#[test]
fn empty_selection_means_every_constraint_is_compatible() {
    let rec = recommender();
    let ctx = warm_commute(&rec);
    let compatible = rec.compatible_tags(&[], &ctx).expect("compatible");
    assert_eq!(compatible, rec.registry().constraint_tags());
}

#[test]
fn choices_intersect_available_with_compatible() {
    let rec = recommender();
    let ctx = warm_commute(&rec);

    let choices = rec
        .constraint_choices(&tags(&["#노파데"]), &ctx)
        .expect("choices");
    assert_eq!(choices.enabled, tags(&["#노파데", "#애교살"]));

    let choices = rec
        .constraint_choices(&tags(&["#무쌍"]), &ctx)
        .expect("choices");
    assert!(choices.compatible.is_empty());
    assert!(choices.enabled.is_empty());
}

#[test]
fn mood_detail_replaces_the_broad_group_in_the_resolver() {
    let rec = recommender();
    // The lovely group alone keeps row 2; the #청순 detail replaces it and keeps row 1.
    let ctx = FilterContext::builder()
        .tone("봄웜")
        .occasion_group("출근/등교")
        .mood_group("group_lovely")
        .detail_tag("#청순")
        .build(rec.registry())
        .expect("valid context");
    let available = rec.available_tags(&ctx).expect("available");
    assert_eq!(available, tags(&["#노파데", "#애교살"]));
}

#[test]
fn unknown_selected_constraint_is_a_configuration_error() {
    let rec = recommender();
    let ctx = warm_commute(&rec);
    assert!(rec
        .compatible_tags(&tags(&["#쌍꺼풀"]), &ctx)
        .is_err());
}
