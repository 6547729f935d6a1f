// tests/filter_properties.rs
//
// Set-level properties of the rule matchers over the builtin taxonomy.

use makeup_recommender::catalog::{preprocess, CatalogSnapshot, RawCount, RawVideoRecord};
use makeup_recommender::filter::{apply_rule, Candidates};
use makeup_recommender::taxonomy::TagRule;
use makeup_recommender::Registry;

fn row(id: u64, occasions: &str, moods: &str, text: &str) -> RawVideoRecord {
    RawVideoRecord {
        id: Some(RawCount::Int(id)),
        title: Some(text.to_string()),
        tone: Some("봄웜".to_string()),
        occasions: Some(occasions.to_string()),
        moods: Some(moods.to_string()),
        ..RawVideoRecord::default()
    }
}

fn catalog() -> CatalogSnapshot {
    preprocess(vec![
        row(1, "출근/등교", "청순", "학생 등교 메이크업"),
        row(2, "출근/등교", "러블리", "오피스 출근 메이크업"),
        row(3, "데이트", "러블리", "학생 데이트 복숭아"),
        row(4, "격식있는", "고급스러운", "하객 메이크업 음영"),
        row(5, "출근/등교", "내추럴(자연스러운), 청순", "새내기 노파데 민낯"),
        row(6, "파티", "힙·트렌디", "y2k 도우인 스타일"),
    ])
}

fn is_subset(inner: &[u64], outer: &[u64]) -> bool {
    inner.iter().all(|id| outer.contains(id))
}

#[test]
fn applying_rules_in_sequence_never_grows_the_set() {
    let registry = Registry::builtin().expect("builtin taxonomy");
    let snap = catalog();
    let rules: Vec<&TagRule> = registry
        .occasion_tags()
        .iter()
        .chain(registry.mood_tags().iter())
        .map(|(_, r)| r)
        .collect();

    for a in &rules {
        let after_a = apply_rule(&snap, a);
        let a_ids = after_a.ids();
        assert!(is_subset(&a_ids, &Candidates::all(&snap).ids()));
        for b in &rules {
            let after_b = after_a.apply_rule(b);
            assert!(
                is_subset(&after_b.ids(), &a_ids),
                "apply(apply(S, A), B) must be within apply(S, A)"
            );
        }
    }
}

#[test]
fn hybrid_match_is_the_intersection_of_label_and_text_matches() {
    let registry = Registry::builtin().expect("builtin taxonomy");
    let snap = catalog();

    for (tag, rule) in registry.occasion_tags().iter().chain(registry.mood_tags().iter()) {
        let TagRule::Hybrid { labels, keywords } = rule else {
            continue;
        };
        let label_only = TagRule::Label {
            labels: labels.clone(),
        };
        let text_only = TagRule::Text {
            keywords: keywords.clone(),
        };
        let by_label = apply_rule(&snap, &label_only).ids();
        let by_text = apply_rule(&snap, &text_only).ids();
        let expected: Vec<u64> = by_label
            .iter()
            .copied()
            .filter(|id| by_text.contains(id))
            .collect();
        assert_eq!(apply_rule(&snap, rule).ids(), expected, "hybrid {tag}");
    }
}

#[test]
fn hybrid_rejects_label_match_without_keyword() {
    let registry = Registry::builtin().expect("builtin taxonomy");
    let snap = catalog();
    let student = registry
        .occasion_tags()
        .get("#학생/등교")
        .expect("student tag");

    // Row 2 carries the commute label but no student keyword; row 3 the keyword but not the label.
    assert_eq!(apply_rule(&snap, student).ids(), vec![1, 5]);
}

#[test]
fn text_rules_match_normalized_free_text() {
    let registry = Registry::builtin().expect("builtin taxonomy");
    let snap = catalog();
    let y2k = registry.mood_tags().get("#Y2K").expect("y2k tag");
    assert_eq!(apply_rule(&snap, y2k).ids(), vec![6]);
}
