//! Complexity scoring — how hard is this query, and how deep do we start?

use super::types::ResolvedEntity;
use crate::evidence::Tier;
use crate::vocab::EntityKind;

/// Query length (chars) at which the length component saturates.
pub const LENGTH_SATURATION_CHARS: f32 = 64.0;

/// Entity count at which the entity component saturates.
pub const ENTITY_SATURATION: f32 = 3.0;

/// Component weights; they sum to 1 so the score stays in [0,1].
pub const LENGTH_WEIGHT: f32 = 0.3;
pub const ENTITY_WEIGHT: f32 = 0.4;
pub const COMPARISON_WEIGHT: f32 = 0.3;

/// Phrases that signal a comparison question.
const COMPARISON_MARKERS: &[&str] = &[
    "对比", "比较", "相比", "哪个好", "哪个更", "谁更", "区别", "差别", "versus", "compare",
];

/// Comparison language present in the text?
pub fn has_comparison_language(text: &str) -> bool {
    let lowered = text.to_lowercase();
    if COMPARISON_MARKERS.iter().any(|m| lowered.contains(m)) {
        return true;
    }
    // "vs" only counts as a standalone token, not inside another word.
    lowered
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| token == "vs")
}

/// Multiple entities of the same kind imply a comparison even without
/// explicit comparison wording.
pub fn is_comparison(text: &str, entities: &[ResolvedEntity]) -> bool {
    if has_comparison_language(text) {
        return true;
    }
    EntityKind::ALL.iter().any(|kind| {
        let mut names: Vec<&str> = entities
            .iter()
            .filter(|e| e.kind == *kind)
            .map(|e| e.name.as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        names.len() >= 2
    })
}

/// Score in [0,1], monotonic in query length, resolved entity count,
/// and presence of comparison language.
pub fn score(text: &str, entity_count: usize, comparison: bool) -> f32 {
    let length = (text.chars().count() as f32 / LENGTH_SATURATION_CHARS).min(1.0);
    let entities = (entity_count as f32 / ENTITY_SATURATION).min(1.0);
    let cmp = if comparison { 1.0 } else { 0.0 };

    (length * LENGTH_WEIGHT + entities * ENTITY_WEIGHT + cmp * COMPARISON_WEIGHT).clamp(0.0, 1.0)
}

/// Comparison-flagged queries skip `Quick` and start at `Standard`.
pub fn initial_tier(comparison: bool) -> Tier {
    if comparison {
        Tier::Standard
    } else {
        Tier::Quick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(name: &str) -> ResolvedEntity {
        ResolvedEntity::from_query(EntityKind::Series, name)
    }

    #[test]
    fn score_is_monotonic_in_length() {
        let short = score("续航", 0, false);
        let long = score("请详细分析一下这款车在冬季高速场景下的真实续航表现", 0, false);
        assert!(long > short);
    }

    #[test]
    fn score_is_monotonic_in_entities() {
        assert!(score("q", 2, false) > score("q", 1, false));
        assert!(score("q", 1, false) > score("q", 0, false));
    }

    #[test]
    fn comparison_raises_score() {
        assert!(score("q", 1, true) > score("q", 1, false));
    }

    #[test]
    fn score_stays_in_unit_interval() {
        let max = score(&"长".repeat(500), 10, true);
        assert!((0.0..=1.0).contains(&max));
    }

    #[test]
    fn two_same_kind_entities_imply_comparison() {
        let entities = vec![series("Model Y"), series("理想 L7")];
        assert!(is_comparison("这两款怎么选", &entities));
    }

    #[test]
    fn single_entity_without_markers_is_not_comparison() {
        let entities = vec![series("Model Y")];
        assert!(!is_comparison("Model Y怎么样", &entities));
    }

    #[test]
    fn explicit_marker_is_comparison() {
        assert!(is_comparison("对比一下", &[]));
        assert!(is_comparison("Model Y vs L7", &[]));
        assert!(!is_comparison("vsync problems", &[]));
    }

    #[test]
    fn comparison_starts_at_standard() {
        assert_eq!(initial_tier(true), Tier::Standard);
        assert_eq!(initial_tier(false), Tier::Quick);
    }
}
