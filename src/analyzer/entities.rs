//! Entity extraction and pronoun resolution.
//!
//! Extraction scans the query text against the vocabulary (canonical names
//! and aliases, whitespace-insensitive so "理想L7" matches "理想 L7").
//! Reference markers like "它" or "that car" resolve against the
//! conversation window, most-recent-first; a turn offering more than one
//! candidate of the referenced kind is ambiguous and needs clarification.

use super::types::ResolvedEntity;
use crate::session::Turn;
use crate::vocab::{EntityKind, EntityVocabulary};

/// Markers that refer back to a vehicle (model or series) from context.
const VEHICLE_REFERENCES: &[&str] = &[
    "它", "这款车", "那款车", "这辆车", "那辆车", "该车", "这个车型", "that car", "this car",
];

/// Markers that refer back to a persona from context.
const PERSONA_REFERENCES: &[&str] = &[
    "那个用户", "这类用户", "那类用户", "这群用户", "这些用户", "that user", "those users",
];

/// Markers that refer back to a brand from context.
const BRAND_REFERENCES: &[&str] = &["这个品牌", "该品牌", "那个品牌", "that brand", "this brand"];

/// English single-word markers that need word-boundary matching.
const WORD_REFERENCES: &[(&str, ReferentClass)] = &[("it", ReferentClass::Vehicle)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReferentClass {
    Vehicle,
    Persona,
    Brand,
}

impl ReferentClass {
    fn kinds(self) -> &'static [EntityKind] {
        match self {
            ReferentClass::Vehicle => &[EntityKind::Model, EntityKind::Series],
            ReferentClass::Persona => &[EntityKind::Persona],
            ReferentClass::Brand => &[EntityKind::Brand],
        }
    }
}

/// Strip whitespace and lowercase, for tolerant substring matching.
fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Scan the query text for vocabulary entities. Returns canonical names
/// with `Query` origin, first occurrence order, deduplicated.
pub fn extract_from_query(vocab: &dyn EntityVocabulary, text: &str) -> Vec<ResolvedEntity> {
    let haystack = normalize(text);
    let mut hits: Vec<(usize, ResolvedEntity)> = Vec::new();

    for term in vocab.terms() {
        let needle = normalize(&term.term);
        if needle.is_empty() {
            continue;
        }
        if let Some(pos) = haystack.find(&needle) {
            let already = hits
                .iter()
                .any(|(_, e)| e.name == term.canonical && e.kind == term.kind);
            if !already {
                hits.push((pos, ResolvedEntity::from_query(term.kind, term.canonical)));
            }
        }
    }

    hits.sort_by_key(|(pos, _)| *pos);
    hits.into_iter().map(|(_, e)| e).collect()
}

fn contains_word(text: &str, word: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .any(|token| token.eq_ignore_ascii_case(word))
}

fn referent_classes(text: &str) -> Vec<ReferentClass> {
    let lowered = text.to_lowercase();
    let mut classes = Vec::new();

    let groups: [(&[&str], ReferentClass); 3] = [
        (VEHICLE_REFERENCES, ReferentClass::Vehicle),
        (PERSONA_REFERENCES, ReferentClass::Persona),
        (BRAND_REFERENCES, ReferentClass::Brand),
    ];
    for (markers, class) in groups {
        if markers.iter().any(|m| lowered.contains(m)) && !classes.contains(&class) {
            classes.push(class);
        }
    }
    for (word, class) in WORD_REFERENCES {
        if contains_word(&lowered, word) && !classes.contains(class) {
            classes.push(*class);
        }
    }
    classes
}

/// Resolve pronoun/ellipsis references against the window.
///
/// Only fires for referent classes the query didn't already name an entity
/// for. Scans newest turn first; the first turn holding candidates of the
/// referenced kind wins. Exactly one candidate resolves; several distinct
/// candidates in that turn are ambiguous (`Err` carries their names); an
/// empty window resolves nothing.
pub fn inherit_from_context(
    text: &str,
    extracted: &[ResolvedEntity],
    window: &[Turn],
) -> Result<Vec<ResolvedEntity>, Vec<String>> {
    let mut inherited = Vec::new();

    for class in referent_classes(text) {
        let kinds = class.kinds();
        let satisfied = extracted.iter().any(|e| kinds.contains(&e.kind));
        if satisfied {
            continue;
        }

        // Most-recent-first.
        for turn in window.iter().rev() {
            let mut candidates: Vec<&crate::session::TurnEntity> = turn
                .entities
                .iter()
                .filter(|e| kinds.contains(&e.kind))
                .collect();
            candidates.dedup_by(|a, b| a.name == b.name);

            match candidates.len() {
                0 => continue,
                1 => {
                    let found = candidates[0];
                    inherited.push(ResolvedEntity::from_context(found.kind, found.name.clone()));
                }
                _ => {
                    return Err(candidates.into_iter().map(|e| e.name.clone()).collect());
                }
            }
            break;
        }
    }

    Ok(inherited)
}
