//! Entity vocabulary — the names the analyzer can recognize.
//!
//! The vocabulary is supplied by the population pipeline (out of scope here)
//! and consumed read-only. Aliases canonicalize colloquial mentions to the
//! standard names the stores index under, e.g. "小米" → "小米汽车",
//! "问界" → "AITO 问界".

use std::collections::BTreeSet;

/// The kinds of entity the system recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Brand,
    Series,
    Model,
    Persona,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Brand,
        EntityKind::Series,
        EntityKind::Model,
        EntityKind::Persona,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Brand => "brand",
            EntityKind::Series => "series",
            EntityKind::Model => "model",
            EntityKind::Persona => "persona",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One searchable surface form and what it canonicalizes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabTerm {
    /// The text to look for in a query.
    pub term: String,
    /// The standard name the stores index under.
    pub canonical: String,
    pub kind: EntityKind,
}

/// Read-only lookup of known entity names.
///
/// Implementations must be thread-safe; the analyzer holds one instance
/// per process and never mutates it.
pub trait EntityVocabulary: Send + Sync {
    /// Canonical names known for a kind.
    fn known_entities(&self, kind: EntityKind) -> BTreeSet<String>;

    /// Every searchable term (canonical names and aliases alike),
    /// each mapped to its canonical name.
    fn terms(&self) -> Vec<VocabTerm>;
}

/// In-memory vocabulary built once at startup.
#[derive(Debug, Default)]
pub struct StaticVocabulary {
    entries: Vec<VocabEntry>,
}

#[derive(Debug, Clone)]
struct VocabEntry {
    canonical: String,
    kind: EntityKind,
    aliases: Vec<String>,
}

impl StaticVocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a canonical name with zero or more aliases.
    pub fn with_entity<S: Into<String>>(
        mut self,
        kind: EntityKind,
        canonical: impl Into<String>,
        aliases: impl IntoIterator<Item = S>,
    ) -> Self {
        self.entries.push(VocabEntry {
            canonical: canonical.into(),
            kind,
            aliases: aliases.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl EntityVocabulary for StaticVocabulary {
    fn known_entities(&self, kind: EntityKind) -> BTreeSet<String> {
        self.entries
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.canonical.clone())
            .collect()
    }

    fn terms(&self) -> Vec<VocabTerm> {
        let mut terms = Vec::new();
        for entry in &self.entries {
            terms.push(VocabTerm {
                term: entry.canonical.clone(),
                canonical: entry.canonical.clone(),
                kind: entry.kind,
            });
            for alias in &entry.aliases {
                terms.push(VocabTerm {
                    term: alias.clone(),
                    canonical: entry.canonical.clone(),
                    kind: entry.kind,
                });
            }
        }
        terms
    }
}
