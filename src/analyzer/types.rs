//! Query and routing-decision types

use crate::evidence::Tier;
use crate::session::Turn;
use crate::vocab::EntityKind;
use serde::{Deserialize, Serialize};

/// The product module a query is asked from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetMode {
    /// Persona and need analysis ("user insights").
    UserInsight,
    /// Structured spec and sentiment comparison across vehicles.
    CompetitorComparison,
    /// Long-form drafting (PRDs) that needs the widest evidence base.
    DocumentDrafting,
}

/// One user query plus the conversational state it arrived with.
/// Immutable once created.
#[derive(Debug, Clone)]
pub struct Query {
    text: String,
    mode: TargetMode,
    /// Prior turns, oldest-first, already bounded by the session window.
    history: Vec<Turn>,
}

impl Query {
    pub fn new(text: impl Into<String>, mode: TargetMode) -> Self {
        Self {
            text: text.into(),
            mode,
            history: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<Turn>) -> Self {
        self.history = history;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn mode(&self) -> TargetMode {
        self.mode
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }
}

/// Which store(s) a cycle should hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutingTarget {
    /// Greeting/meta/malformed input: answer directly, issue no retrieval.
    NoRetrieval,
    GraphOnly,
    VectorOnly,
    Hybrid,
}

/// Coarse category the intent classifier assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryCategory {
    Greeting,
    Meta,
    Malformed,
    Domain,
}

/// Where a resolved entity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityOrigin {
    /// Named directly in the current query text.
    Query,
    /// Inherited from the conversation window (pronoun/ellipsis).
    Context,
}

/// An entity the analyzer resolved for this cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEntity {
    /// Canonical name, as the stores index it.
    pub name: String,
    pub kind: EntityKind,
    pub origin: EntityOrigin,
}

impl ResolvedEntity {
    pub fn from_query(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            origin: EntityOrigin::Query,
        }
    }

    pub fn from_context(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            origin: EntityOrigin::Context,
        }
    }
}

/// The analyzer's verdict for one query.
///
/// Deterministic with respect to the (query, context window) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub target: RoutingTarget,
    pub category: QueryCategory,
    /// Complexity in [0,1]; monotonic in length, entities, comparison cues.
    pub complexity: f32,
    pub entities: Vec<ResolvedEntity>,
    pub initial_tier: Tier,
    /// Safe canned reply for `NoRetrieval` targets.
    pub direct_response: Option<String>,
}

impl RoutingDecision {
    /// A decision that bypasses retrieval entirely.
    pub fn no_retrieval(category: QueryCategory, direct_response: impl Into<String>) -> Self {
        Self {
            target: RoutingTarget::NoRetrieval,
            category,
            complexity: 0.0,
            entities: Vec::new(),
            initial_tier: Tier::Quick,
            direct_response: Some(direct_response.into()),
        }
    }

    pub fn entity_names(&self) -> Vec<&str> {
        self.entities.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn entities_of(&self, kind: EntityKind) -> impl Iterator<Item = &ResolvedEntity> {
        self.entities.iter().filter(move |e| e.kind == kind)
    }
}
