//! The engine — one object wiring analysis, retrieval, and assembly.
//!
//! Hosts drive it in two steps: `run` executes a full retrieval cycle and
//! returns everything the caller needs to produce an answer; `commit`
//! records the completed exchange into the session window. Keeping the
//! commit separate lets the host record the answer it actually produced,
//! and means abandoned or cancelled cycles never touch the context.

use crate::adapter::{GraphAdapter, GraphDriver, VectorAdapter, VectorDriver};
use crate::analyzer::{
    AnalyzeError, Query, QueryAnalyzer, QueryCategory, RoutingDecision, RoutingTarget, TargetMode,
};
use crate::assembler::{AssembledEvidence, Assembler};
use crate::config::RetrievalConfig;
use crate::evidence::EvidenceBundle;
use crate::retriever::{CancellationToken, HybridRetriever, RetrieveError};
use crate::session::{SessionId, SessionRegistry, Turn, TurnEntity};
use crate::vocab::EntityVocabulary;
use std::sync::Arc;
use thiserror::Error;

/// Answer summaries stored in the window are capped at this many chars.
const ANSWER_SUMMARY_MAX_CHARS: usize = 500;

const CLARIFY_RESPONSE: &str = "您指的是哪一款车型？请明确后再问一次。";
const NO_DATA_RESPONSE: &str =
    "抱歉，知识库中没有检索到与这个问题相关的信息，暂时无法回答。";

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Retrieve(#[from] RetrieveError),
}

/// What one cycle produced for the caller.
#[derive(Debug)]
pub enum CycleOutcome {
    /// Evidence was found; hand the context block to generation.
    Evidence(AssembledEvidence),
    /// The query needed no retrieval; answer with this text as-is.
    Direct(String),
    /// An ambiguous reference; ask the user to pick one of these.
    Clarify(Vec<String>),
    /// Retrieval ran to the deepest tier and found nothing.
    NoData(String),
}

impl CycleOutcome {
    /// The answer text a host without its own generation step can use.
    pub fn fallback_answer(&self) -> String {
        match self {
            CycleOutcome::Evidence(assembled) => assembled.context_block.clone(),
            CycleOutcome::Direct(text) | CycleOutcome::NoData(text) => text.clone(),
            CycleOutcome::Clarify(_) => CLARIFY_RESPONSE.to_string(),
        }
    }
}

/// The full record of one cycle.
#[derive(Debug)]
pub struct CycleResult {
    pub outcome: CycleOutcome,
    pub decision: RoutingDecision,
    pub bundle: EvidenceBundle,
    query_text: String,
}

impl CycleResult {
    pub fn query_text(&self) -> &str {
        &self.query_text
    }
}

/// Analysis, retrieval, assembly, and session state behind one interface.
pub struct ConfluxEngine {
    analyzer: QueryAnalyzer,
    retriever: HybridRetriever,
    assembler: Assembler,
    sessions: SessionRegistry,
}

impl ConfluxEngine {
    pub fn new(
        vocab: Arc<dyn EntityVocabulary>,
        graph: Arc<dyn GraphDriver>,
        vector: Arc<dyn VectorDriver>,
        config: RetrievalConfig,
    ) -> Self {
        let assembler = Assembler::new(config.max_rendered_items);
        let sessions = SessionRegistry::new(config.context_window);
        let retriever = HybridRetriever::new(
            GraphAdapter::new(graph),
            VectorAdapter::new(vector, config.max_distance),
            config,
        );
        Self {
            analyzer: QueryAnalyzer::new(vocab),
            retriever,
            assembler,
            sessions,
        }
    }

    pub fn open_session(&self) -> SessionId {
        self.sessions.open()
    }

    pub fn close_session(&self, id: &SessionId) -> bool {
        self.sessions.close(id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.session_count()
    }

    /// Run one retrieval cycle. Does not modify the session window.
    pub async fn run(
        &self,
        session: &SessionId,
        text: &str,
        mode: TargetMode,
        cancel: &CancellationToken,
    ) -> Result<CycleResult, EngineError> {
        let window = self.sessions.window(session).unwrap_or_default();
        let query = Query::new(text, mode).with_history(window);

        let decision = match self.analyzer.analyze(&query) {
            Ok(decision) => decision,
            Err(AnalyzeError::AmbiguousEntity { candidates }) => {
                tracing::info!(?candidates, "ambiguous reference, asking for clarification");
                return Ok(CycleResult {
                    outcome: CycleOutcome::Clarify(candidates),
                    decision: RoutingDecision::no_retrieval(
                        QueryCategory::Domain,
                        CLARIFY_RESPONSE,
                    ),
                    bundle: EvidenceBundle::empty(),
                    query_text: text.to_string(),
                });
            }
        };

        tracing::debug!(
            target = ?decision.target,
            category = ?decision.category,
            complexity = decision.complexity,
            entities = decision.entities.len(),
            "query analyzed"
        );

        if decision.target == RoutingTarget::NoRetrieval {
            let reply = decision
                .direct_response
                .clone()
                .unwrap_or_default();
            return Ok(CycleResult {
                outcome: CycleOutcome::Direct(reply),
                decision,
                bundle: EvidenceBundle::empty(),
                query_text: text.to_string(),
            });
        }

        let bundle = self.retriever.retrieve(&query, &decision, cancel).await?;
        let outcome = match self.assembler.assemble(&bundle) {
            Ok(assembled) => CycleOutcome::Evidence(assembled),
            Err(_) => CycleOutcome::NoData(NO_DATA_RESPONSE.to_string()),
        };

        Ok(CycleResult {
            outcome,
            decision,
            bundle,
            query_text: text.to_string(),
        })
    }

    /// Record a completed exchange into the session window.
    ///
    /// Cancelled cycles are ignored: an abandoned cycle must leave the
    /// context exactly as it was.
    pub fn commit(&self, session: &SessionId, result: &CycleResult, answer: &str) {
        if result.bundle.cancelled {
            tracing::debug!(%session, "cancelled cycle, context unchanged");
            return;
        }
        let entities: Vec<TurnEntity> = result
            .decision
            .entities
            .iter()
            .map(|e| TurnEntity::new(e.kind, e.name.clone()))
            .collect();
        let summary: String = answer.chars().take(ANSWER_SUMMARY_MAX_CHARS).collect();
        self.sessions.record(
            session,
            Turn::new(result.query_text.clone(), summary).with_entities(entities),
        );
    }
}
