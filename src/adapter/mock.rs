//! Mock drivers for testing — preconfigured responses and call counters.
//!
//! Call counts make the "no-retrieval issues no adapter calls" property
//! directly assertable; delays let timeout handling be exercised without
//! a real slow store.

use super::traits::{
    DriverError, GraphDriver, GraphQuery, GraphRow, ScoredDocument, VectorDriver, VectorQuery,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

enum MockOutcome<T> {
    Rows(Vec<T>),
    Unavailable(String),
    Misconfigured(String),
}

impl<T: Clone> MockOutcome<T> {
    fn produce(&self) -> Result<Vec<T>, DriverError> {
        match self {
            MockOutcome::Rows(rows) => Ok(rows.clone()),
            MockOutcome::Unavailable(msg) => Err(DriverError::Unavailable(msg.clone())),
            MockOutcome::Misconfigured(msg) => Err(DriverError::Misconfigured(msg.clone())),
        }
    }
}

/// Mock graph driver.
pub struct MockGraphDriver {
    outcome: MockOutcome<GraphRow>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockGraphDriver {
    /// Always returns the given rows (bounded upstream by the adapter).
    pub fn with_rows(rows: Vec<GraphRow>) -> Self {
        Self {
            outcome: MockOutcome::Rows(rows),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always returns no rows.
    pub fn empty() -> Self {
        Self::with_rows(Vec::new())
    }

    /// Always fails with `Unavailable`.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self {
            outcome: MockOutcome::Unavailable(msg.into()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always fails with `Misconfigured` (fatal).
    pub fn misconfigured(msg: impl Into<String>) -> Self {
        Self {
            outcome: MockOutcome::Misconfigured(msg.into()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Sleep before answering, to exercise timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many times `fetch` was called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GraphDriver for MockGraphDriver {
    async fn fetch(&self, _query: &GraphQuery) -> Result<Vec<GraphRow>, DriverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.produce()
    }
}

/// Mock vector driver.
pub struct MockVectorDriver {
    outcome: MockOutcome<ScoredDocument>,
    /// Extra documents returned only at limits past the quick ceiling,
    /// to simulate deeper tiers surfacing better material.
    deep_documents: Vec<(usize, ScoredDocument)>,
    /// Fail with `Unavailable` once the requested limit reaches this,
    /// to simulate a store that falls over under deeper queries.
    unavailable_at_limit: Option<usize>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockVectorDriver {
    pub fn with_documents(documents: Vec<ScoredDocument>) -> Self {
        Self {
            outcome: MockOutcome::Rows(documents),
            deep_documents: Vec::new(),
            unavailable_at_limit: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::with_documents(Vec::new())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self {
            outcome: MockOutcome::Unavailable(msg.into()),
            deep_documents: Vec::new(),
            unavailable_at_limit: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn misconfigured(msg: impl Into<String>) -> Self {
        Self {
            outcome: MockOutcome::Misconfigured(msg.into()),
            deep_documents: Vec::new(),
            unavailable_at_limit: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Add a document that only appears once the requested limit reaches
    /// `min_limit`.
    pub fn with_document_at_limit(mut self, min_limit: usize, document: ScoredDocument) -> Self {
        self.deep_documents.push((min_limit, document));
        self
    }

    /// Fail with `Unavailable` once the requested limit reaches `min_limit`.
    pub fn with_unavailable_at_limit(mut self, min_limit: usize) -> Self {
        self.unavailable_at_limit = Some(min_limit);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorDriver for MockVectorDriver {
    async fn search(&self, query: &VectorQuery) -> Result<Vec<ScoredDocument>, DriverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(min_limit) = self.unavailable_at_limit {
            if query.limit >= min_limit {
                return Err(DriverError::Unavailable("store overloaded".into()));
            }
        }
        let mut documents = self.outcome.produce()?;
        for (min_limit, doc) in &self.deep_documents {
            if query.limit >= *min_limit {
                documents.push(doc.clone());
            }
        }
        documents.truncate(query.limit);
        Ok(documents)
    }
}
