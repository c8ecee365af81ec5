//! Interpreters that need no network

use crate::core::filter::Interpretation;
use crate::core::service::QueryInterpreter;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Interpreter used when no AI service is configured: always declines
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInterpreter;

#[async_trait]
impl QueryInterpreter for NoInterpreter {
    async fn interpret(&self, _query: &str) -> Result<Option<Interpretation>> {
        Ok(None)
    }
}

/// Interpreter answering from a fixed table of queries
///
/// Lookups are case-insensitive on the trimmed query. Handy for demos and
/// tests that need a deterministic interpretation.
#[derive(Debug, Clone, Default)]
pub struct FixedInterpreter {
    answers: HashMap<String, Interpretation>,
}

impl FixedInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer(mut self, query: &str, interpretation: Interpretation) -> Self {
        self.answers
            .insert(query.trim().to_lowercase(), interpretation);
        self
    }
}

#[async_trait]
impl QueryInterpreter for FixedInterpreter {
    async fn interpret(&self, query: &str) -> Result<Option<Interpretation>> {
        Ok(self.answers.get(&query.trim().to_lowercase()).cloned())
    }
}
