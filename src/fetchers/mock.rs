//! Scripted fetchers for testing
//!
//! Deterministic [`Fetcher`] implementations that replay a fixed script of
//! outcomes, letting cascade behavior be tested independently of any real
//! network or browser strategy. Available to integration tests through the
//! `test-utils` feature.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::{
    error::FetchError,
    fetchers::{Fetcher, TierOptions},
    routing::types::FetchedContent,
};

/// One scripted outcome
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    /// Succeed with this content
    Ok(String),
    /// Fail with this error message
    Err(String),
    /// Sleep this long, then succeed; used to trip tier timeouts
    Stall(Duration),
}

/// Fetcher that replays a script of outcomes in order
///
/// When the script runs out, the last outcome repeats. Call counts are
/// tracked so tests can assert exactly how many attempts reached a tier.
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<ScriptedOutcome>>,
    last: ScriptedOutcome,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new(outcomes: Vec<ScriptedOutcome>) -> Self {
        let last = outcomes
            .last()
            .cloned()
            .unwrap_or_else(|| ScriptedOutcome::Err("empty script".to_string()));
        Self {
            script: Mutex::new(outcomes.into()),
            last,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fetcher that always succeeds with the given content
    pub fn always_ok(content: &str) -> Self {
        Self::new(vec![ScriptedOutcome::Ok(content.to_string())])
    }

    /// Fetcher that always fails with the given message
    pub fn always_err(message: &str) -> Self {
        Self::new(vec![ScriptedOutcome::Err(message.to_string())])
    }

    /// Fetcher that always stalls longer than any reasonable tier budget
    pub fn always_stalls(delay: Duration) -> Self {
        Self::new(vec![ScriptedOutcome::Stall(delay)])
    }

    /// Number of times this fetcher was invoked
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_outcome(&self) -> ScriptedOutcome {
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap_or_else(|| self.last.clone())
        }
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch(&self, _url: &str, _options: &TierOptions) -> Result<FetchedContent, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.next_outcome() {
            ScriptedOutcome::Ok(content) => Ok(FetchedContent {
                content,
                status: 200,
            }),
            ScriptedOutcome::Err(message) => Err(FetchError::Other(message)),
            ScriptedOutcome::Stall(delay) => {
                tokio::time::sleep(delay).await;
                Ok(FetchedContent {
                    content: String::new(),
                    status: 200,
                })
            }
        }
    }
}
