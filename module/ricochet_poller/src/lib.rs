//! Adaptive-backoff polling of the store for new callbacks.
//!
//! Modeled as an explicit state machine driven by repeated `poll_once()`
//! calls rather than a coroutine with implicit suspension. Ownership of
//! "which tokens have already produced a callback" lives in a single
//! `HashSet` owned by one `Poller`, not a shared concurrent map — a
//! passive-mode batch has exactly one reader and one writer (the CLI's
//! own poll loop), so there is nothing to share.

#![warn(missing_docs)]

use ricochet_store::Store;
use ricochet_types::{Finding, Token};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// Result type for poller operations.
pub type Result<T> = std::result::Result<T, ricochet_store::StoreError>;

/// Adaptive backoff parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollConfig {
    /// Interval used while callbacks are still arriving.
    pub base_interval: Duration,
    /// Ceiling the backed-off interval never exceeds.
    pub max_interval: Duration,
    /// Multiplier applied once `quiet_threshold` consecutive empty polls
    /// have elapsed.
    pub factor: f64,
    /// Consecutive empty polls allowed at `base_interval` before backoff
    /// begins.
    pub quiet_threshold: u32,
    /// Total wall-time budget for the whole passive-mode session.
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_secs(5),
            max_interval: Duration::from_secs(60),
            factor: 1.5,
            quiet_threshold: 5,
            timeout: Duration::from_secs(3600),
        }
    }
}

/// Which state the poll loop is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    /// At least one poll in the current streak observed a new callback, or
    /// no empty poll has happened yet.
    Active,
    /// `quiet_threshold` consecutive polls have observed nothing new; the
    /// interval is growing.
    Quiet,
    /// The session's wall-time budget has elapsed.
    Terminated,
}

/// The outcome of one [`Poller::poll_once`] call.
#[derive(Debug, Clone)]
pub struct PollTick {
    /// Findings newly observed since the previous poll (empty if nothing
    /// new arrived).
    pub new_findings: Vec<Finding>,
    /// The phase the poller is in *after* this poll.
    pub phase: PollPhase,
    /// The interval the caller should sleep before the next poll.
    pub next_interval: Duration,
}

/// Drives passive-mode polling for one injection batch: repeatedly asks the
/// store for findings belonging to `tokens` and applies the adaptive
/// backoff state machine to the result.
#[derive(Debug)]
pub struct Poller {
    store: Store,
    tokens: HashSet<Token>,
    seen_callback_ids: HashSet<i64>,
    config: PollConfig,
    interval: Duration,
    quiet_streak: u32,
    phase: PollPhase,
    started_at: Instant,
}

impl Poller {
    /// Starts a new poller over `tokens`, the batch just injected.
    #[must_use]
    pub fn new(store: Store, tokens: impl IntoIterator<Item = Token>, config: PollConfig) -> Self {
        let interval = config.base_interval;
        Self {
            store,
            tokens: tokens.into_iter().collect(),
            seen_callback_ids: HashSet::new(),
            config,
            interval,
            quiet_streak: 0,
            phase: PollPhase::Active,
            started_at: Instant::now(),
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    /// Interval the caller should currently be sleeping for between polls.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// `true` once the session's wall-time budget (`config.timeout`) has
    /// elapsed since [`Poller::new`] was called.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.started_at.elapsed() >= self.config.timeout
    }

    /// Queries the store for findings belonging to this batch's tokens,
    /// advances the backoff state machine, and reports what's new.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store query fails.
    pub async fn poll_once(&mut self) -> Result<PollTick> {
        if self.is_expired() {
            self.phase = PollPhase::Terminated;
            return Ok(PollTick {
                new_findings: Vec::new(),
                phase: self.phase,
                next_interval: self.interval,
            });
        }

        let all_findings = self.store.get_findings(None, None).await?;
        let new_findings: Vec<Finding> = all_findings
            .into_iter()
            .filter(|f| self.tokens.contains(&f.injection.token))
            .filter(|f| self.seen_callback_ids.insert(f.callback.id))
            .collect();

        self.advance(!new_findings.is_empty());

        Ok(PollTick {
            new_findings,
            phase: self.phase,
            next_interval: self.interval,
        })
    }

    /// Applies one step of the adaptive backoff state machine.
    fn advance(&mut self, observed_new: bool) {
        if observed_new {
            self.interval = self.config.base_interval;
            self.quiet_streak = 0;
            self.phase = PollPhase::Active;
            return;
        }

        self.quiet_streak += 1;
        if self.quiet_streak > self.config.quiet_threshold {
            let grown = self.interval.mul_f64(self.config.factor);
            self.interval = grown.min(self.config.max_interval);
            self.phase = PollPhase::Quiet;
        }
    }
}

/// Counts how many callbacks have been observed per token so far, for
/// `suggest --recent`-style CLI reporting without re-querying the store.
#[must_use]
pub fn callback_counts(findings: &[Finding]) -> HashMap<Token, usize> {
    let mut counts = HashMap::new();
    for finding in findings {
        *counts.entry(finding.injection.token.clone()).or_insert(0) += 1;
    }
    counts
}
