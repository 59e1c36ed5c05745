//! Built-in hooks.
//!
//! - `LoggingHook`: logs responder events
//! - `MetricsHook`: counts matches, misses, low ratings and overrides

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::ErisResult;

use super::{Hook, HookContext, HookEvent, HookSystem};

// ═══════════════════════════════════════════════════════════════════════════
// LoggingHook
// ═══════════════════════════════════════════════════════════════════════════

/// Hook that logs responder events through `tracing`.
#[derive(Debug)]
pub struct LoggingHook {
    event: HookEvent,
}

impl LoggingHook {
    /// Creates a logging hook for one event.
    pub fn new(event: HookEvent) -> Self {
        Self { event }
    }
}

#[async_trait]
impl Hook for LoggingHook {
    fn name(&self) -> &str {
        "logging"
    }

    fn event(&self) -> HookEvent {
        self.event
    }

    async fn execute(&self, context: &HookContext<'_>) -> ErisResult<()> {
        match context {
            HookContext::OnMatch { text, rule } => {
                tracing::debug!(
                    text = %text,
                    pattern = %rule.input_pattern,
                    "Rule matched"
                );
            }
            HookContext::OnMiss { text } => {
                tracing::debug!(text = %text, "No rule matched");
            }
            HookContext::OnLowRating { rule, rating } => {
                tracing::warn!(
                    pattern = %rule.input_pattern,
                    response = %rule.output_pattern,
                    %rating,
                    "Low rating - rule needs revision"
                );
            }
            HookContext::OnOverride {
                text,
                response,
                created,
            } => {
                tracing::info!(
                    pattern = %text,
                    response = %response,
                    created,
                    "Rule rewritten from feedback"
                );
            }
        }

        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// MetricsHook
// ═══════════════════════════════════════════════════════════════════════════

/// Counters shared by the metrics hooks of one hook system.
#[derive(Debug, Default)]
pub struct MetricsCounters {
    matches: AtomicU64,
    misses: AtomicU64,
    low_ratings: AtomicU64,
    overrides: AtomicU64,
}

impl MetricsCounters {
    /// Total messages answered by a rule.
    pub fn total_matches(&self) -> u64 {
        self.matches.load(Ordering::Relaxed)
    }

    /// Total messages that matched nothing.
    pub fn total_misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn total_low_ratings(&self) -> u64 {
        self.low_ratings.load(Ordering::Relaxed)
    }

    pub fn total_overrides(&self) -> u64 {
        self.overrides.load(Ordering::Relaxed)
    }

    /// Share of messages answered by a rule.
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_matches() + self.total_misses();
        if total == 0 {
            0.0
        } else {
            self.total_matches() as f64 / total as f64
        }
    }

    /// Returns the counters as a snapshot.
    pub fn metrics(&self) -> Metrics {
        Metrics {
            matches: self.total_matches(),
            misses: self.total_misses(),
            low_ratings: self.total_low_ratings(),
            overrides: self.total_overrides(),
            hit_rate: self.hit_rate(),
        }
    }
}

/// Snapshot of [`MetricsCounters`].
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub matches: u64,
    pub misses: u64,
    pub low_ratings: u64,
    pub overrides: u64,
    pub hit_rate: f64,
}

/// Hook that feeds one event into shared [`MetricsCounters`].
#[derive(Debug)]
pub struct MetricsHook {
    event: HookEvent,
    counters: Arc<MetricsCounters>,
}

impl MetricsHook {
    /// Creates a metrics hook for one event.
    pub fn new(event: HookEvent, counters: Arc<MetricsCounters>) -> Self {
        Self { event, counters }
    }

    /// Registers a metrics hook for every event and returns the shared counters.
    pub fn install(system: &mut HookSystem) -> Arc<MetricsCounters> {
        let counters = Arc::new(MetricsCounters::default());
        for event in HookEvent::ALL {
            system.register(Box::new(Self::new(event, counters.clone())));
        }
        counters
    }
}

#[async_trait]
impl Hook for MetricsHook {
    fn name(&self) -> &str {
        "metrics"
    }

    fn event(&self) -> HookEvent {
        self.event
    }

    async fn execute(&self, context: &HookContext<'_>) -> ErisResult<()> {
        let counter = match context {
            HookContext::OnMatch { .. } => &self.counters.matches,
            HookContext::OnMiss { .. } => &self.counters.misses,
            HookContext::OnLowRating { .. } => &self.counters.low_ratings,
            HookContext::OnOverride { .. } => &self.counters.overrides,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        Ok(())
    }
}
