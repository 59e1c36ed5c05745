//! Hook system for Eris.
//!
//! Hooks observe the responder at fixed points of the message flow:
//!
//! - `on_match`: a rule matched the incoming text
//! - `on_miss`: no rule matched; the default response is sent
//! - `on_low_rating`: a rating flagged the matched rule for revision
//! - `on_override`: feedback text replaced (or created) a rule
//!
//! Hooks only observe. They cannot change the reply or the rules.

mod builtin;

pub use builtin::{LoggingHook, Metrics, MetricsCounters, MetricsHook};

use async_trait::async_trait;

use crate::types::{Rating, Rule};
use crate::ErisResult;

// ═══════════════════════════════════════════════════════════════════════════
// Event types
// ═══════════════════════════════════════════════════════════════════════════

/// Event that triggers a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    /// A rule matched.
    OnMatch,

    /// No rule matched.
    OnMiss,

    /// A rating fell below the revision threshold.
    OnLowRating,

    /// Feedback text overwrote a rule.
    OnOverride,
}

impl HookEvent {
    /// All events, in flow order.
    pub const ALL: [HookEvent; 4] = [
        HookEvent::OnMatch,
        HookEvent::OnMiss,
        HookEvent::OnLowRating,
        HookEvent::OnOverride,
    ];
}

impl std::fmt::Display for HookEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookEvent::OnMatch => write!(f, "on_match"),
            HookEvent::OnMiss => write!(f, "on_miss"),
            HookEvent::OnLowRating => write!(f, "on_low_rating"),
            HookEvent::OnOverride => write!(f, "on_override"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Hook context
// ═══════════════════════════════════════════════════════════════════════════

/// Context passed to hooks.
pub enum HookContext<'a> {
    /// Context for on_match.
    OnMatch {
        /// Incoming text.
        text: &'a str,
        /// Rule that matched.
        rule: &'a Rule,
    },

    /// Context for on_miss.
    OnMiss {
        /// Incoming text.
        text: &'a str,
    },

    /// Context for on_low_rating.
    OnLowRating {
        /// Rule the rating was given for.
        rule: &'a Rule,
        /// The rating.
        rating: Rating,
    },

    /// Context for on_override.
    OnOverride {
        /// Incoming text, now the rule's input pattern.
        text: &'a str,
        /// New response.
        response: &'a str,
        /// Whether the rule did not exist before.
        created: bool,
    },
}

impl<'a> HookContext<'a> {
    /// Returns the event matching this context.
    pub fn event(&self) -> HookEvent {
        match self {
            HookContext::OnMatch { .. } => HookEvent::OnMatch,
            HookContext::OnMiss { .. } => HookEvent::OnMiss,
            HookContext::OnLowRating { .. } => HookEvent::OnLowRating,
            HookContext::OnOverride { .. } => HookEvent::OnOverride,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Hook trait
// ═══════════════════════════════════════════════════════════════════════════

/// Trait for custom hooks.
#[async_trait]
pub trait Hook: Send + Sync {
    /// Hook name.
    fn name(&self) -> &str;

    /// Event that triggers this hook.
    fn event(&self) -> HookEvent;

    /// Runs the hook.
    async fn execute(&self, context: &HookContext<'_>) -> ErisResult<()>;
}

// ═══════════════════════════════════════════════════════════════════════════
// Hook system
// ═══════════════════════════════════════════════════════════════════════════

/// Hook registry.
pub struct HookSystem {
    on_match: Vec<Box<dyn Hook>>,
    on_miss: Vec<Box<dyn Hook>>,
    on_low_rating: Vec<Box<dyn Hook>>,
    on_override: Vec<Box<dyn Hook>>,
}

impl HookSystem {
    /// Creates an empty hook system.
    pub fn new() -> Self {
        Self {
            on_match: Vec::new(),
            on_miss: Vec::new(),
            on_low_rating: Vec::new(),
            on_override: Vec::new(),
        }
    }

    /// Creates a system with the default hooks (logging on every event).
    pub fn with_defaults() -> Self {
        let mut system = Self::new();
        for event in HookEvent::ALL {
            system.register(Box::new(LoggingHook::new(event)));
        }
        system
    }

    /// Registers a hook.
    pub fn register(&mut self, hook: Box<dyn Hook>) {
        let event = hook.event();
        tracing::debug!(
            hook_name = hook.name(),
            event = %event,
            "Registering hook"
        );

        self.hooks_mut(event).push(hook);
    }

    fn hooks_mut(&mut self, event: HookEvent) -> &mut Vec<Box<dyn Hook>> {
        match event {
            HookEvent::OnMatch => &mut self.on_match,
            HookEvent::OnMiss => &mut self.on_miss,
            HookEvent::OnLowRating => &mut self.on_low_rating,
            HookEvent::OnOverride => &mut self.on_override,
        }
    }

    fn hooks(&self, event: HookEvent) -> &[Box<dyn Hook>] {
        match event {
            HookEvent::OnMatch => &self.on_match,
            HookEvent::OnMiss => &self.on_miss,
            HookEvent::OnLowRating => &self.on_low_rating,
            HookEvent::OnOverride => &self.on_override,
        }
    }

    /// Runs every hook registered for the context's event.
    ///
    /// A hook error is logged and does not stop the remaining hooks.
    async fn run_all(&self, context: &HookContext<'_>) {
        for hook in self.hooks(context.event()) {
            if let Err(e) = hook.execute(context).await {
                tracing::warn!(hook = hook.name(), error = %e, "Hook failed");
            }
        }
    }

    /// Runs on_match hooks.
    pub async fn run_on_match(&self, text: &str, rule: &Rule) {
        self.run_all(&HookContext::OnMatch { text, rule }).await;
    }

    /// Runs on_miss hooks.
    pub async fn run_on_miss(&self, text: &str) {
        self.run_all(&HookContext::OnMiss { text }).await;
    }

    /// Runs on_low_rating hooks.
    pub async fn run_on_low_rating(&self, rule: &Rule, rating: Rating) {
        self.run_all(&HookContext::OnLowRating { rule, rating }).await;
    }

    /// Runs on_override hooks.
    pub async fn run_on_override(&self, text: &str, response: &str, created: bool) {
        self.run_all(&HookContext::OnOverride {
            text,
            response,
            created,
        })
        .await;
    }

    /// Returns the total number of registered hooks.
    pub fn count(&self) -> usize {
        HookEvent::ALL
            .iter()
            .map(|&event| self.count_for_event(event))
            .sum()
    }

    /// Returns the number of hooks registered for an event.
    pub fn count_for_event(&self, event: HookEvent) -> usize {
        self.hooks(event).len()
    }
}

impl Default for HookSystem {
    fn default() -> Self {
        Self::new()
    }
}
