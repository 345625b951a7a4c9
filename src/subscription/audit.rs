//! Audit logging for entitlement checks.
//!
//! Denials, automatic status transitions and backend failures are reported
//! through an [`EntitlementAuditLogger`], so they can be routed to a database
//! or log pipeline without touching the enforcement path.

use std::fmt;

/// Audit events raised while enforcing entitlements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntitlementAuditEvent {
    /// An end date passed and the stored status was moved to expired.
    SubscriptionAutoExpired {
        tenant_id: String,
        previous_status: String,
        expiry: String,
    },
    /// An action was refused.
    ActionDenied {
        tenant_id: String,
        action: String,
        kind: String,
        reason: String,
    },
    /// Reading tenant or usage data failed during a check.
    EnforcementFailed {
        tenant_id: String,
        action: String,
        error: String,
    },
}

impl fmt::Display for EntitlementAuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubscriptionAutoExpired { tenant_id, previous_status, expiry } => {
                write!(f, "Subscription auto-expired: tenant={}, previous={}, trigger={}", tenant_id, previous_status, expiry)
            }
            Self::ActionDenied { tenant_id, action, kind, reason } => {
                write!(f, "Action denied: tenant={}, action={}, kind={}, reason={}", tenant_id, action, kind, reason)
            }
            Self::EnforcementFailed { tenant_id, action, error } => {
                write!(f, "Enforcement failed: tenant={}, action={}, error={}", tenant_id, action, error)
            }
        }
    }
}

/// Trait for audit logging backends.
///
/// Implementations should not fail loudly; the check that raised the event
/// has already been decided.
#[allow(async_fn_in_trait)]
pub trait EntitlementAuditLogger: Send + Sync {
    async fn log(&self, event: EntitlementAuditEvent);
}

/// Audit logger that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpAuditLogger;

impl EntitlementAuditLogger for NoOpAuditLogger {
    async fn log(&self, _event: EntitlementAuditEvent) {}
}

/// Logs audit events with `tracing` at INFO level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditLogger;

impl EntitlementAuditLogger for TracingAuditLogger {
    async fn log(&self, event: EntitlementAuditEvent) {
        tracing::info!(
            target: "umrah::entitlements::audit",
            event_type = %event_kind(&event),
            "{}", event
        );
    }
}

/// Event kind as a string for structured logging.
pub(crate) fn event_kind(event: &EntitlementAuditEvent) -> &'static str {
    match event {
        EntitlementAuditEvent::SubscriptionAutoExpired { .. } => "subscription_auto_expired",
        EntitlementAuditEvent::ActionDenied { .. } => "action_denied",
        EntitlementAuditEvent::EnforcementFailed { .. } => "enforcement_failed",
    }
}

/// Audit logger that records events in memory.
#[cfg(any(test, feature = "test-util"))]
pub mod test {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Captures events for assertions. Clones share the same buffer.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingAuditLogger {
        events: Arc<Mutex<Vec<EntitlementAuditEvent>>>,
    }

    impl RecordingAuditLogger {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn events(&self) -> Vec<EntitlementAuditEvent> {
            self.events.lock().await.clone()
        }
    }

    impl EntitlementAuditLogger for RecordingAuditLogger {
        async fn log(&self, event: EntitlementAuditEvent) {
            self.events.lock().await.push(event);
        }
    }
}
