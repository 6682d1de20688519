//! The resend decision.
//!
//! Whether a service log is due depends only on the ledger of the target, the
//! alert state, the configured cool-down and whether the template has any
//! text to send on resolve. The decision is a pure function of those inputs
//! and the current time, which is passed in.

use chrono::{DateTime, Duration, Utc};

use crate::models::{ConditionType, Conditions};

/// Inputs of a resend decision that come from the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResendPolicy {
    /// Minimum time between two firing service logs.
    pub resend_wait: Duration,
    /// Whether the template defines text to send when the alert resolves.
    pub resolved_configured: bool,
}

impl ResendPolicy {
    /// Creates a policy.
    pub fn new(resend_wait: Duration, resolved_configured: bool) -> Self {
        Self { resend_wait, resolved_configured }
    }

    /// Decides whether a service log should be sent now.
    pub fn can_send(&self, conditions: &Conditions, is_firing: bool, now: DateTime<Utc>) -> bool {
        can_send(conditions, is_firing, self.resend_wait, self.resolved_configured, now)
    }
}

/// Decides whether a service log should be sent for a target.
///
/// * A firing alert is sent when nothing was sent yet, or when the last send
///   is at least `resend_wait` old.
/// * A resolved alert is sent only when resolved text is configured and the
///   ledger shows the alert as firing, so a resolve is reported once per
///   firing episode.
pub fn can_send(
    conditions: &Conditions,
    is_firing: bool,
    resend_wait: Duration,
    resolved_configured: bool,
    now: DateTime<Utc>,
) -> bool {
    if is_firing {
        return match conditions.get(ConditionType::ServiceLogSent) {
            None => true,
            Some(sent) => now - sent.last_transition_time >= resend_wait,
        };
    }

    resolved_configured && conditions.is_true(ConditionType::AlertFiring)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger(firing: bool, sent_ago: Option<Duration>, now: DateTime<Utc>) -> Conditions {
        let mut conditions = Conditions::new();
        conditions.set(ConditionType::AlertFiring, firing, now);
        conditions.set(ConditionType::AlertResolved, !firing, now);
        if let Some(ago) = sent_ago {
            conditions.set(ConditionType::ServiceLogSent, true, now - ago);
        }
        conditions
    }

    #[test]
    fn test_first_firing_send_is_allowed() {
        let now = Utc::now();
        assert!(can_send(&Conditions::new(), true, Duration::hours(24), false, now));
    }

    #[test]
    fn test_firing_inside_cool_down_is_suppressed() {
        let now = Utc::now();
        let conditions = ledger(true, Some(Duration::hours(1)), now);
        assert!(!can_send(&conditions, true, Duration::hours(24), true, now));
    }

    #[test]
    fn test_firing_after_cool_down_is_allowed() {
        let now = Utc::now();
        let conditions = ledger(true, Some(Duration::hours(25)), now);
        assert!(can_send(&conditions, true, Duration::hours(24), false, now));
    }

    #[test]
    fn test_cool_down_boundary_is_inclusive() {
        let now = Utc::now();
        let conditions = ledger(true, Some(Duration::hours(24)), now);
        assert!(can_send(&conditions, true, Duration::hours(24), false, now));
    }

    #[test]
    fn test_zero_wait_always_resends() {
        let now = Utc::now();
        let conditions = ledger(true, Some(Duration::zero()), now);
        assert!(can_send(&conditions, true, Duration::zero(), false, now));
    }

    #[test]
    fn test_resolve_without_resolved_text_is_never_sent() {
        let now = Utc::now();
        for sent_ago in [None, Some(Duration::hours(1)), Some(Duration::days(30))] {
            let conditions = ledger(true, sent_ago, now);
            assert!(!can_send(&conditions, false, Duration::zero(), false, now));
        }
    }

    #[test]
    fn test_resolve_after_firing_is_sent_regardless_of_cool_down() {
        let now = Utc::now();
        let conditions = ledger(true, Some(Duration::minutes(5)), now);
        assert!(can_send(&conditions, false, Duration::hours(24), true, now));
    }

    #[test]
    fn test_resolve_without_prior_firing_is_suppressed() {
        let now = Utc::now();
        assert!(!can_send(&Conditions::new(), false, Duration::zero(), true, now));

        let already_resolved = ledger(false, Some(Duration::hours(2)), now);
        assert!(!can_send(&already_resolved, false, Duration::zero(), true, now));
    }

    #[test]
    fn test_policy_struct_delegates() {
        let now = Utc::now();
        let policy = ResendPolicy::new(Duration::hours(2), true);
        assert!(!policy.can_send(&ledger(true, Some(Duration::hours(1)), now), true, now));
        assert!(policy.can_send(&ledger(true, Some(Duration::hours(3)), now), true, now));
    }
}
