//! Response-time commitment clock.
//!
//! `evaluate` is pure: the badge is derived on every read from
//! `status_entered_at`, `snooze_until`, and the policy table, and is never
//! cached on the lead.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::lead::{Lead, LeadStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlaState {
    Ok,
    Warning,
    Breached,
    #[serde(rename = "n/a")]
    NotApplicable,
}

/// Maximum dwell in a status before breach, plus the warning threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlaPolicy {
    pub max: Duration,
    pub warning_after: Duration,
}

impl SlaPolicy {
    pub fn from_minutes(max_minutes: i64, warning_minutes: i64) -> Self {
        Self {
            max: Duration::minutes(max_minutes),
            warning_after: Duration::minutes(warning_minutes),
        }
    }
}

/// Policy lookup by status. Statuses without an entry are exempt (`n/a`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlaPolicySet {
    policies: BTreeMap<LeadStatus, SlaPolicy>,
}

impl SlaPolicySet {
    pub fn empty() -> Self {
        Self { policies: BTreeMap::new() }
    }

    pub fn with_policy(mut self, status: LeadStatus, policy: SlaPolicy) -> Self {
        self.policies.insert(status, policy);
        self
    }

    pub fn get(&self, status: LeadStatus) -> Option<&SlaPolicy> {
        self.policies.get(&status)
    }
}

impl Default for SlaPolicySet {
    fn default() -> Self {
        Self::empty()
            .with_policy(LeadStatus::New, SlaPolicy::from_minutes(120, 90))
            .with_policy(LeadStatus::NoAnswer, SlaPolicy::from_minutes(1_440, 1_080))
            .with_policy(LeadStatus::Followup, SlaPolicy::from_minutes(2_880, 2_160))
            .with_policy(LeadStatus::NoAnswerX5, SlaPolicy::from_minutes(480, 360))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlaBadge {
    pub state: SlaState,
    pub remaining: Option<Duration>,
}

impl SlaBadge {
    fn not_applicable() -> Self {
        Self { state: SlaState::NotApplicable, remaining: None }
    }
}

/// Compute the SLA badge for `lead` at `now`.
///
/// An active snooze forces `Ok` and projects the remaining budget past the
/// snooze end; a lapsed snooze re-anchors the clock at the snooze end so the
/// paused interval never counts as dwell time.
pub fn evaluate(lead: &Lead, policies: &SlaPolicySet, now: DateTime<Utc>) -> SlaBadge {
    if lead.status.is_terminal() {
        return SlaBadge::not_applicable();
    }
    let Some(policy) = policies.get(lead.status) else {
        return SlaBadge::not_applicable();
    };

    if let Some(snooze_until) = lead.snooze_until {
        if snooze_until > now {
            return SlaBadge { state: SlaState::Ok, remaining: Some(policy.max + (snooze_until - now)) };
        }
    }

    let anchor = match lead.snooze_until {
        Some(snooze_until) if snooze_until > lead.status_entered_at => snooze_until,
        _ => lead.status_entered_at,
    };

    let elapsed = now - anchor;
    let remaining = policy.max - elapsed;

    let state = if remaining <= Duration::zero() {
        SlaState::Breached
    } else if elapsed >= policy.warning_after {
        SlaState::Warning
    } else {
        SlaState::Ok
    };

    SlaBadge { state, remaining: Some(remaining) }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::domain::lead::{Lead, LeadStatus, NewLead};
    use crate::sla::{evaluate, SlaPolicy, SlaPolicySet, SlaState};

    fn policies() -> SlaPolicySet {
        SlaPolicySet::empty()
            .with_policy(LeadStatus::Followup, SlaPolicy::from_minutes(8 * 60, 6 * 60))
            .with_policy(LeadStatus::New, SlaPolicy::from_minutes(120, 90))
    }

    fn lead_in(status: LeadStatus, entered_hours_ago: i64) -> Lead {
        let now = Utc::now();
        let mut lead =
            Lead::create("sup-1", NewLead::default(), None, now - Duration::hours(entered_hours_ago))
                .expect("create lead");
        lead.status = status;
        lead
    }

    #[test]
    fn followup_past_its_budget_is_breached() {
        let lead = lead_in(LeadStatus::Followup, 10);
        let badge = evaluate(&lead, &policies(), Utc::now());

        assert_eq!(badge.state, SlaState::Breached);
        assert!(badge.remaining.expect("remaining") <= Duration::zero());
    }

    #[test]
    fn active_snooze_forces_ok_regardless_of_dwell() {
        let now = Utc::now();
        let mut lead = lead_in(LeadStatus::Followup, 10);
        lead.snooze_until = Some(now + Duration::hours(2));

        let badge = evaluate(&lead, &policies(), now);
        assert_eq!(badge.state, SlaState::Ok);
        // Budget resumes in full once the snooze lapses.
        assert_eq!(badge.remaining, Some(Duration::hours(10)));
    }

    #[test]
    fn lapsed_snooze_reanchors_the_clock() {
        let now = Utc::now();
        let mut lead = lead_in(LeadStatus::Followup, 20);
        lead.snooze_until = Some(now - Duration::hours(1));

        let badge = evaluate(&lead, &policies(), now);
        assert_eq!(badge.state, SlaState::Ok);
        assert_eq!(badge.remaining, Some(Duration::hours(7)));
    }

    #[test]
    fn warning_threshold_fires_before_breach() {
        let lead = lead_in(LeadStatus::Followup, 7);
        let badge = evaluate(&lead, &policies(), Utc::now());

        assert_eq!(badge.state, SlaState::Warning);
        assert!(badge.remaining.expect("remaining") > Duration::zero());
    }

    #[test]
    fn terminal_and_unconfigured_statuses_are_exempt() {
        let done = lead_in(LeadStatus::ProjectCompleted, 100);
        assert_eq!(evaluate(&done, &policies(), Utc::now()).state, SlaState::NotApplicable);

        let in_progress = lead_in(LeadStatus::ProjectInProgress, 100);
        let badge = evaluate(&in_progress, &policies(), Utc::now());
        assert_eq!(badge.state, SlaState::NotApplicable);
        assert_eq!(badge.remaining, None);
    }

    #[test]
    fn evaluation_is_pure() {
        let lead = lead_in(LeadStatus::Followup, 7);
        let snapshot = lead.clone();
        let now = Utc::now();

        let first = evaluate(&lead, &policies(), now);
        let second = evaluate(&lead, &policies(), now);

        assert_eq!(first, second);
        assert_eq!(lead, snapshot);
    }

    #[test]
    fn default_policy_set_covers_the_response_statuses() {
        let set = SlaPolicySet::default();
        for status in
            [LeadStatus::New, LeadStatus::NoAnswer, LeadStatus::Followup, LeadStatus::NoAnswerX5]
        {
            assert!(set.get(status).is_some(), "{status} should carry a default policy");
        }
        assert!(set.get(LeadStatus::ProjectInProgress).is_none());
    }
}
