//! Delivery conditions tracked for every notification target.
//!
//! A target's history is reduced to three timestamped booleans: whether the
//! alert is firing, whether it has resolved, and whether a service log was
//! sent. The set is keyed by [`ConditionType`] so a type can never appear
//! twice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kinds of condition a notification record keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConditionType {
    /// The alert was firing when the record was last updated.
    AlertFiring,
    /// The alert was resolved when the record was last updated.
    AlertResolved,
    /// A service log was delivered for the alert.
    ServiceLogSent,
}

impl ConditionType {
    /// Every condition type, in storage order.
    pub const ALL: [ConditionType; 3] =
        [ConditionType::AlertFiring, ConditionType::AlertResolved, ConditionType::ServiceLogSent];

    fn index(self) -> usize {
        match self {
            ConditionType::AlertFiring => 0,
            ConditionType::AlertResolved => 1,
            ConditionType::ServiceLogSent => 2,
        }
    }
}

/// A single timestamped condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Which condition this is.
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    /// Whether the condition currently holds.
    pub status: bool,
    /// When the condition was last set.
    pub last_transition_time: DateTime<Utc>,
}

/// The condition ledger of one notification target.
///
/// Serialized as a list of [`Condition`]s. When a stored list carries the same
/// type more than once, the last entry wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Condition>", into = "Vec<Condition>")]
pub struct Conditions {
    slots: [Option<Condition>; 3],
}

impl Conditions {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the condition of the given type, if it was ever set.
    pub fn get(&self, condition_type: ConditionType) -> Option<&Condition> {
        self.slots[condition_type.index()].as_ref()
    }

    /// Sets the condition of the given type, replacing any previous value.
    pub fn set(&mut self, condition_type: ConditionType, status: bool, at: DateTime<Utc>) {
        self.slots[condition_type.index()] =
            Some(Condition { condition_type, status, last_transition_time: at });
    }

    /// Returns `true` when the condition exists and its status is `true`.
    pub fn is_true(&self, condition_type: ConditionType) -> bool {
        self.get(condition_type).is_some_and(|c| c.status)
    }

    /// Iterates over the conditions that have been set.
    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.slots.iter().flatten()
    }

    /// Returns `true` if no condition has been set yet.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

impl From<Vec<Condition>> for Conditions {
    fn from(list: Vec<Condition>) -> Self {
        let mut conditions = Conditions::new();
        for condition in list {
            let index = condition.condition_type.index();
            conditions.slots[index] = Some(condition);
        }
        conditions
    }
}

impl From<Conditions> for Vec<Condition> {
    fn from(conditions: Conditions) -> Self {
        conditions.slots.into_iter().flatten().collect()
    }
}
