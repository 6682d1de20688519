//! The shared shape of single-cluster and fleet notification records.
//!
//! Both record documents boil down to a collection of ledgers, one per
//! delivery target. [`LedgerDocument`] lets the dispatcher locate or create
//! that ledger without knowing which document it is working on.

use std::fmt;

use chrono::{DateTime, Duration, Utc};

use super::{
    condition::{ConditionType, Conditions},
    document::Document,
};

/// The delivery history of one notification target.
pub trait Ledger {
    /// Current conditions of the target.
    fn conditions(&self) -> &Conditions;

    /// Mutable access to the conditions of the target.
    fn conditions_mut(&mut self) -> &mut Conditions;

    /// Number of service logs delivered to the target.
    fn sent_count(&self) -> u64;

    /// Bumps the delivered service log counter.
    fn increment_sent_count(&mut self);

    /// Records a confirmed delivery at `now`.
    fn record_send(&mut self, is_firing: bool, now: DateTime<Utc>) {
        let conditions = self.conditions_mut();
        conditions.set(ConditionType::AlertFiring, is_firing, now);
        conditions.set(ConditionType::AlertResolved, !is_firing, now);
        conditions.set(ConditionType::ServiceLogSent, true, now);
        self.increment_sent_count();
    }
}

/// A stored document holding the ledgers of many targets.
pub trait LedgerDocument: Document {
    /// Addresses one ledger inside the document.
    type Slot: fmt::Debug + Send + Sync;

    /// The ledger type kept per slot.
    type Entry: Ledger;

    /// Returns the ledger of a slot, if it exists.
    fn entry(&self, slot: &Self::Slot) -> Option<&Self::Entry>;

    /// Returns the ledger of a slot, creating an empty one when missing.
    fn entry_or_insert(&mut self, slot: &Self::Slot) -> &mut Self::Entry;

    /// Resend wait recorded in the document for the slot, when the document
    /// keeps its own copy instead of consulting the template.
    fn stored_resend_wait(&self, _slot: &Self::Slot) -> Option<Duration> {
        None
    }
}
