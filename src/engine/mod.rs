//! The relay engine decides which alerts become service logs and keeps the
//! delivery records that de-duplicate them.

pub mod dispatcher;
pub mod matcher;
pub mod policy;

pub use dispatcher::{
    BatchSummary, DispatchError, DispatchOutcome, DispatchSettings, Dispatcher,
};
pub use matcher::MatchError;
pub use policy::{ResendPolicy, can_send};
