//! A set of helpers for testing

mod alert;
mod http_client;
mod notification;
mod sender;
mod store;

pub use alert::{AlertBuilder, receiver_data};
pub use http_client::create_test_http_client;
pub use notification::{FleetNotificationBuilder, NotificationBuilder};
pub use sender::RecordingSender;
pub use store::FaultyStore;
