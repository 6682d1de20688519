#![warn(missing_docs)]
//! A relay receiving Alertmanager webhooks and turning them into OpenShift
//! Cluster Manager service logs, with a per-template resend cool-down for
//! single clusters and for hosted clusters of a fleet.

pub mod cmd;
pub mod config;
pub mod context;
pub mod engine;
pub mod http_client;
pub mod http_server;
pub mod initialization;
pub mod models;
pub mod notification;
pub mod persistence;
pub mod supervisor;
pub mod test_helpers;
