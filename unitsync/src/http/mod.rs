//! HTTP transport to the unit platform

pub mod api;
pub mod client;
pub mod units;
