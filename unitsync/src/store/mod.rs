//! Local unit store

pub mod units;
