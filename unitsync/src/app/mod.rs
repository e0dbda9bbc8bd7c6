//! Application wiring

pub mod options;
pub mod present;
pub mod run;
pub mod state;
