//! On-disk encodings

pub mod params;
