//! Port traits: the boundaries behind which all I/O and indicator math live.

pub mod config_port;
pub mod data_port;
pub mod factor_port;
