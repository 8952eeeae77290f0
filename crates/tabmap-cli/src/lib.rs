//! Library side of the `tabmap` binary.

pub mod config;
pub mod display;
pub mod logging;
pub mod review;
