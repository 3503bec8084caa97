//! cpumeter samples system-wide and per-process CPU usage at a fixed
//! interval, then writes a tab-separated report suitable for spreadsheet
//! graphing. Reading `/proc` directly keeps the meter's own CPU cost far
//! below what `top` would add to the measurement.

pub mod cli;
pub mod error;
pub mod proc;
pub mod report;
pub mod sampler;

pub use error::{Error, Result};
