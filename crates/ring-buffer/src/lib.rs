//! Bounded History Buffer
//!
//! Provides a fixed-capacity FIFO buffer that keeps the most recent samples
//! of a monitoring session, evicting the oldest entry once full.

mod buffer;

pub use buffer::{HistoryBuffer, DEFAULT_CAPACITY};
