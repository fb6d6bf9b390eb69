//! Timestamps.
//!
//! A timestamp is a timeline-relative tick count. `current_time` returns the process
//! monotonic clock on timeline 0 rather than inventing a multi-timeline registry with
//! no caller that needs one.

use bytemuck::{Pod, Zeroable};
use std::time::Instant;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Pod, Zeroable)]
pub struct Timestamp {
	pub timestamp: u64,
	pub timeline: u16,
	_pad: u16,
	_pad2: u32,
}

impl Timestamp {
	pub const ZERO: Timestamp = Timestamp {
		timestamp: 0,
		timeline: 0,
		_pad: 0,
		_pad2: 0,
	};

	pub fn new(timestamp: u64, timeline: u16) -> Self {
		Self {
			timestamp,
			timeline,
			_pad: 0,
			_pad2: 0,
		}
	}
}

impl Default for Timestamp {
	fn default() -> Self {
		Self::ZERO
	}
}

static EPOCH: once_cell::sync::Lazy<Instant> = once_cell::sync::Lazy::new(Instant::now);

/// Nanoseconds since the first call into this crate, on timeline 0.
pub fn current_time() -> Timestamp {
	Timestamp::new(EPOCH.elapsed().as_nanos() as u64, 0)
}
