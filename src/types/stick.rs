//! Grounded on `Control.Stick.cpp`/`.h`: a 2D analog stick position, magnitude clamped
//! to the unit circle by the producer. The merge coalesces samples within squared
//! distance [`PRECISION_SQUARED`] of each other, keeping the existing one — cheaper than
//! a square root and order-insensitive for the comparison.
//!
//! Fans out, post-merge, to two virtual [`crate::types::AxisTwoWay`] children
//! (`horizontal`, `vertical`); those in turn fan out to the four derived one-way axes
//! and buttons, matching `§4.4`'s "eight derived controls" description of the full tree.

use crate::pipeline::{ControlTypeAdapter, FanOut, FanOutTiming};
use glam::Vec2;
use smallvec::smallvec;

pub const PRECISION_SQUARED: f32 = 0.0001 * 0.0001;

pub struct Stick;

impl ControlTypeAdapter for Stick {
	type State = ();
	type Sample = Vec2;

	const FAN_OUT_TIMING: FanOutTiming = FanOutTiming::PostMerge;

	fn forward_merge(cur: &mut Vec2, next: Vec2) -> bool {
		(*cur - next).length_squared() < PRECISION_SQUARED
	}

	/// Slots: `0` horizontal axis-two-way (`x`), `1` vertical (`y`).
	fn convert(slot: usize, raw: &[u8]) -> Vec2 {
		match slot {
			0 => Vec2::new(*bytemuck::from_bytes::<f32>(raw), 0.0),
			1 => Vec2::new(0.0, *bytemuck::from_bytes::<f32>(raw)),
			_ => Vec2::ZERO,
		}
	}

	fn fan_out(value: Vec2) -> FanOut {
		smallvec![
			crate::pipeline::RawSample::from_slice(bytemuck::bytes_of(&value.x)),
			crate::pipeline::RawSample::from_slice(bytemuck::bytes_of(&value.y)),
		]
	}
}
