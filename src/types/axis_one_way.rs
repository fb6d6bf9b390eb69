//! Grounded on `Control.AxisOneWay.cpp`/`.h`: a one-directional analog axis in `[0, 1]`,
//! e.g. an analog trigger, with a `Control.Button` sibling it can fan out to or be
//! forwarded up from.

use crate::pipeline::{ControlTypeAdapter, FanOut, FanOutTiming};
use smallvec::smallvec;

/// Samples within this distance of each other are treated as unchanged, matching the
/// original's float-compare epsilon for axis controls.
pub const PRECISION: f32 = 0.0001;

pub struct AxisOneWay;

impl ControlTypeAdapter for AxisOneWay {
	type State = ();
	type Sample = f32;

	const FAN_OUT_TIMING: FanOutTiming = FanOutTiming::PostMerge;

	/// Coalesces samples within [`PRECISION`] of each other into one.
	fn forward_merge(cur: &mut f32, next: f32) -> bool {
		(*cur - next).abs() < PRECISION
	}

	/// Reverse direction: this axis is the virtual parent of a button that was pushed
	/// directly; asymmetric with `Button::convert`'s `0.5` threshold (see `§4.4`'s note
	/// on button↔axis round trips).
	fn convert(_slot: usize, raw: &[u8]) -> f32 {
		let pressed: u8 = *bytemuck::from_bytes(raw);
		if pressed == 1 {
			1.0
		} else {
			0.0
		}
	}

	/// Single slot: the sibling button, thresholded at `0.5`.
	fn fan_out(value: f32) -> FanOut {
		let pressed: u8 = if value >= 0.5 { 1 } else { 0 };
		smallvec![crate::pipeline::RawSample::from_slice(bytemuck::bytes_of(&pressed))]
	}
}
