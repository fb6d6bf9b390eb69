//! Grounded on `Control.AxisTwoWay.cpp`/`.h`: a signed analog axis in `[-1, 1]`, e.g. a
//! shoulder stick axis, fanning out to positive/negative one-way axes and buttons.

use crate::pipeline::{ControlTypeAdapter, FanOut, FanOutTiming};
use smallvec::smallvec;

pub const PRECISION: f32 = 0.0001;

pub struct AxisTwoWay;

impl ControlTypeAdapter for AxisTwoWay {
	type State = ();
	type Sample = f32;

	const FAN_OUT_TIMING: FanOutTiming = FanOutTiming::PostMerge;

	fn forward_merge(cur: &mut f32, next: f32) -> bool {
		(*cur - next).abs() < PRECISION
	}

	/// Slots: `0` positive axis-one-way, `1` negative axis-one-way, `2` positive
	/// button, `3` negative button. A push forwarded up from any of them becomes the
	/// signed value that child represents (see `§4.3`'s button example: a positive
	/// child's press becomes `+1.0`).
	fn convert(slot: usize, raw: &[u8]) -> f32 {
		match slot {
			0 => *bytemuck::from_bytes::<f32>(raw),
			1 => -*bytemuck::from_bytes::<f32>(raw),
			2 => {
				if *bytemuck::from_bytes::<u8>(raw) == 1 {
					1.0
				} else {
					0.0
				}
			}
			3 => {
				if *bytemuck::from_bytes::<u8>(raw) == 1 {
					-1.0
				} else {
					0.0
				}
			}
			_ => 0.0,
		}
	}

	fn fan_out(value: f32) -> FanOut {
		let positive = value.max(0.0);
		let negative = (-value).max(0.0);
		let positive_button: u8 = if value >= 0.5 { 1 } else { 0 };
		let negative_button: u8 = if value <= -0.5 { 1 } else { 0 };
		smallvec![
			crate::pipeline::RawSample::from_slice(bytemuck::bytes_of(&positive)),
			crate::pipeline::RawSample::from_slice(bytemuck::bytes_of(&negative)),
			crate::pipeline::RawSample::from_slice(bytemuck::bytes_of(&positive_button)),
			crate::pipeline::RawSample::from_slice(bytemuck::bytes_of(&negative_button)),
		]
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn merges_within_precision() {
		let mut cur = -0.2f32;
		assert!(AxisTwoWay::forward_merge(&mut cur, -0.20005));
		assert!(!AxisTwoWay::forward_merge(&mut cur, 0.6));
	}

	#[test]
	fn fans_out_signed_axes_and_buttons() {
		let fan_out = AxisTwoWay::fan_out(0.7);
		let positive: f32 = *bytemuck::from_bytes(&fan_out[0]);
		let negative: f32 = *bytemuck::from_bytes(&fan_out[1]);
		let positive_button: u8 = *bytemuck::from_bytes(&fan_out[2]);
		let negative_button: u8 = *bytemuck::from_bytes(&fan_out[3]);
		assert_eq!(positive, 0.7);
		assert_eq!(negative, 0.0);
		assert_eq!(positive_button, 1);
		assert_eq!(negative_button, 0);
	}

	#[test]
	fn converts_children_to_signed_value() {
		assert_eq!(AxisTwoWay::convert(0, bytemuck::bytes_of(&0.4f32)), 0.4);
		assert_eq!(AxisTwoWay::convert(1, bytemuck::bytes_of(&0.4f32)), -0.4);
		assert_eq!(AxisTwoWay::convert(2, &[1u8]), 1.0);
		assert_eq!(AxisTwoWay::convert(3, &[1u8]), -1.0);
	}
}
