//! Grounded on `Control.DeltaAxisTwoWay.cpp`/`.h`: a relative one-dimensional delta,
//! e.g. a mouse wheel notch count. Samples accumulate additively across the frame and
//! both `latest_sample` and `latest_ts` reset at frame-begin, matching
//! `ControlTypeFrameBegin`'s delta re-initialisation.

use crate::pipeline::{ControlTypeAdapter, FanOut, FanOutTiming};
use crate::time::Timestamp;
use smallvec::smallvec;

pub struct DeltaAxisTwoWay;

impl ControlTypeAdapter for DeltaAxisTwoWay {
	type State = ();
	type Sample = f32;

	const FAN_OUT_TIMING: FanOutTiming = FanOutTiming::PreMerge;

	fn frame_begin(_state: &mut (), latest_ts: &mut Timestamp, latest_sample: &mut f32) {
		*latest_sample = 0.0;
		*latest_ts = crate::time::current_time();
	}

	/// Additive accumulator: always folds, never keeps `next` distinct.
	fn forward_merge(cur: &mut f32, next: f32) -> bool {
		*cur += next;
		true
	}

	/// Slots: `0` positive button, `1` negative button, thresholded against this raw
	/// (unmerged) sample rather than the running accumulation.
	fn convert(slot: usize, raw: &[u8]) -> f32 {
		let pressed = *bytemuck::from_bytes::<u8>(raw) == 1;
		match (slot, pressed) {
			(0, true) => 1.0,
			(1, true) => -1.0,
			_ => 0.0,
		}
	}

	fn fan_out(value: f32) -> FanOut {
		let positive_button: u8 = if value >= 0.5 { 1 } else { 0 };
		let negative_button: u8 = if value <= -0.5 { 1 } else { 0 };
		smallvec![
			crate::pipeline::RawSample::from_slice(bytemuck::bytes_of(&positive_button)),
			crate::pipeline::RawSample::from_slice(bytemuck::bytes_of(&negative_button)),
		]
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn accumulates_additively() {
		let mut cur = 1.0f32;
		assert!(DeltaAxisTwoWay::forward_merge(&mut cur, -0.5));
		assert!(DeltaAxisTwoWay::forward_merge(&mut cur, 2.0));
		assert_eq!(cur, 2.5);
	}

	#[test]
	fn fans_out_raw_sample_thresholded() {
		let fan_out = DeltaAxisTwoWay::fan_out(0.7);
		let positive: u8 = *bytemuck::from_bytes(&fan_out[0]);
		let negative: u8 = *bytemuck::from_bytes(&fan_out[1]);
		assert_eq!(positive, 1);
		assert_eq!(negative, 0);
	}
}
