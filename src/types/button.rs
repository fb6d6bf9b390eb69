//! Grounded on `Control.Button.cpp`/`.h`: a digital button (sample `u8 ∈ {0,1}`) with
//! edge-triggered state, and the `Control.AxisOneWay` sibling it fans out to so bindings
//! that want the raw analog value can read the same button as an axis.

use crate::pipeline::{ControlTypeAdapter, FanOut, FanOutTiming};
use crate::time::Timestamp;
use bytemuck::{Pod, Zeroable};
use smallvec::smallvec;

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct ButtonState {
	pub was_pressed_this_io_frame: u8,
	pub was_released_this_io_frame: u8,
}

pub struct Button;

impl ControlTypeAdapter for Button {
	type State = ButtonState;
	type Sample = u8;

	const FAN_OUT_TIMING: FanOutTiming = FanOutTiming::PostMerge;

	/// Edge flags are per-frame; the pressed/released level itself lives in
	/// `latest_sample` and is intentionally left alone here, so a button still reads
	/// "pressed" on a frame with no new samples.
	fn frame_begin(state: &mut ButtonState, _latest_ts: &mut Timestamp, _latest_sample: &mut u8) {
		*state = ButtonState::default();
	}

	/// Identity-coalescing: two adjacent samples of the same level are the same event.
	fn forward_merge(cur: &mut u8, next: u8) -> bool {
		*cur == next
	}

	fn update_control_state(state: &mut ButtonState, prev: u8, next: u8) {
		if prev == 0 && next == 1 {
			state.was_pressed_this_io_frame = 1;
		}
		if prev == 1 && next == 0 {
			state.was_released_this_io_frame = 1;
		}
	}

	/// Reverse direction: this button is the virtual child of an axis-one-way, and a
	/// push landed directly on the axis instead, thresholded at `0.5`.
	fn convert(_slot: usize, raw: &[u8]) -> u8 {
		let value: f32 = *bytemuck::from_bytes(raw);
		if value >= 0.5 {
			1
		} else {
			0
		}
	}

	/// Single slot: the sibling axis-one-way, fed the thresholded analog equivalent.
	fn fan_out(value: u8) -> FanOut {
		let analog: f32 = if value == 1 { 1.0 } else { 0.0 };
		smallvec![crate::pipeline::RawSample::from_slice(bytemuck::bytes_of(&analog))]
	}
}

pub fn is_pressed(value: u8) -> bool {
	value == 1
}
