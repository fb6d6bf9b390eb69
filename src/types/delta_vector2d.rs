//! Grounded on `Control.DeltaVector2D.cpp`/`.h`: a relative 2D delta, e.g. mouse
//! movement between polls. Accumulates additively across the frame and resets both
//! `latest_sample` and `latest_ts` at frame-begin.
//!
//! Fans out, pre-merge, to two virtual [`crate::types::DeltaAxisTwoWay`] children
//! (`x`, `y`) and four thresholded direction buttons, so every raw sample — not just the
//! frame's settled total — drives their accumulation and edges.

use crate::pipeline::{ControlTypeAdapter, FanOut, FanOutTiming};
use crate::time::Timestamp;
use glam::Vec2;
use smallvec::smallvec;

pub struct DeltaVector2D;

impl ControlTypeAdapter for DeltaVector2D {
	type State = ();
	type Sample = Vec2;

	const FAN_OUT_TIMING: FanOutTiming = FanOutTiming::PreMerge;

	fn frame_begin(_state: &mut (), latest_ts: &mut Timestamp, latest_sample: &mut Vec2) {
		*latest_sample = Vec2::ZERO;
		*latest_ts = crate::time::current_time();
	}

	fn forward_merge(cur: &mut Vec2, next: Vec2) -> bool {
		*cur += next;
		true
	}

	/// Slots: `0` horizontal delta-axis-two-way (`x`), `1` vertical (`y`), `2` up
	/// button, `3` down button, `4` left button, `5` right button. Up/down lead
	/// left/right so a host that only cares about vertical scroll buttons can wire up
	/// the first four slots and leave the rest unregistered.
	fn convert(slot: usize, raw: &[u8]) -> Vec2 {
		match slot {
			0 => Vec2::new(*bytemuck::from_bytes::<f32>(raw), 0.0),
			1 => Vec2::new(0.0, *bytemuck::from_bytes::<f32>(raw)),
			2 if *bytemuck::from_bytes::<u8>(raw) == 1 => Vec2::new(0.0, 1.0),
			3 if *bytemuck::from_bytes::<u8>(raw) == 1 => Vec2::new(0.0, -1.0),
			4 if *bytemuck::from_bytes::<u8>(raw) == 1 => Vec2::new(-1.0, 0.0),
			5 if *bytemuck::from_bytes::<u8>(raw) == 1 => Vec2::new(1.0, 0.0),
			_ => Vec2::ZERO,
		}
	}

	fn fan_out(value: Vec2) -> FanOut {
		let up: u8 = if value.y >= 0.5 { 1 } else { 0 };
		let down: u8 = if value.y <= -0.5 { 1 } else { 0 };
		let left: u8 = if value.x <= -0.5 { 1 } else { 0 };
		let right: u8 = if value.x >= 0.5 { 1 } else { 0 };
		smallvec![
			crate::pipeline::RawSample::from_slice(bytemuck::bytes_of(&value.x)),
			crate::pipeline::RawSample::from_slice(bytemuck::bytes_of(&value.y)),
			crate::pipeline::RawSample::from_slice(bytemuck::bytes_of(&up)),
			crate::pipeline::RawSample::from_slice(bytemuck::bytes_of(&down)),
			crate::pipeline::RawSample::from_slice(bytemuck::bytes_of(&left)),
			crate::pipeline::RawSample::from_slice(bytemuck::bytes_of(&right)),
		]
	}
}
