//! Per-control-type storage.
//!
//! Grounded on `ControlsStorage.h`. Every built-in control type owns one
//! [`PerTypeStorage`], type-erased to raw bytes sized by the database's
//! `ControlTypeDescr` so the core never needs a generic parameter per control type at
//! the storage layer; the [`crate::pipeline`] generic is where the byte slices get
//! reinterpreted back into `A::State`/`A::Sample`.
//!
//! `control_state` is the adapter's rolling-merge scratch space: one slot per
//! framebuffer, not double buffered, since only the ingress pipeline for that
//! framebuffer ever touches it. `latest_recorded_{timestamp,sample}` and
//! `all_recorded_{timestamps,samples}` are what consumers read, so both are double
//! buffered per framebuffer: ingress always writes the back side, swap exposes it as
//! the new front.

use crate::backing::{Side, SideArray};

/// One fixed-size element per (framebuffer, control slot, side).
#[derive(Default)]
pub struct FixedSizeStorage {
	element_size: usize,
	// framebuffer -> control slot -> side -> element bytes
	buffers: Vec<Vec<SideArray<Vec<u8>>>>,
}

impl FixedSizeStorage {
	pub fn new(element_size: usize, framebuffer_count: u32) -> Self {
		Self {
			element_size,
			buffers: (0..framebuffer_count).map(|_| Vec::new()).collect(),
		}
	}

	pub fn allocate_control_storage(&mut self) -> u32 {
		let index = self.buffers[0].len() as u32;
		for per_framebuffer in &mut self.buffers {
			per_framebuffer.push(SideArray::new(|_| vec![0u8; self.element_size]));
		}
		index
	}

	pub fn get(&self, framebuffer: u32, slot: u32, side: Side) -> &[u8] {
		&self.buffers[framebuffer as usize][slot as usize][side]
	}

	pub fn get_mut(&mut self, framebuffer: u32, slot: u32, side: Side) -> &mut [u8] {
		&mut self.buffers[framebuffer as usize][slot as usize][side]
	}

	pub fn set(&mut self, framebuffer: u32, slot: u32, side: Side, bytes: &[u8]) {
		self.get_mut(framebuffer, slot, side).copy_from_slice(bytes);
	}

	pub fn copy_side(&mut self, framebuffer: u32, slot: u32, from: Side, to: Side) {
		let value = self.get(framebuffer, slot, from).to_vec();
		self.set(framebuffer, slot, to, &value);
	}
}

/// A variable-length run of fixed-size elements per (framebuffer, control slot, side),
/// used for the `AllMerged`/`AllAsIs` recording modes.
#[derive(Default)]
pub struct DynamicStorage {
	element_size: usize,
	buffers: Vec<Vec<SideArray<Vec<u8>>>>,
}

impl DynamicStorage {
	pub fn new(element_size: usize, framebuffer_count: u32) -> Self {
		Self {
			element_size,
			buffers: (0..framebuffer_count).map(|_| Vec::new()).collect(),
		}
	}

	pub fn allocate_control_storage(&mut self) -> u32 {
		let index = self.buffers[0].len() as u32;
		for per_framebuffer in &mut self.buffers {
			per_framebuffer.push(SideArray::new(|_| Vec::new()));
		}
		index
	}

	pub fn push(&mut self, framebuffer: u32, slot: u32, side: Side, element: &[u8]) {
		debug_assert_eq!(element.len(), self.element_size);
		self.buffers[framebuffer as usize][slot as usize][side].extend_from_slice(element);
	}

	pub fn clear(&mut self, framebuffer: u32, slot: u32, side: Side) {
		self.buffers[framebuffer as usize][slot as usize][side].clear();
	}

	/// Replaces the most recently pushed element with `element`, or pushes it as the
	/// first element if there isn't one yet. Used by the `AllMerged` recording mode,
	/// which keeps exactly one entry per frame that gets updated as more samples merge
	/// into it.
	pub fn overwrite_last_or_push(&mut self, framebuffer: u32, slot: u32, side: Side, element: &[u8]) {
		debug_assert_eq!(element.len(), self.element_size);
		let buf = &mut self.buffers[framebuffer as usize][slot as usize][side];
		if buf.len() >= self.element_size {
			let start = buf.len() - self.element_size;
			buf[start..].copy_from_slice(element);
		} else {
			buf.extend_from_slice(element);
		}
	}

	pub fn elements(&self, framebuffer: u32, slot: u32, side: Side) -> &[u8] {
		&self.buffers[framebuffer as usize][slot as usize][side]
	}

	pub fn element_count(&self, framebuffer: u32, slot: u32, side: Side) -> usize {
		self.elements(framebuffer, slot, side).len() / self.element_size.max(1)
	}

	pub fn copy_side(&mut self, framebuffer: u32, slot: u32, from: Side, to: Side) {
		let value = self.elements(framebuffer, slot, from).to_vec();
		self.buffers[framebuffer as usize][slot as usize][to] = value;
	}
}

pub struct PerTypeStorage {
	pub state_size: usize,
	pub sample_size: usize,
	/// The adapter's working state, double buffered like everything else so
	/// `InputGetControlVisitorGenericState` can hand consumers a stable front-side
	/// pointer while ingress keeps mutating the back side.
	pub control_state: FixedSizeStorage,
	pub latest_recorded_timestamp: FixedSizeStorage,
	pub latest_recorded_sample: FixedSizeStorage,
	pub all_recorded_timestamps: DynamicStorage,
	pub all_recorded_samples: DynamicStorage,
}

const TIMESTAMP_SIZE: usize = std::mem::size_of::<crate::time::Timestamp>();

impl PerTypeStorage {
	pub fn new(state_size: usize, sample_size: usize, framebuffer_count: u32) -> Self {
		Self {
			state_size,
			sample_size,
			control_state: FixedSizeStorage::new(state_size, framebuffer_count),
			latest_recorded_timestamp: FixedSizeStorage::new(TIMESTAMP_SIZE, framebuffer_count),
			latest_recorded_sample: FixedSizeStorage::new(sample_size, framebuffer_count),
			all_recorded_timestamps: DynamicStorage::new(TIMESTAMP_SIZE, framebuffer_count),
			all_recorded_samples: DynamicStorage::new(sample_size, framebuffer_count),
		}
	}

	pub fn allocate_control_storage(&mut self) -> u32 {
		let index = self.control_state.allocate_control_storage();
		self.latest_recorded_timestamp.allocate_control_storage();
		self.latest_recorded_sample.allocate_control_storage();
		self.all_recorded_timestamps.allocate_control_storage();
		self.all_recorded_samples.allocate_control_storage();
		index
	}

	/// Copies every storage's back side onto its front side for one control slot,
	/// then resets the back side's adapter state via `frame_begin`. Called from
	/// [`crate::context::Context::swap_framebuffer`].
	pub fn swap_slot(&mut self, framebuffer: u32, slot: u32) {
		self.control_state.copy_side(framebuffer, slot, Side::Back, Side::Front);
		self.latest_recorded_timestamp.copy_side(framebuffer, slot, Side::Back, Side::Front);
		self.latest_recorded_sample.copy_side(framebuffer, slot, Side::Back, Side::Front);
		self.all_recorded_timestamps.copy_side(framebuffer, slot, Side::Back, Side::Front);
		self.all_recorded_samples.copy_side(framebuffer, slot, Side::Back, Side::Front);
		self.all_recorded_timestamps.clear(framebuffer, slot, Side::Back);
		self.all_recorded_samples.clear(framebuffer, slot, Side::Back);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fixed_size_round_trips() {
		let mut storage = FixedSizeStorage::new(4, 2);
		let slot = storage.allocate_control_storage();
		storage.set(0, slot, Side::Back, &[1, 2, 3, 4]);
		assert_eq!(storage.get(0, slot, Side::Back), &[1, 2, 3, 4]);
		assert_eq!(storage.get(0, slot, Side::Front), &[0, 0, 0, 0]);
		storage.copy_side(0, slot, Side::Back, Side::Front);
		assert_eq!(storage.get(0, slot, Side::Front), &[1, 2, 3, 4]);
	}

	#[test]
	fn dynamic_storage_accumulates_and_clears() {
		let mut storage = DynamicStorage::new(4, 1);
		let slot = storage.allocate_control_storage();
		storage.push(0, slot, Side::Back, &[1, 1, 1, 1]);
		storage.push(0, slot, Side::Back, &[2, 2, 2, 2]);
		assert_eq!(storage.element_count(0, slot, Side::Back), 2);
		storage.clear(0, slot, Side::Back);
		assert_eq!(storage.element_count(0, slot, Side::Back), 0);
	}
}
