//! Control instances.
//!
//! Grounded on `InputControlInstance` in `Context.h`: the fields that never change
//! across a control's life (type, storage slot, virtual-control parent) are split from
//! the ones the host can mutate at any time (recording mode, descriptor).

use crate::registry::{ControlRef, ControlTypeRef, RecordingMode};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlDescr {
	pub name: String,
}

#[derive(Debug, Clone)]
pub struct ControlInstance {
	pub control_ref: ControlRef,
	pub type_ref: ControlTypeRef,
	pub parent_of_virtual_control: Option<ControlRef>,
	/// This control's position among its parent's fan-out list, set once the parent is
	/// known (see `Context::instantiate_device`'s second pass). `Convert` uses this to
	/// tell which of the parent's several virtual children produced a forwarded sample.
	pub virtual_child_slot: Option<usize>,
	pub recording_mode: RecordingMode,
	pub index_in_storage: u32,
	pub descr: ControlDescr,
	pub pending_deletion: bool,
}

impl ControlInstance {
	pub fn new(
		control_ref: ControlRef,
		type_ref: ControlTypeRef,
		parent_of_virtual_control: Option<ControlRef>,
		recording_mode: RecordingMode,
		index_in_storage: u32,
	) -> Self {
		Self {
			control_ref,
			type_ref,
			parent_of_virtual_control,
			virtual_child_slot: None,
			recording_mode,
			index_in_storage,
			descr: ControlDescr::default(),
			pending_deletion: false,
		}
	}

	pub fn is_virtual(&self) -> bool {
		self.parent_of_virtual_control.is_some()
	}
}
