//! The device database shim.
//!
//! Grounded on `DeviceDatabase.h`/`.cpp`: the core never hardcodes which control types
//! or device traits exist. Instead a host-supplied [`Database`] implementation answers
//! "how big is this control type's state/sample", "what control type and default
//! recording mode does this usage map to" and "what traits does this device type
//! implement", and hands back a type-erased [`crate::pipeline::ErasedAdapter`] the core
//! dispatches ingress and frame-begin through. This is what lets `Context` stay free of
//! any per-control-type branching.

use crate::pal::LogLevel;
use crate::pipeline::ErasedAdapter;
use crate::registry::{ControlTypeRef, ControlUsageRef, DeviceTraitRef, DeviceTypeRef, RecordingMode};
use smallvec::SmallVec;
use std::sync::Arc;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ControlTypeDescr {
	pub state_size: usize,
	pub sample_size: usize,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ControlUsageDescr {
	pub control_type_ref: ControlTypeRef,
	pub parent_of_virtual_control: Option<ControlUsageRef>,
	pub default_recording_mode: RecordingMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceTraitDescr {
	pub trait_ref: DeviceTraitRef,
}

/// Everything the core needs from the host about device and control shapes. Set once
/// via [`crate::set_database_callbacks`], mirroring `InputSetDatabaseCallbacks`.
pub trait Database: Send + Sync {
	fn control_type_descr(&self, control_type_ref: ControlTypeRef) -> Option<ControlTypeDescr>;

	fn control_usage_descr(&self, usage_ref: ControlUsageRef) -> Option<ControlUsageDescr>;

	fn device_traits(&self, device_type: DeviceTypeRef) -> SmallVec<[DeviceTraitDescr; 4]>;

	fn control_usages_for_trait(&self, trait_ref: DeviceTraitRef) -> SmallVec<[ControlUsageRef; 8]>;

	/// Type-erased ingress/frame-begin operations for a built-in control type.
	fn adapter(&self, control_type_ref: ControlTypeRef) -> Option<Arc<dyn ErasedAdapter>>;
}

pub(crate) struct NullDatabase;

impl Database for NullDatabase {
	fn control_type_descr(&self, _: ControlTypeRef) -> Option<ControlTypeDescr> {
		crate::pal::log(LogLevel::Error, format_args!("no database callbacks set"));
		None
	}

	fn control_usage_descr(&self, _: ControlUsageRef) -> Option<ControlUsageDescr> {
		None
	}

	fn device_traits(&self, _: DeviceTypeRef) -> SmallVec<[DeviceTraitDescr; 4]> {
		SmallVec::new()
	}

	fn control_usages_for_trait(&self, _: DeviceTraitRef) -> SmallVec<[ControlUsageRef; 8]> {
		SmallVec::new()
	}

	fn adapter(&self, _: ControlTypeRef) -> Option<Arc<dyn ErasedAdapter>> {
		None
	}
}
