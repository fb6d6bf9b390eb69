//! Opaque handles and shared descriptor types.
//!
//! Grounded on `DeviceRef.h`, `FramebufferRef.h` and the `InputControlRef`/
//! `InputControlTypeRef`/`InputControlUsageRef` typedefs scattered across `Controls.h`
//! and `Devices.h`: every one of these is a transparent integer handle in the original
//! runtime, not a pointer, so instances can be freely copied, hashed and stored in maps
//! without lifetime concerns.

pub mod control;
pub mod device;

pub use control::{ControlDescr, ControlInstance};
pub use device::{DeviceDescr, DeviceInstance};

use crate::guid::Guid;

macro_rules! transparent_ref {
	($name:ident) => {
		#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
		pub struct $name(pub u32);

		impl $name {
			pub const INVALID: $name = $name(u32::MAX);

			pub fn is_valid(self) -> bool {
				self != Self::INVALID
			}
		}

		impl Default for $name {
			fn default() -> Self {
				Self::INVALID
			}
		}
	};
}

transparent_ref!(DeviceRef);
transparent_ref!(ControlTypeRef);
transparent_ref!(ControlUsageRef);
transparent_ref!(DeviceTypeRef);
transparent_ref!(DeviceTraitRef);

/// A control handle is a device plus a control usage within that device, matching
/// `InputControlRef { InputControlUsageRef usageRef; InputDeviceRef deviceRef; }`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlRef {
	pub device_ref: DeviceRef,
	pub usage_ref: ControlUsageRef,
}

impl ControlRef {
	pub const INVALID: ControlRef = ControlRef {
		device_ref: DeviceRef::INVALID,
		usage_ref: ControlUsageRef::INVALID,
	};
}

/// A consumer slot, one per double buffer. Framebuffer count is fixed at [`crate::init`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FramebufferRef(pub u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PersistentId(pub Guid);

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordingMode {
	Disabled,
	LatestOnly,
	AllMerged,
	AllAsIs,
}

impl Default for RecordingMode {
	fn default() -> Self {
		RecordingMode::Disabled
	}
}
