//! Device instances.
//!
//! Grounded on `Devices.h`/`.cpp`: a device is identified by its [`super::DeviceRef`]
//! handle plus a stable [`super::PersistentId`] GUID that survives reconnects, and owns
//! the set of device-trait-to-control-refs mappings the database told us about at
//! instantiation time.

use crate::registry::{ControlRef, DeviceTraitRef, DeviceTypeRef, PersistentId};
use smallvec::SmallVec;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceDescr {
	pub name: String,
}

#[derive(Debug, Clone)]
pub struct DeviceTraitInstance {
	pub trait_ref: DeviceTraitRef,
	pub controls: SmallVec<[ControlRef; 8]>,
}

#[derive(Debug, Clone)]
pub struct DeviceInstance {
	pub device_type: DeviceTypeRef,
	pub persistent_id: PersistentId,
	pub descr: DeviceDescr,
	pub traits: SmallVec<[DeviceTraitInstance; 4]>,
	pub pending_deletion: bool,
}

impl DeviceInstance {
	pub fn new(device_type: DeviceTypeRef, persistent_id: PersistentId) -> Self {
		Self {
			device_type,
			persistent_id,
			descr: DeviceDescr::default(),
			traits: SmallVec::new(),
			pending_deletion: false,
		}
	}

	pub fn get_trait(&self, trait_ref: DeviceTraitRef) -> Option<&DeviceTraitInstance> {
		self.traits.iter().find(|t| t.trait_ref == trait_ref)
	}

	pub fn get_trait_mut(&mut self, trait_ref: DeviceTraitRef) -> Option<&mut DeviceTraitInstance> {
		self.traits.iter_mut().find(|t| t.trait_ref == trait_ref)
	}
}
