//! A multi-producer, multi-consumer input control runtime: device/control registry,
//! double-buffered per-control-type storage, and a generic ingress pipeline with
//! rolling-merge and virtual-control fan-out.
//!
//! Grounded end to end on the `Runtime.Cpp` directory of Unity's InputSystem package:
//! [`context`] is `Context.h`/`.cpp`, [`pipeline`] is `ControlsIngress.h`,
//! [`backing::storage`] is `ControlsStorage.h`, [`types`] is the `Control.*.cpp` family,
//! and [`guid`] is `Guid.h`/`.cpp`. Every function at this crate root mirrors one of the
//! original's free `Input*` entry points, converted from its `NullPtrCheck`/
//! `ArgumentCheck`-then-bail idiom into a log-and-return-neutral-value idiom: nothing
//! here panics or propagates a `Result` across the public boundary.

pub mod backing;
pub mod context;
pub mod database;
pub mod error;
pub mod guid;
pub mod pal;
pub mod pipeline;
pub mod registry;
pub mod time;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use guid::{guid_from_str, guid_to_string, Guid};
pub use pal::{set_pal_callbacks, LogLevel, Pal};
pub use time::{current_time, Timestamp};

use crate::context::ContextGuard;
use crate::database::Database;
use crate::pal::LogLevel::Error as LogError;
use crate::registry::{
	control::ControlDescr, device::DeviceDescr, device::DeviceTraitInstance, ControlRef, DeviceRef, DeviceTraitRef,
	DeviceTypeRef, FramebufferRef, PersistentId, RecordingMode,
};
use std::sync::Arc;

/// Initializes the process-wide context with a fixed number of consumer framebuffers.
/// Must be called exactly once before any other entry point; a second call is a no-op
/// logged as an error, matching `InputInit`'s guard against double initialization.
pub fn init(framebuffer_count: u32) -> bool {
	match context::init(framebuffer_count) {
		Ok(()) => true,
		Err(e) => {
			pal::log(LogError, format_args!("init failed: {e}"));
			false
		}
	}
}

/// Tears down the process-wide context. Safe to call even if never initialized.
pub fn deinit() {
	context::deinit();
}

pub fn set_database_callbacks(db: Arc<dyn Database>) {
	context::set_database_callbacks(db);
}

/// Advances one consumer's double buffer: the accumulated back side becomes the new
/// front side, and every control's adapter state resets for the new frame.
pub fn swap_framebuffer(framebuffer: FramebufferRef) -> bool {
	let mut ctx = ContextGuard::acquire();
	match ctx.swap_framebuffer(framebuffer) {
		Ok(()) => true,
		Err(e) => {
			pal::log(LogError, format_args!("swap_framebuffer failed: {e}"));
			false
		}
	}
}

pub fn instantiate_device(device_type: DeviceTypeRef, persistent_id: PersistentId) -> Option<DeviceRef> {
	let mut ctx = ContextGuard::acquire();
	match ctx.instantiate_device(device_type, persistent_id) {
		Ok(device_ref) => Some(device_ref),
		Err(e) => {
			pal::log(LogError, format_args!("instantiate_device failed: {e}"));
			None
		}
	}
}

pub fn remove_device(device_ref: DeviceRef) {
	let mut ctx = ContextGuard::acquire();
	if let Err(e) = ctx.remove_device(device_ref) {
		pal::log(LogError, format_args!("remove_device failed: {e}"));
	}
}

pub fn find_device_for_persistent_id(persistent_id: PersistentId) -> Option<DeviceRef> {
	let ctx = ContextGuard::acquire();
	ctx.find_device_for_persistent_id(persistent_id)
}

pub fn get_device_trait(device_ref: DeviceRef, trait_ref: DeviceTraitRef) -> Option<DeviceTraitInstance> {
	let ctx = ContextGuard::acquire();
	ctx.get_device_trait(device_ref, trait_ref).cloned()
}

pub fn get_device_descr(device_ref: DeviceRef) -> Option<DeviceDescr> {
	let ctx = ContextGuard::acquire();
	ctx.get_device_descr(device_ref).cloned()
}

pub fn set_control_descr(control_ref: ControlRef, descr: ControlDescr) {
	let mut ctx = ContextGuard::acquire();
	if let Err(e) = ctx.set_control_descr(control_ref, descr) {
		pal::log(LogError, format_args!("set_control_descr failed: {e}"));
	}
}

pub fn get_control_descr(control_ref: ControlRef) -> Option<ControlDescr> {
	let ctx = ContextGuard::acquire();
	ctx.get_control_descr(control_ref).cloned()
}

pub fn set_recording_mode(control_ref: ControlRef, mode: RecordingMode) {
	let mut ctx = ContextGuard::acquire();
	if let Err(e) = ctx.set_recording_mode(control_ref, mode) {
		pal::log(LogError, format_args!("set_recording_mode failed: {e}"));
	}
}

pub fn get_recording_mode(control_ref: ControlRef) -> RecordingMode {
	let ctx = ContextGuard::acquire();
	ctx.get_recording_mode(control_ref)
}

/// Pushes one raw sample into `control_ref`'s ingress pipeline across every
/// framebuffer, recursively forwarding to virtual children per their adapter's fan-out.
pub fn push_sample(control_ref: ControlRef, sample: &[u8], timestamp: Timestamp) {
	let mut ctx = ContextGuard::acquire();
	if let Err(e) = ctx.push_sample(control_ref, sample, timestamp) {
		pal::log(LogError, format_args!("push_sample failed: {e}"));
	}
}

/// Returns `(adapter state, latest recorded timestamp, latest recorded sample)` from
/// the front side of `framebuffer`, regardless of the control's recording mode.
pub fn get_control_generic_state(control_ref: ControlRef, framebuffer: FramebufferRef) -> Option<(Vec<u8>, Timestamp, Vec<u8>)> {
	let ctx = ContextGuard::acquire();
	ctx.get_control_generic_state(control_ref, framebuffer)
		.map(|(state, ts, sample)| (state.to_vec(), ts, sample.to_vec()))
}

/// Returns the raw `(timestamps, samples, count)` history recorded for `control_ref`
/// under `AllMerged`/`AllAsIs` recording modes.
pub fn get_control_generic_recordings(control_ref: ControlRef, framebuffer: FramebufferRef) -> Option<(Vec<u8>, Vec<u8>, usize)> {
	let ctx = ContextGuard::acquire();
	ctx.get_control_generic_recordings(control_ref, framebuffer)
		.map(|(ts, samples, count)| (ts.to_vec(), samples.to_vec(), count))
}

/// Forces the front buffer's recorded state to mirror the back buffer for one control.
/// Left unimplemented in the original runtime (`Controls.cpp` marks it `// TODO`); kept
/// as an explicit no-op here rather than invented, since its semantics were never
/// settled upstream.
pub fn force_sync_control_in_frontbuffer_with_backbuffer(_control_ref: ControlRef, _framebuffer: FramebufferRef) {}
