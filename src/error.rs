//! Internal error type.
//!
//! Nothing in this enum crosses the public API boundary directly: every public entry
//! point converts a `Result<T, CoreError>` into a PAL log call plus a neutral return
//! value, mirroring the original runtime's `NullPtrCheck`/`ArgumentCheck` macros.

use crate::registry::{ControlRef, DeviceRef, FramebufferRef};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
	#[error("context not initialized")]
	NotInitialized,

	#[error("context already initialized")]
	AlreadyInitialized,

	#[error("framebuffer count must be non-zero")]
	ZeroFramebufferCount,

	#[error("unknown device {0:?}")]
	UnknownDevice(DeviceRef),

	#[error("unknown control {0:?}")]
	UnknownControl(ControlRef),

	#[error("framebuffer index {0:?} out of range")]
	InvalidFramebuffer(FramebufferRef),

	#[error("database callbacks not set")]
	NoDatabase,

	#[error("control {0:?} has no registered usage descriptor")]
	UnknownControlUsage(ControlRef),

	#[error("sample size mismatch: storage expects {expected} bytes, got {actual}")]
	SampleSizeMismatch { expected: usize, actual: usize },

	#[error("null argument: {0}")]
	NullArgument(&'static str),
}

pub type CoreResult<T> = Result<T, CoreError>;
