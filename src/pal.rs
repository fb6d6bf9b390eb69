//! Platform abstraction callbacks: logging and the debug trap.
//!
//! Grounded on `PAL.Callbacks.h`/`.cpp`, which store a small table of function pointers
//! set once by the host and called from anywhere in the runtime without threading a
//! context object through every call site.

use once_cell::sync::OnceCell;
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
	Trace,
	Debug,
	Info,
	Warn,
	Error,
}

pub trait Pal: Send + Sync {
	fn log(&self, level: LogLevel, message: &str);

	fn debug_trap(&self);
}

struct DefaultPal;

impl Pal for DefaultPal {
	fn log(&self, level: LogLevel, message: &str) {
		eprintln!("[{:?}] {}", level, message);
	}

	fn debug_trap(&self) {
		#[cfg(debug_assertions)]
		{
			std::process::abort();
		}
	}
}

static PAL: OnceCell<Box<dyn Pal>> = OnceCell::new();

/// Installs the host-provided PAL callbacks. Replaces the default stderr logger.
///
/// Only the first call takes effect, matching `PAL.Callbacks.cpp`'s single assignment
/// at startup; later calls are ignored rather than erroring, since swapping callbacks
/// mid-run is not a supported scenario.
pub fn set_pal_callbacks(pal: Box<dyn Pal>) {
	let _ = PAL.set(pal);
}

fn pal() -> &'static dyn Pal {
	PAL.get_or_init(|| Box::new(DefaultPal)).as_ref()
}

pub fn log(level: LogLevel, args: fmt::Arguments<'_>) {
	pal().log(level, &args.to_string());
}

macro_rules! log {
	($level:expr, $($arg:tt)*) => {
		$crate::pal::log($level, format_args!($($arg)*))
	};
}

pub(crate) use log as log_macro;

/// Logs `$msg` and runs `$on_err` unless `$cond` holds, mirroring `ArgumentCheck`'s
/// log-then-bail pattern at public API boundaries.
macro_rules! check {
	($cond:expr, $($arg:tt)*) => {
		if !($cond) {
			$crate::pal::log($crate::pal::LogLevel::Error, format_args!($($arg)*));
			return Default::default();
		}
	};
}

pub(crate) use check;
