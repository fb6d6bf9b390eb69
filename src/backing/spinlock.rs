//! A non-recursive spinlock guarding the whole [`crate::context::Context`].
//!
//! Ported from `PAL.SpinLock.h`: test-and-test-and-set on an `AtomicBool`, with the
//! fast path doing a single `compare_exchange`-free `exchange(true, Acquire)` and the
//! slow path spinning on a relaxed load (so contended cores don't hammer the cache
//! line with RMW traffic) and yielding the CPU between polls.

use crossbeam_utils::CachePadded;
use std::hint;
use std::sync::atomic::{AtomicBool, Ordering};

pub struct Spinlock {
	locked: CachePadded<AtomicBool>,
}

impl Spinlock {
	pub const fn new() -> Self {
		Self {
			locked: CachePadded::new(AtomicBool::new(false)),
		}
	}

	pub fn lock(&self) {
		loop {
			if !self.locked.swap(true, Ordering::Acquire) {
				return;
			}
			while self.locked.load(Ordering::Relaxed) {
				hint::spin_loop();
			}
		}
	}

	pub fn try_lock(&self) -> bool {
		!self.locked.swap(true, Ordering::Acquire)
	}

	pub fn unlock(&self) {
		self.locked.store(false, Ordering::Release);
	}
}

impl Default for Spinlock {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Arc;
	use std::thread;

	#[test]
	fn excludes_concurrent_critical_sections() {
		let lock = Arc::new(Spinlock::new());
		let counter = Arc::new(std::sync::atomic::AtomicU64::new(0));
		let mut handles = Vec::new();
		for _ in 0..8 {
			let lock = lock.clone();
			let counter = counter.clone();
			handles.push(thread::spawn(move || {
				for _ in 0..1000 {
					lock.lock();
					counter.fetch_add(1, Ordering::Relaxed);
					lock.unlock();
				}
			}));
		}
		for h in handles {
			h.join().unwrap();
		}
		assert_eq!(counter.load(Ordering::Relaxed), 8000);
	}

	#[test]
	fn try_lock_fails_while_held() {
		let lock = Spinlock::new();
		lock.lock();
		assert!(!lock.try_lock());
		lock.unlock();
		assert!(lock.try_lock());
		lock.unlock();
	}
}
