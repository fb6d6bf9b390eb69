//! The generic control ingress pipeline.
//!
//! Grounded on `ControlsIngress.h`'s `InputIngressPipelineProvider`/`InputIngressPipeline`
//! template pair: a control type provides five static hooks (convert, rolling merge,
//! per-transition state update, and a pre- or post-merge fan-out) and a single template
//! function drives them for every sample pushed at runtime. Here the five hooks are an
//! associated-type trait, [`ControlTypeAdapter`], with [`ErasedAdapter`] the type-erased
//! byte-slice wrapper [`crate::context::Context`] dispatches through so it never needs to
//! name a concrete control type.
//!
//! Virtual-control fan-out and the reverse (a push into a virtual child re-dispatching
//! up through its parent's `convert`) are both addressed purely by position: a control
//! type that fans out to `N` virtual children emits up to `N` [`RawSample`]s in a fixed,
//! documented order, and `convert` is told which of those positions produced the sample
//! it's being asked to reinterpret (see `BuiltInControlTypes.h`'s fixed child ordering
//! per usage).

use crate::time::Timestamp;
use bytemuck::Pod;
use smallvec::SmallVec;
use std::marker::PhantomData;
use std::sync::Arc;

/// A sample or partial sample addressed to a virtual child control during fan-out,
/// stored inline since no built-in control type's sample exceeds 16 bytes.
pub type RawSample = SmallVec<[u8; 16]>;

/// The maximum number of virtual children any built-in control type fans out to
/// (`DeltaVector2D`'s two delta-axes plus four thresholded buttons).
pub type FanOut = SmallVec<[RawSample; 8]>;

/// Whether a control type's fan-out runs from the raw incoming sample or from the
/// merged, settled value.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FanOutTiming {
	/// Before merge: every sample ingressed this frame fans out individually. Used by
	/// accumulator types so virtual children accumulate the same increments as the
	/// parent rather than a single summed total.
	PreMerge,
	/// After merge: only the frame's final settled value fans out. Used by identity
	/// types so virtual children always reflect the latest value.
	PostMerge,
}

/// The five per-control-type hooks `InputIngressPipeline` drives generically.
pub trait ControlTypeAdapter: Send + Sync + 'static {
	type State: Pod + Default + Send + Sync;
	type Sample: Pod + Default + Send + Sync;

	const FAN_OUT_TIMING: FanOutTiming = FanOutTiming::PostMerge;

	/// Runs once per framebuffer before any sample is ingressed for the new frame.
	/// The default leaves the latest recorded timestamp/sample untouched, which is
	/// correct for identity types (a button should still read "pressed" on a frame
	/// with no new samples); accumulator types override this to re-zero `latest_sample`
	/// and stamp `latest_ts` to the new frame's start, matching
	/// `ControlTypeFrameBegin`'s `backSamplePtr`/`backTsPtr` re-initialisation.
	fn frame_begin(_state: &mut Self::State, _latest_ts: &mut Timestamp, _latest_sample: &mut Self::Sample) {}

	/// Stateless fold of two adjacent samples. Returning `true` means `next` was
	/// coalesced into `cur` (which this call may mutate in place); returning `false`
	/// means the two stay distinct. Must be order-insensitive, since the caller may
	/// apply it against an ad-hoc "current latest" or between arbitrary pairs within a
	/// batch.
	fn forward_merge(cur: &mut Self::Sample, next: Self::Sample) -> bool;

	/// Per-transition update to `state`, called once for every accepted sample in
	/// order, given the sample that was latest immediately before and the one just
	/// accepted. Drives edge-triggered fields like a button's `wasPressedThisIOFrame`.
	fn update_control_state(_state: &mut Self::State, _prev: Self::Sample, _next: Self::Sample) {}

	/// Reinterprets a foreign sample forwarded up from the virtual child occupying
	/// fan-out position `slot` as this type's own sample. Only types that are the
	/// declared parent of a virtual control of a different type need to override this;
	/// the default is only ever called for types with no such children.
	fn convert(_slot: usize, _raw: &[u8]) -> Self::Sample {
		Self::Sample::default()
	}

	/// Values to forward to this control's virtual children, in registration order.
	/// Called with the raw sample (`FAN_OUT_TIMING::PreMerge`) or the merged value
	/// (`FAN_OUT_TIMING::PostMerge`).
	fn fan_out(_value: Self::Sample) -> FanOut {
		SmallVec::new()
	}
}

/// Type-erased byte-slice view of a [`ControlTypeAdapter`], looked up through the
/// [`crate::database::Database`] so the core dispatches ingress without matching on a
/// concrete control type.
pub trait ErasedAdapter: Send + Sync {
	fn state_size(&self) -> usize;

	fn sample_size(&self) -> usize;

	fn fan_out_timing(&self) -> FanOutTiming;

	fn frame_begin(&self, state: &mut [u8], latest_ts: &mut Timestamp, latest_sample: &mut [u8]);

	fn forward_merge(&self, cur: &mut [u8], next: &[u8]) -> bool;

	fn update_control_state(&self, state: &mut [u8], prev: &[u8], next: &[u8]);

	fn convert(&self, slot: usize, raw: &[u8]) -> RawSample;

	fn fan_out(&self, value: &[u8]) -> FanOut;
}

pub struct AdapterOps<A>(PhantomData<A>);

impl<A> AdapterOps<A> {
	pub fn new() -> Arc<dyn ErasedAdapter>
	where
		A: ControlTypeAdapter,
	{
		Arc::new(AdapterOps::<A>(PhantomData))
	}
}

impl<A: ControlTypeAdapter> ErasedAdapter for AdapterOps<A> {
	fn state_size(&self) -> usize {
		std::mem::size_of::<A::State>()
	}

	fn sample_size(&self) -> usize {
		std::mem::size_of::<A::Sample>()
	}

	fn fan_out_timing(&self) -> FanOutTiming {
		A::FAN_OUT_TIMING
	}

	fn frame_begin(&self, state: &mut [u8], latest_ts: &mut Timestamp, latest_sample: &mut [u8]) {
		let mut typed_state: A::State = *bytemuck::from_bytes(state);
		let mut typed_sample: A::Sample = *bytemuck::from_bytes(latest_sample);
		A::frame_begin(&mut typed_state, latest_ts, &mut typed_sample);
		state.copy_from_slice(bytemuck::bytes_of(&typed_state));
		latest_sample.copy_from_slice(bytemuck::bytes_of(&typed_sample));
	}

	fn forward_merge(&self, cur: &mut [u8], next: &[u8]) -> bool {
		let mut typed_cur: A::Sample = *bytemuck::from_bytes(cur);
		let typed_next: A::Sample = *bytemuck::from_bytes(next);
		let merged = A::forward_merge(&mut typed_cur, typed_next);
		if merged {
			cur.copy_from_slice(bytemuck::bytes_of(&typed_cur));
		}
		merged
	}

	fn update_control_state(&self, state: &mut [u8], prev: &[u8], next: &[u8]) {
		let mut typed_state: A::State = *bytemuck::from_bytes(state);
		let typed_prev: A::Sample = *bytemuck::from_bytes(prev);
		let typed_next: A::Sample = *bytemuck::from_bytes(next);
		A::update_control_state(&mut typed_state, typed_prev, typed_next);
		state.copy_from_slice(bytemuck::bytes_of(&typed_state));
	}

	fn convert(&self, slot: usize, raw: &[u8]) -> RawSample {
		let sample = A::convert(slot, raw);
		RawSample::from_slice(bytemuck::bytes_of(&sample))
	}

	fn fan_out(&self, value: &[u8]) -> FanOut {
		let typed: A::Sample = *bytemuck::from_bytes(value);
		A::fan_out(typed)
	}
}
