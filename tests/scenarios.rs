//! End-to-end scenarios against a small hand-written device database: a keyboard with
//! one button (exposed additionally as a pressure axis) and a mouse with a 2-D scroll
//! delta (exposed additionally as separate x/y delta axes and up/down scroll buttons).
//! Every scenario runs at `framebufferCount = 1`, framebuffer `f = 0`.

use input_runtime::database::{ControlTypeDescr, ControlUsageDescr, Database, DeviceTraitDescr};
use input_runtime::pipeline::{AdapterOps, ErasedAdapter};
use input_runtime::registry::{
	ControlRef, ControlTypeRef, ControlUsageRef, DeviceTraitRef, DeviceTypeRef, FramebufferRef, PersistentId, RecordingMode,
};
use input_runtime::types::{button, AxisOneWay, Button, DeltaAxisTwoWay, DeltaVector2D};
use input_runtime::{guid_from_str, guid_to_string, Timestamp};
use smallvec::{smallvec, SmallVec};
use std::sync::Arc;

const KEYBOARD_DEVICE_TYPE: DeviceTypeRef = DeviceTypeRef(0);
const MOUSE_DEVICE_TYPE: DeviceTypeRef = DeviceTypeRef(1);

const KEYBOARD_TRAIT: DeviceTraitRef = DeviceTraitRef(0);
const MOUSE_TRAIT: DeviceTraitRef = DeviceTraitRef(1);

const TYPE_BUTTON: ControlTypeRef = ControlTypeRef(0);
const TYPE_AXIS_ONE_WAY: ControlTypeRef = ControlTypeRef(1);
const TYPE_DELTA_AXIS_TWO_WAY: ControlTypeRef = ControlTypeRef(2);
const TYPE_DELTA_VECTOR2D: ControlTypeRef = ControlTypeRef(3);

const USAGE_SPACE_BUTTON: ControlUsageRef = ControlUsageRef(0);
const USAGE_SPACE_BUTTON_AXIS: ControlUsageRef = ControlUsageRef(1);
const USAGE_SCROLL_DELTA: ControlUsageRef = ControlUsageRef(2);
const USAGE_SCROLL_DELTA_X: ControlUsageRef = ControlUsageRef(3);
const USAGE_SCROLL_DELTA_Y: ControlUsageRef = ControlUsageRef(4);
const USAGE_SCROLL_UP: ControlUsageRef = ControlUsageRef(5);
const USAGE_SCROLL_DOWN: ControlUsageRef = ControlUsageRef(6);

const KEYBOARD_GUID: &str = "8d37e884-458e-4b1d-805f-95425987e9d1";
const MOUSE_GUID: &str = "b642521e-7c4b-45d0-b3b7-6084e786aa22";

struct TestDatabase;

impl Database for TestDatabase {
	fn control_type_descr(&self, control_type_ref: ControlTypeRef) -> Option<ControlTypeDescr> {
		let adapter: Arc<dyn ErasedAdapter> = self.adapter(control_type_ref)?;
		Some(ControlTypeDescr {
			state_size: adapter.state_size(),
			sample_size: adapter.sample_size(),
		})
	}

	fn control_usage_descr(&self, usage_ref: ControlUsageRef) -> Option<ControlUsageDescr> {
		Some(match usage_ref {
			USAGE_SPACE_BUTTON => ControlUsageDescr {
				control_type_ref: TYPE_BUTTON,
				parent_of_virtual_control: None,
				default_recording_mode: RecordingMode::AllAsIs,
			},
			USAGE_SPACE_BUTTON_AXIS => ControlUsageDescr {
				control_type_ref: TYPE_AXIS_ONE_WAY,
				parent_of_virtual_control: Some(USAGE_SPACE_BUTTON),
				default_recording_mode: RecordingMode::Disabled,
			},
			USAGE_SCROLL_DELTA => ControlUsageDescr {
				control_type_ref: TYPE_DELTA_VECTOR2D,
				parent_of_virtual_control: None,
				default_recording_mode: RecordingMode::LatestOnly,
			},
			// Registration order below tracks `DeltaVector2D::fan_out`'s slot order
			// (x, y, up, down, ...) exactly, since fan-out addresses virtual children
			// purely by position.
			USAGE_SCROLL_DELTA_X => ControlUsageDescr {
				control_type_ref: TYPE_DELTA_AXIS_TWO_WAY,
				parent_of_virtual_control: Some(USAGE_SCROLL_DELTA),
				default_recording_mode: RecordingMode::Disabled,
			},
			USAGE_SCROLL_DELTA_Y => ControlUsageDescr {
				control_type_ref: TYPE_DELTA_AXIS_TWO_WAY,
				parent_of_virtual_control: Some(USAGE_SCROLL_DELTA),
				default_recording_mode: RecordingMode::Disabled,
			},
			USAGE_SCROLL_UP => ControlUsageDescr {
				control_type_ref: TYPE_BUTTON,
				parent_of_virtual_control: Some(USAGE_SCROLL_DELTA),
				default_recording_mode: RecordingMode::LatestOnly,
			},
			USAGE_SCROLL_DOWN => ControlUsageDescr {
				control_type_ref: TYPE_BUTTON,
				parent_of_virtual_control: Some(USAGE_SCROLL_DELTA),
				default_recording_mode: RecordingMode::LatestOnly,
			},
			_ => return None,
		})
	}

	fn device_traits(&self, device_type: DeviceTypeRef) -> SmallVec<[DeviceTraitDescr; 4]> {
		match device_type {
			KEYBOARD_DEVICE_TYPE => smallvec![DeviceTraitDescr { trait_ref: KEYBOARD_TRAIT }],
			MOUSE_DEVICE_TYPE => smallvec![DeviceTraitDescr { trait_ref: MOUSE_TRAIT }],
			_ => SmallVec::new(),
		}
	}

	fn control_usages_for_trait(&self, trait_ref: DeviceTraitRef) -> SmallVec<[ControlUsageRef; 8]> {
		match trait_ref {
			KEYBOARD_TRAIT => smallvec![USAGE_SPACE_BUTTON, USAGE_SPACE_BUTTON_AXIS],
			MOUSE_TRAIT => smallvec![
				USAGE_SCROLL_DELTA,
				USAGE_SCROLL_DELTA_X,
				USAGE_SCROLL_DELTA_Y,
				USAGE_SCROLL_UP,
				USAGE_SCROLL_DOWN,
			],
			_ => SmallVec::new(),
		}
	}

	fn adapter(&self, control_type_ref: ControlTypeRef) -> Option<Arc<dyn ErasedAdapter>> {
		match control_type_ref {
			TYPE_BUTTON => Some(AdapterOps::<Button>::new()),
			TYPE_AXIS_ONE_WAY => Some(AdapterOps::<AxisOneWay>::new()),
			TYPE_DELTA_AXIS_TWO_WAY => Some(AdapterOps::<DeltaAxisTwoWay>::new()),
			TYPE_DELTA_VECTOR2D => Some(AdapterOps::<DeltaVector2D>::new()),
			_ => None,
		}
	}
}

// The context is one process-wide singleton, so scenario tests can't run concurrently
// against it; hold this mutex for the duration of each test instead.
static TEST_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

fn setup() -> std::sync::MutexGuard<'static, ()> {
	let guard = TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
	input_runtime::deinit();
	assert!(input_runtime::init(1));
	input_runtime::set_database_callbacks(Arc::new(TestDatabase));
	guard
}

fn instantiate_keyboard() -> ControlRef {
	let keyboard = input_runtime::instantiate_device(KEYBOARD_DEVICE_TYPE, PersistentId(guid_from_str(KEYBOARD_GUID))).unwrap();
	ControlRef {
		device_ref: keyboard,
		usage_ref: USAGE_SPACE_BUTTON,
	}
}

fn is_pressed(sample: &[u8]) -> bool {
	button::is_pressed(sample[0])
}

/// A single button press then release, including the "swap again with no new ingress"
/// step that proves the edge flags reset each frame but the level persists.
#[test]
fn button_pulse_and_release() {
	let _guard = setup();
	let space = instantiate_keyboard();
	let space_axis = ControlRef {
		device_ref: space.device_ref,
		usage_ref: USAGE_SPACE_BUTTON_AXIS,
	};
	let fb = FramebufferRef(0);

	// Before any ingress or swap, everything reads as the zeroed default.
	let (state, _, sample) = input_runtime::get_control_generic_state(space, fb).unwrap();
	assert!(!is_pressed(&sample));
	assert_eq!(state[0], 0);

	input_runtime::push_sample(space, &[1u8], Timestamp::new(1, 0));

	// Ingress alone must not move the front side.
	let (state, _, sample) = input_runtime::get_control_generic_state(space, fb).unwrap();
	assert!(!is_pressed(&sample));
	assert_eq!(state[0], 0);

	assert!(input_runtime::swap_framebuffer(fb));

	let (state, _, sample) = input_runtime::get_control_generic_state(space, fb).unwrap();
	assert!(is_pressed(&sample));
	assert_eq!(state[0], 1, "wasPressedThisIOFrame");
	assert_eq!(state[1], 0, "wasReleasedThisIOFrame");

	let (_, _, axis_sample) = input_runtime::get_control_generic_state(space_axis, fb).unwrap();
	assert_eq!(*bytemuck::from_bytes::<f32>(&axis_sample), 1.0);

	// Swap again with nothing new ingressed: level persists, edge clears.
	assert!(input_runtime::swap_framebuffer(fb));
	let (state, _, sample) = input_runtime::get_control_generic_state(space, fb).unwrap();
	assert!(is_pressed(&sample));
	assert_eq!(state[0], 0, "wasPressedThisIOFrame should have cleared");

	// Release.
	input_runtime::push_sample(space, &[0u8], Timestamp::new(2, 0));
	assert!(input_runtime::swap_framebuffer(fb));
	let (state, _, sample) = input_runtime::get_control_generic_state(space, fb).unwrap();
	assert!(!is_pressed(&sample));
	assert_eq!(state[1], 1, "wasReleasedThisIOFrame");
}

/// Pushing directly to the virtual one-way-axis child re-dispatches through the
/// button's own ingress via `convert`, including its edge state.
#[test]
fn cross_control_ingress_through_virtual_child() {
	let _guard = setup();
	let space = instantiate_keyboard();
	let space_axis = ControlRef {
		device_ref: space.device_ref,
		usage_ref: USAGE_SPACE_BUTTON_AXIS,
	};
	let fb = FramebufferRef(0);

	input_runtime::push_sample(space_axis, bytemuck::bytes_of(&1.0f32), Timestamp::new(1, 0));
	assert!(input_runtime::swap_framebuffer(fb));

	let (state, _, sample) = input_runtime::get_control_generic_state(space, fb).unwrap();
	assert!(is_pressed(&sample));
	assert_eq!(state[0], 1, "wasPressedThisIOFrame");
}

/// `AllMerged` coalesces adjacent equal samples into a single run, keeping the run's
/// starting timestamp, and produces a variable number of entries rather than always
/// collapsing to one.
#[test]
fn all_merged_coalesces_runs_of_equal_samples() {
	let _guard = setup();
	let space = instantiate_keyboard();
	let fb = FramebufferRef(0);
	input_runtime::set_recording_mode(space, RecordingMode::AllMerged);

	let pattern: Vec<u8> = (0..10u64).map(|i| if i % 3 != 0 { 1 } else { 0 }).collect();
	assert_eq!(pattern, vec![0, 1, 1, 0, 1, 1, 0, 1, 1, 0]);
	for (i, &value) in pattern.iter().enumerate() {
		input_runtime::push_sample(space, &[value], Timestamp::new(i as u64, 0));
	}
	assert!(input_runtime::swap_framebuffer(fb));

	let (timestamps, samples, count) = input_runtime::get_control_generic_recordings(space, fb).unwrap();
	assert_eq!(count, 7);
	let ts: Vec<u64> = timestamps
		.chunks_exact(std::mem::size_of::<Timestamp>())
		.map(|c| bytemuck::from_bytes::<Timestamp>(c).timestamp)
		.collect();
	assert_eq!(ts, vec![0, 1, 3, 4, 6, 7, 9]);
	assert_eq!(samples, vec![0, 1, 0, 1, 0, 1, 0]);
}

fn instantiate_mouse() -> (ControlRef, ControlRef, ControlRef) {
	let mouse = input_runtime::instantiate_device(MOUSE_DEVICE_TYPE, PersistentId(guid_from_str(MOUSE_GUID))).unwrap();
	let scroll = ControlRef {
		device_ref: mouse,
		usage_ref: USAGE_SCROLL_DELTA,
	};
	let up = ControlRef {
		device_ref: mouse,
		usage_ref: USAGE_SCROLL_UP,
	};
	let down = ControlRef {
		device_ref: mouse,
		usage_ref: USAGE_SCROLL_DOWN,
	};
	(scroll, up, down)
}

fn push_scroll_pattern(scroll: ControlRef) {
	for i in 0..10u64 {
		let y: f32 = if i % 3 != 0 { 1.0 } else { -1.0 };
		let sample = glam::Vec2::new(0.0, y);
		input_runtime::push_sample(scroll, bytemuck::bytes_of(&sample), Timestamp::new(i, 0));
	}
}

/// `Disabled` mode: nothing moves, no button edges fire.
#[test]
fn mouse_scroll_disabled_mode_is_inert() {
	let _guard = setup();
	let (scroll, up, down) = instantiate_mouse();
	input_runtime::set_recording_mode(scroll, RecordingMode::Disabled);
	let fb = FramebufferRef(0);

	push_scroll_pattern(scroll);
	assert!(input_runtime::swap_framebuffer(fb));

	let (_, _, sample) = input_runtime::get_control_generic_state(scroll, fb).unwrap();
	assert_eq!(bytemuck::from_bytes::<glam::Vec2>(&sample).y, 0.0);
	let (up_state, _, _) = input_runtime::get_control_generic_state(up, fb).unwrap();
	let (down_state, _, _) = input_runtime::get_control_generic_state(down, fb).unwrap();
	assert_eq!((up_state[0], up_state[1]), (0, 0));
	assert_eq!((down_state[0], down_state[1]), (0, 0));
}

/// `LatestOnly`/`AllMerged`: the running additive sum is visible as `latest`, and both
/// up/down buttons observe press and release edges along the way.
#[test]
fn mouse_scroll_latest_only_and_all_merged_accumulate() {
	for mode in [RecordingMode::LatestOnly, RecordingMode::AllMerged] {
		let _guard = setup();
		let (scroll, up, down) = instantiate_mouse();
		input_runtime::set_recording_mode(scroll, mode);
		let fb = FramebufferRef(0);

		push_scroll_pattern(scroll);
		assert!(input_runtime::swap_framebuffer(fb));

		let (_, timestamp, sample) = input_runtime::get_control_generic_state(scroll, fb).unwrap();
		assert_eq!(timestamp, Timestamp::new(9, 0));
		assert_eq!(bytemuck::from_bytes::<glam::Vec2>(&sample).y, 2.0, "mode {mode:?}");

		let (up_state, _, _) = input_runtime::get_control_generic_state(up, fb).unwrap();
		let (down_state, _, _) = input_runtime::get_control_generic_state(down, fb).unwrap();
		assert_eq!(up_state[0], 1, "up should have seen a press edge, mode {mode:?}");
		assert_eq!(up_state[1], 1, "up should have seen a release edge, mode {mode:?}");
		assert_eq!(down_state[0], 1, "down should have seen a press edge, mode {mode:?}");
		assert_eq!(down_state[1], 1, "down should have seen a release edge, mode {mode:?}");

		// Follow-up swap with no ingress: the accumulator re-zeroes at frame-begin.
		assert!(input_runtime::swap_framebuffer(fb));
		let (_, _, sample) = input_runtime::get_control_generic_state(scroll, fb).unwrap();
		assert_eq!(bytemuck::from_bytes::<glam::Vec2>(&sample).y, 0.0);
	}
}

/// `AllAsIs`: no merging, `latest` is the last raw sample verbatim, and every push is
/// recorded individually.
#[test]
fn mouse_scroll_all_as_is_keeps_last_raw_sample() {
	let _guard = setup();
	let (scroll, _, _) = instantiate_mouse();
	input_runtime::set_recording_mode(scroll, RecordingMode::AllAsIs);
	let fb = FramebufferRef(0);

	push_scroll_pattern(scroll);
	assert!(input_runtime::swap_framebuffer(fb));

	let (_, timestamp, sample) = input_runtime::get_control_generic_state(scroll, fb).unwrap();
	assert_eq!(timestamp, Timestamp::new(9, 0));
	assert_eq!(bytemuck::from_bytes::<glam::Vec2>(&sample).y, -1.0);

	let (_, _, count) = input_runtime::get_control_generic_recordings(scroll, fb).unwrap();
	assert_eq!(count, 10);
}

/// GUID parse/format round trip on a fixed, known-good example.
#[test]
fn guid_round_trip_matches_known_bytes() {
	let guid = guid_from_str("d8c9e8d6-9fca-4177-a288-29d4eefd893d");
	assert_eq!(
		guid.to_bytes(),
		[0xd6, 0xe8, 0xc9, 0xd8, 0xca, 0x9f, 0x77, 0x41, 0xa2, 0x88, 0x29, 0xd4, 0xee, 0xfd, 0x89, 0x3d]
	);
	assert_eq!(guid_to_string(guid), "d8c9e8d6-9fca-4177-a288-29d4eefd893d");
}

#[test]
fn find_device_by_persistent_id() {
	let _guard = setup();
	let guid = guid_from_str(KEYBOARD_GUID);
	let keyboard = input_runtime::instantiate_device(KEYBOARD_DEVICE_TYPE, PersistentId(guid)).unwrap();
	assert_eq!(input_runtime::find_device_for_persistent_id(PersistentId(guid)), Some(keyboard));

	input_runtime::remove_device(keyboard);
	assert!(input_runtime::find_device_for_persistent_id(PersistentId(guid)).is_none());
}
