//! Grounded on `BuiltInControlTypes.h`'s absolute pointer position usage: an absolute
//! 2D position, e.g. mouse cursor coordinates. No virtual children, no fan-out.
//! `frame_begin` is left at its default: an absolute position has no "reset to zero"
//! behaviour the way a relative delta does, so it persists across frames with no new
//! samples.

use crate::pipeline::ControlTypeAdapter;
use glam::Vec2;

pub struct Position2D;

impl ControlTypeAdapter for Position2D {
	type State = ();
	type Sample = Vec2;

	/// Last sample observed this frame wins; an absolute position has no meaningful
	/// "larger" sample to prefer the way stick deflection does.
	fn forward_merge(cur: &mut Vec2, next: Vec2) -> bool {
		*cur = next;
		true
	}
}
