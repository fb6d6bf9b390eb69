//! The seven built-in control type adapters.
//!
//! Each module is grounded on the matching `Control.*.cpp`/`.h` pair in the original
//! runtime. Every adapter's `forward_merge` is order-insensitive across the samples
//! ingressed within a frame, so the result never depends on producer scheduling order,
//! per the rolling-merge design constraint.

pub mod axis_one_way;
pub mod axis_two_way;
pub mod button;
pub mod delta_axis_two_way;
pub mod delta_vector2d;
pub mod position2d;
pub mod stick;

pub use axis_one_way::AxisOneWay;
pub use axis_two_way::AxisTwoWay;
pub use button::{Button, ButtonState};
pub use delta_axis_two_way::DeltaAxisTwoWay;
pub use delta_vector2d::DeltaVector2D;
pub use position2d::Position2D;
pub use stick::Stick;
