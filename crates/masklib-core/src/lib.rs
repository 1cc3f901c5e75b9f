//! # MaskLib Core
//!
//! Geometry kernel for photolithography mask layout: movable poses that
//! chain contiguous segments, parametric shape generators that turn
//! pose-relative descriptions into world-space outlines and convex fills,
//! and the chip and drawing containers that collect the result.
//!
//! Routing algorithms built on top of this crate live in `masklib-microwave`.

pub mod chip;
pub mod drawing;
pub mod error;
pub mod geometry;
pub mod layer;
pub mod pose;
pub mod shapes;
pub mod sink;

pub use chip::{Chip, ChipId, Cursor, PoseHandle};
pub use drawing::{Drawing, DrawingSettings};
pub use error::{LayoutError, Result};
pub use geometry::{BBox, Outline, Placement, Point};
pub use layer::{Color, Layer, LayerId, LayerStack};
pub use pose::{Frame, ParamKey, Pose, Sense, TraceDefaults, Turn};
pub use shapes::{Shape, ShapeGenerator};
pub use sink::{Entity, GeometrySink, Recorder, Restyled, Style};
