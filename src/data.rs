pub mod geo;
pub mod landmark;
pub mod shape;

pub use geo::{Coordinate, CoordinateBounds};
pub use landmark::{LandmarkRecord, LandmarkStore};
pub use shape::{GeometryShape, ShapePart};
