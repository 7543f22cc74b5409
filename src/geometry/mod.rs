pub use bounding_box::BoundingBox;
pub use cubic_bezier::CubicBezierCurve;
pub use line::Line;
pub use path::PathCommand;
pub use point::Point;

mod bounding_box;
mod cubic_bezier;
mod line;
mod path;
pub mod path_builder;
mod point;
