use super::{BoundingBox, CubicBezierCurve, Line, Point};

/// One drawn segment of a glyph outline, in absolute coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    Line(Line),
    Curve(CubicBezierCurve),
}

impl PathCommand {
    pub fn start(&self) -> Point {
        match self {
            Self::Line(line) => line.start,
            Self::Curve(curve) => curve.start,
        }
    }

    pub fn end(&self) -> Point {
        match self {
            Self::Line(line) => line.end,
            Self::Curve(curve) => curve.end,
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            Self::Line(line) => line.bounding_box(),
            Self::Curve(curve) => curve.bounding_box(),
        }
    }
}
