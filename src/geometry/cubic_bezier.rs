use super::{point::Point, BoundingBox};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezierCurve {
    pub start: Point,
    pub end: Point,
    pub first_control_point: Point,
    pub second_control_point: Point,
}

impl CubicBezierCurve {
    pub fn new(
        start: Point,
        end: Point,
        first_control_point: Point,
        second_control_point: Point,
    ) -> Self {
        Self {
            start,
            first_control_point,
            second_control_point,
            end,
        }
    }

    pub fn basis(&self, t: f64) -> Point {
        let t2 = t * t;
        let t3 = t2 * t;

        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let mt3 = mt2 * mt;

        self.start * mt3
            + 3.0 * self.first_control_point * mt2 * t
            + 3.0 * self.second_control_point * mt * t2
            + self.end * t3
    }

    /// Bounds of the curve itself, which can be tighter than the hull of its
    /// control points
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox::new();

        bbox.add_point(self.start);
        bbox.add_point(self.end);

        for i in 1..1000 {
            bbox.add_point(self.basis(i as f64 / 1000.0));
        }

        bbox
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn basis_interpolates_endpoints() {
        let curve = CubicBezierCurve::new(
            Point::new(0.0, 0.0),
            Point::new(3.0, 0.0),
            Point::new(1.0, 3.0),
            Point::new(2.0, 3.0),
        );

        assert_eq!(curve.basis(0.0), curve.start);
        assert_eq!(curve.basis(1.0), curve.end);
        assert_eq!(curve.basis(0.5), Point::new(1.5, 2.25));

        let bbox = curve.bounding_box();
        assert_eq!(bbox.min(), Point::new(0.0, 0.0));
        assert_eq!(bbox.max(), Point::new(3.0, 2.25));
    }
}
