use super::{CubicBezierCurve, Line, PathCommand, Point};

/// The pen a charstring draws with. Every operation is relative to the
/// current point, and every segment drawn is recorded in absolute
/// coordinates
#[derive(Debug)]
pub struct PathBuilder {
    pub commands: Vec<PathCommand>,
    pub current_point: Point,
    subpath_start: Option<Point>,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            current_point: Point::origin(),
            subpath_start: None,
        }
    }

    /// Whether a moveto has started a subpath, so that drawing is allowed
    pub fn has_subpath(&self) -> bool {
        self.subpath_start.is_some()
    }

    /// Closes the open subpath, if any, and starts a new one
    pub fn relative_move_to(&mut self, dx: f64, dy: f64) {
        self.close_path();

        self.current_point = self.current_point.translate(dx, dy);
        self.subpath_start = Some(self.current_point);
    }

    /// Draws a line back to the start of the subpath. The current point is
    /// left where it was
    pub fn close_path(&mut self) {
        if let Some(start) = self.subpath_start {
            self.commands
                .push(PathCommand::Line(Line::new(self.current_point, start)));
        }
    }

    pub fn relative_line_to(&mut self, dx: f64, dy: f64) {
        let end = self.current_point.translate(dx, dy);

        self.commands
            .push(PathCommand::Line(Line::new(self.current_point, end)));
        self.current_point = end;
    }

    pub fn horizontal_line_to(&mut self, dx: f64) {
        self.relative_line_to(dx, 0.0);
    }

    pub fn vertical_line_to(&mut self, dy: f64) {
        self.relative_line_to(0.0, dy);
    }

    /// Each control point is relative to the one before it
    pub fn relative_relative_curve_to(
        &mut self,
        dx1: f64,
        dy1: f64,
        dx2: f64,
        dy2: f64,
        dx3: f64,
        dy3: f64,
    ) {
        let current_point = self.current_point;

        let first_control_point = current_point.translate(dx1, dy1);
        let second_control_point = first_control_point.translate(dx2, dy2);
        let end = second_control_point.translate(dx3, dy3);

        self.commands.push(PathCommand::Curve(CubicBezierCurve::new(
            current_point,
            end,
            first_control_point,
            second_control_point,
        )));
        self.current_point = end;
    }

    pub fn into_commands(self) -> Vec<PathCommand> {
        self.commands
    }
}

impl Default for PathBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn moveto_closes_previous_subpath() {
        let mut pen = PathBuilder::new();

        pen.relative_move_to(10.0, 10.0);
        pen.horizontal_line_to(5.0);
        pen.relative_move_to(0.0, 20.0);

        assert_eq!(
            pen.commands,
            [
                PathCommand::Line(Line::new(Point::new(10.0, 10.0), Point::new(15.0, 10.0))),
                PathCommand::Line(Line::new(Point::new(15.0, 10.0), Point::new(10.0, 10.0))),
            ]
        );
        assert_eq!(pen.current_point, Point::new(15.0, 30.0));
    }

    #[test]
    fn curve_control_points_chain() {
        let mut pen = PathBuilder::new();

        pen.relative_move_to(1.0, 1.0);
        pen.relative_relative_curve_to(1.0, 0.0, 1.0, 1.0, 0.0, 1.0);

        assert_eq!(
            pen.commands,
            [PathCommand::Curve(CubicBezierCurve::new(
                Point::new(1.0, 1.0),
                Point::new(3.0, 3.0),
                Point::new(2.0, 1.0),
                Point::new(3.0, 2.0),
            ))]
        );
    }

    #[test]
    fn nothing_to_close_before_moveto() {
        let mut pen = PathBuilder::new();

        pen.close_path();

        assert!(pen.commands.is_empty());
        assert!(!pen.has_subpath());
    }
}
