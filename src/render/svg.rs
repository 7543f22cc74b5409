use std::fmt::Write;

use crate::{
    font::Glyph,
    geometry::{BoundingBox, PathCommand, Point},
};

/// Maps font units, y up, onto the SVG canvas, y down, with the top left
/// corner of `bbox` at the origin
#[derive(Debug, Clone, Copy)]
struct Canvas {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl Canvas {
    fn new(bbox: BoundingBox) -> Self {
        Self {
            left: bbox.min().x,
            top: bbox.max().y,
            width: bbox.width(),
            height: bbox.height(),
        }
    }

    fn project(&self, p: Point) -> Point {
        Point::new(p.x - self.left, self.top - p.y)
    }
}

fn write_point(out: &mut String, p: Point) {
    let _ = write!(out, "{},{}", p.x, p.y);
}

/// An SVG document stroking the outline of `glyph`. `font_bbox`, laid out as
/// `FontBBox` is, sets the canvas; when it is all zeros the glyph's own
/// bounds are used
pub fn render_glyph(glyph: &Glyph, font_bbox: [f64; 4]) -> String {
    let bbox = if font_bbox == [0.0; 4] {
        glyph.bounding_box()
    } else {
        BoundingBox::from_corners(font_bbox)
    };

    // nothing drawn and nothing to size the canvas with
    let canvas = if bbox.is_empty() {
        Canvas {
            left: 0.0,
            top: 0.0,
            width: 0.0,
            height: 0.0,
        }
    } else {
        Canvas::new(bbox)
    };

    let mut out = String::new();

    let _ = writeln!(
        out,
        "<svg viewBox='0 0 {} {}' xmlns='http://www.w3.org/2000/svg' version='1.1'>",
        canvas.width, canvas.height
    );
    out.push_str("  <path fill='none' stroke='black' d='\n");

    for command in &glyph.commands {
        out.push_str("    M ");
        write_point(&mut out, canvas.project(command.start()));

        match command {
            PathCommand::Line(line) => {
                out.push_str(" L ");
                write_point(&mut out, canvas.project(line.end));
            }
            PathCommand::Curve(curve) => {
                out.push_str(" C ");
                write_point(&mut out, canvas.project(curve.first_control_point));
                out.push(' ');
                write_point(&mut out, canvas.project(curve.second_control_point));
                out.push(' ');
                write_point(&mut out, canvas.project(curve.end));
            }
        }

        out.push('\n');
    }

    out.push_str("  '/>\n</svg>\n");

    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::{CubicBezierCurve, Line};

    fn glyph(commands: Vec<PathCommand>) -> Glyph {
        Glyph {
            sid: 34,
            name: "A".to_owned(),
            width: 500.0,
            commands,
        }
    }

    #[test]
    fn lines_and_curves() {
        let glyph = glyph(vec![
            PathCommand::Line(Line::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0))),
            PathCommand::Curve(CubicBezierCurve::new(
                Point::new(100.0, 0.0),
                Point::new(0.0, 0.0),
                Point::new(100.0, 50.0),
                Point::new(0.5, 50.0),
            )),
        ]);

        let svg = render_glyph(&glyph, [-50.0, -100.0, 450.0, 800.0]);

        assert_eq!(
            svg,
            "<svg viewBox='0 0 500 900' xmlns='http://www.w3.org/2000/svg' version='1.1'>\n\
             \x20 <path fill='none' stroke='black' d='\n\
             \x20   M 50,800 L 150,800\n\
             \x20   M 150,800 C 150,750 50.5,750 50,800\n\
             \x20 '/>\n\
             </svg>\n"
        );
    }

    #[test]
    fn empty_font_bbox_uses_glyph_bounds() {
        let glyph = glyph(vec![PathCommand::Line(Line::new(
            Point::new(10.0, 20.0),
            Point::new(30.0, 60.0),
        ))]);

        let svg = render_glyph(&glyph, [0.0; 4]);

        assert!(svg.starts_with("<svg viewBox='0 0 20 40'"));
        assert!(svg.contains("M 0,40 L 20,0\n"));
    }

    #[test]
    fn glyph_without_outline() {
        let svg = render_glyph(&glyph(Vec::new()), [0.0; 4]);

        assert!(svg.starts_with("<svg viewBox='0 0 0 0'"));
        assert!(!svg.contains(" M "));
    }
}
