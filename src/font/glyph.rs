use crate::geometry::{BoundingBox, PathCommand};

#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    /// String id of the glyph name
    pub sid: u16,
    pub name: String,
    /// Advance width in font units
    pub width: f64,
    /// Segments in drawing order
    pub commands: Vec<PathCommand>,
}

impl Glyph {
    /// Bounds of the drawn outline. Empty for a glyph with no outline, such
    /// as `space`
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox::new();

        for command in &self.commands {
            bbox.merge(command.bounding_box());
        }

        bbox
    }
}
