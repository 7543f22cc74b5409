//! Decoding of Compact Font Format fonts stored as PostScript FontSet
//! resources, down to the outline of every glyph

pub use crate::{
    error::{CffError, CffResult, Unsupported},
    font::{decode_batch, decode_file, decode_font, Font, FontBatch, Glyph},
    options::{DecodeOptions, TrailingOperands},
};

pub mod error;
pub mod font;
pub mod geometry;
pub mod options;
pub mod parse_binary;
pub mod render;
