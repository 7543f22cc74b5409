/// What to do with operands still on the stack when a glyph ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailingOperands {
    /// Log a warning and discard them
    #[default]
    Ignore,

    /// Fail the glyph
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    pub trailing_operands: TrailingOperands,

    /// Leave out glyphs using unsupported charstring features instead of
    /// failing the whole font
    pub skip_unsupported_glyphs: bool,

    /// Deepest allowed nesting of subroutine calls
    pub max_subr_depth: usize,
}

impl DecodeOptions {
    /// Fails on anything the decoder would otherwise tolerate
    pub fn strict() -> Self {
        Self {
            trailing_operands: TrailingOperands::Reject,
            ..Self::default()
        }
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            trailing_operands: TrailingOperands::Ignore,
            skip_unsupported_glyphs: false,
            max_subr_depth: 10,
        }
    }
}
