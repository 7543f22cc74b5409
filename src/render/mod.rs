pub use self::svg::render_glyph;

mod svg;

/// Characters of a font name that are replaced when it becomes a directory
/// name
const NAME_PUNCTUATION: &[char] = &[
    '-', '!', '"', '#', '$', '&', '\'', '*', '+', ',', '.', ':', ';', '=', '?', '@', '^', '`',
    '|', ' ',
];

/// A font's full name with punctuation and spaces replaced by `_`
pub fn sanitize_font_name(name: &str) -> String {
    name.replace(NAME_PUNCTUATION, "_")
}

/// File stem for a glyph's SVG. Glyph names such as `.notdef` and `f_f.alt`
/// keep their letters but lose the dots, and nothing can escape the output
/// directory
pub fn glyph_file_stem(name: &str) -> String {
    name.replace(['.', '/', '\\'], "_")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn font_names() {
        assert_eq!(sanitize_font_name("Minion Pro-Bold"), "Minion_Pro_Bold");
        assert_eq!(sanitize_font_name("A.B:C;D=E?F@G^H`I|J"), "A_B_C_D_E_F_G_H_I_J");
        assert_eq!(sanitize_font_name("Times (Roman)"), "Times_(Roman)");
    }

    #[test]
    fn glyph_names() {
        assert_eq!(glyph_file_stem(".notdef"), "_notdef");
        assert_eq!(glyph_file_stem("f_f.alt"), "f_f_alt");
        assert_eq!(glyph_file_stem("../x"), "___x");
        assert_eq!(glyph_file_stem("A"), "A");
    }
}
