use anyhow::Context;

use crate::{
    error::{CffError, CffResult},
    parse_binary::BinaryParser,
};

use super::{dict::CffDictInterpreter, CffCharset, CffFile, CffHeader, CffIndex};

/// Precedes the CFF data in a PostScript FontSet resource
const START_DATA: &[u8] = b"StartData";

pub struct CffParser<'a> {
    buffer: &'a [u8],
    cursor: usize,
}

impl<'a> CffParser<'a> {
    /// A parser over bare CFF data, starting at the header
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, cursor: 0 }
    }

    /// A parser over the CFF data embedded in a FontSet resource, which starts
    /// one byte (the separating whitespace) after the `StartData` marker.
    /// Offsets in the font are relative to that point
    pub fn from_font_set(file: &'a [u8]) -> CffResult<Self> {
        let marker = file
            .windows(START_DATA.len())
            .position(|window| window == START_DATA)
            .ok_or(CffError::MarkerNotFound)?;

        let data_begin = marker + START_DATA.len() + 1;
        log::debug!("CFF data begins at byte {}", data_begin);

        Ok(Self::new(file.get(data_begin..).unwrap_or_default()))
    }

    pub fn parse(&mut self) -> CffResult<CffFile<'a>> {
        let header = self.parse_header()?;
        self.cursor = header.header_size as usize;

        let name_index = CffIndex::parse(self).context("reading the Name INDEX")?;
        let top_dict_index = CffIndex::parse(self).context("reading the Top DICT INDEX")?;

        if top_dict_index.len() > 1 {
            log::warn!(
                "font set holds {} fonts, only the first is decoded",
                top_dict_index.len()
            );
        }

        let top_dict_data = top_dict_index
            .get(0)
            .ok_or_else(|| CffError::BrokenIndex("the Top DICT INDEX is empty".into()))?;
        let top_dict =
            CffDictInterpreter::parse_top_dict(top_dict_data).context("reading the Top DICT")?;

        let string_index = CffIndex::parse(self).context("reading the String INDEX")?;
        let global_subr_index =
            CffIndex::parse(self).context("reading the global subroutines")?;

        let char_strings = top_dict.char_strings.ok_or(CffError::MissingCharStrings)?;
        self.cursor = char_strings as usize;
        let charstring_index = CffIndex::parse(self).context("reading the CharStrings INDEX")?;

        log::debug!(
            "{} glyphs, {} strings, {} global subroutines",
            charstring_index.len(),
            string_index.len(),
            global_subr_index.len()
        );

        let charset = match CffCharset::predefined(top_dict.charset) {
            Some(charset) => charset,
            None => {
                self.cursor = top_dict.charset as usize;
                CffCharset::parse(self, charstring_index.count).context("reading the charset")?
            }
        };

        let mut private_dict = None;
        let mut local_subr_index = None;

        if let Some((size, offset)) = top_dict.private {
            self.cursor = offset as usize;
            let data = self.parse_slice(size as usize)?;
            let private = CffDictInterpreter::parse_private_dict(data)
                .context("reading the Private DICT")?;

            // relative to the start of the Private DICT
            if let Some(subrs) = private.subrs {
                self.cursor = offset as usize + subrs as usize;
                local_subr_index =
                    Some(CffIndex::parse(self).context("reading the local subroutines")?);
            }

            private_dict = Some(private);
        }

        Ok(CffFile {
            header,
            name_index,
            top_dict,
            string_index,
            global_subr_index,
            charstring_index,
            charset,
            private_dict,
            local_subr_index,
        })
    }

    fn parse_header(&mut self) -> CffResult<CffHeader> {
        let major = self.next()?;
        let minor = self.next()?;
        let header_size = self.next()?;
        let off_size = self.next()?;

        if major != 1 {
            anyhow::bail!(CffError::UnsupportedVersion { major });
        }

        if header_size != 4 {
            anyhow::bail!(CffError::UnsupportedHeaderSize { header_size });
        }

        Ok(CffHeader {
            major,
            minor,
            header_size,
            off_size,
        })
    }
}

impl<'a> BinaryParser<'a> for CffParser<'a> {
    fn buffer(&self) -> &'a [u8] {
        self.buffer
    }
    fn cursor(&self) -> usize {
        self.cursor
    }
    fn cursor_mut(&mut self) -> &mut usize {
        &mut self.cursor
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::font::cff::{
        test_util::{encode_charstring, encode_dict_int, encode_index, Cs, FontBuilder},
        tokenizer::Operator,
    };

    fn parse(file: &[u8]) -> CffResult<CffFile> {
        CffParser::from_font_set(file)?.parse()
    }

    fn font_set(cff: &[u8]) -> Vec<u8> {
        let mut file = b"/Test StartData ".to_vec();
        file.extend_from_slice(cff);
        file
    }

    #[test]
    fn reads_every_structure() {
        let builder = FontBuilder {
            strings: vec![b"Test-Regular".to_vec(), b"alpha".to_vec()],
            global_subrs: vec![encode_charstring(&[Cs::Op(Operator::Return)])],
            char_strings: vec![
                encode_charstring(&[Cs::Op(Operator::EndChar)]),
                encode_charstring(&[Cs::Op(Operator::EndChar)]),
            ],
            charset: Some(vec![0, 0x01, 0x88]),
            private_dict: Some([encode_dict_int(-30), vec![21]].concat()),
            local_subrs: vec![encode_charstring(&[Cs::Op(Operator::Return)]); 3],
            top_dict: [encode_dict_int(391), vec![2]].concat(),
            ..FontBuilder::default()
        };
        let file = builder.build();

        let cff = parse(&file).unwrap();

        assert_eq!(cff.header.major, 1);
        assert_eq!(cff.name_index.get(0), Some(&b"TestFont"[..]));
        assert_eq!(cff.top_dict.full_name, Some(391));
        assert_eq!(cff.string_index.len(), 2);
        assert_eq!(cff.global_subr_index.len(), 1);
        assert_eq!(cff.charstring_index.len(), 2);
        assert_eq!(cff.charset.sids(2).unwrap(), [0, 392]);
        assert_eq!(cff.private_dict.unwrap().nominal_width_x, -30.0);
        assert_eq!(cff.local_subr_index.unwrap().len(), 3);
    }

    #[test]
    fn predefined_charset_and_no_private_dict() {
        let builder = FontBuilder {
            private_dict: None,
            ..FontBuilder::default()
        };
        let file = builder.build();

        let cff = parse(&file).unwrap();

        assert_eq!(cff.charset, CffCharset::IsoAdobe);
        assert!(cff.private_dict.is_none());
        assert!(cff.local_subr_index.is_none());
    }

    #[test]
    fn missing_marker() {
        let cff = FontBuilder::default().build_cff();

        let err = parse(&cff).unwrap_err();

        assert_eq!(CffError::find(&err), Some(&CffError::MarkerNotFound));
    }

    #[test]
    fn header_checks() {
        let mut cff = FontBuilder::default().build_cff();
        cff[0] = 2;
        let err = parse(&font_set(&cff)).unwrap_err();
        assert_eq!(
            CffError::find(&err),
            Some(&CffError::UnsupportedVersion { major: 2 })
        );

        let mut cff = FontBuilder::default().build_cff();
        cff[2] = 5;
        let err = parse(&font_set(&cff)).unwrap_err();
        assert_eq!(
            CffError::find(&err),
            Some(&CffError::UnsupportedHeaderSize { header_size: 5 })
        );
    }

    #[test]
    fn missing_char_strings() {
        let mut cff = vec![1, 0, 4, 1];
        cff.extend(encode_index(&[&b"NoGlyphs"[..]]));
        cff.extend(encode_index(&[&[][..]]));
        cff.extend(encode_index(&[]));
        cff.extend(encode_index(&[]));

        let err = parse(&font_set(&cff)).unwrap_err();

        assert_eq!(CffError::find(&err), Some(&CffError::MissingCharStrings));
    }

    #[test]
    fn truncated_file() {
        let cff = FontBuilder::default().build_cff();
        let file = font_set(&cff[..cff.len() - 3]);

        let err = parse(&file).unwrap_err();

        assert_eq!(CffError::find(&err), Some(&CffError::UnexpectedEndOfData));
    }
}
