use crate::{
    error::{CffError, CffResult},
    parse_binary::BinaryParser,
};

use super::consts::{EXPERT_CHARSET, EXPERT_SUBSET_CHARSET, ISO_ADOBE_LAST_SID};

/// Maps glyph ids to string ids
#[derive(Debug, Clone, PartialEq)]
pub enum CffCharset {
    IsoAdobe,
    Expert,
    ExpertSubset,
    Zero { name_ids: Vec<u16> },
    One(Vec<CharsetRangeOne>),
    Two(Vec<CharsetRangeTwo>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CharsetRangeOne {
    pub first: u16,
    /// Number of glyphs after `first`
    pub count: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CharsetRangeTwo {
    pub first: u16,
    /// Number of glyphs after `first`
    pub count: u16,
}

impl CffCharset {
    /// Resolves the Top DICT `charset` value: 0 through 2 name a predefined
    /// charset, anything else is an offset to parse from
    pub fn predefined(charset: u32) -> Option<Self> {
        match charset {
            0 => Some(Self::IsoAdobe),
            1 => Some(Self::Expert),
            2 => Some(Self::ExpertSubset),
            _ => None,
        }
    }

    /// Reads a custom charset covering `n_glyphs` glyphs. Glyph 0 is always
    /// `.notdef` and is not stored
    pub fn parse<'a>(parser: &mut impl BinaryParser<'a>, n_glyphs: u16) -> CffResult<Self> {
        let mut remaining = n_glyphs.saturating_sub(1) as usize;

        Ok(match parser.next()? {
            0 => {
                let mut name_ids = Vec::with_capacity(remaining);
                for _ in 0..remaining {
                    name_ids.push(parser.parse_u16()?);
                }

                CffCharset::Zero { name_ids }
            }
            1 => {
                let mut ranges = Vec::new();
                while remaining > 0 {
                    let first = parser.parse_u16()?;
                    let count = parser.next()?;

                    remaining = remaining.saturating_sub(count as usize + 1);

                    ranges.push(CharsetRangeOne { first, count });
                }

                CffCharset::One(ranges)
            }
            2 => {
                let mut ranges = Vec::new();
                while remaining > 0 {
                    let first = parser.parse_u16()?;
                    let count = parser.parse_u16()?;

                    remaining = remaining.saturating_sub(count as usize + 1);

                    ranges.push(CharsetRangeTwo { first, count });
                }

                CffCharset::Two(ranges)
            }
            format => anyhow::bail!(CffError::InvalidCharsetFormat { format }),
        })
    }

    /// Expands the charset into one SID per glyph, starting with `.notdef`.
    /// Ranges running past `n_glyphs` are cut short
    pub fn sids(&self, n_glyphs: u16) -> CffResult<Vec<u16>> {
        let n_glyphs = n_glyphs as usize;

        let predefined: &[u16] = match self {
            Self::IsoAdobe => {
                anyhow::ensure!(
                    n_glyphs <= ISO_ADOBE_LAST_SID as usize + 1,
                    CffError::BrokenCharset("more glyphs than the ISOAdobe charset".into())
                );
                return Ok((0..n_glyphs as u16).collect());
            }
            Self::Expert => &EXPERT_CHARSET,
            Self::ExpertSubset => &EXPERT_SUBSET_CHARSET,
            Self::Zero { name_ids } => {
                let mut sids = Vec::with_capacity(n_glyphs);
                sids.push(0);
                sids.extend_from_slice(name_ids);
                sids.truncate(n_glyphs);
                return Ok(sids);
            }
            Self::One(ranges) => {
                return expand_ranges(
                    ranges.iter().map(|r| (r.first, r.count as u16)),
                    n_glyphs,
                )
            }
            Self::Two(ranges) => {
                return expand_ranges(ranges.iter().map(|r| (r.first, r.count)), n_glyphs)
            }
        };

        anyhow::ensure!(
            n_glyphs <= predefined.len(),
            CffError::BrokenCharset("more glyphs than the predefined charset".into())
        );

        Ok(predefined[..n_glyphs].to_vec())
    }
}

/// Runs past the last glyph are cut short, so only SIDs that are actually
/// assigned need to fit in 16 bits
fn expand_ranges(
    ranges: impl Iterator<Item = (u16, u16)>,
    n_glyphs: usize,
) -> CffResult<Vec<u16>> {
    let mut sids = vec![0];

    for (first, count) in ranges {
        for i in 0..=count as u32 {
            if sids.len() >= n_glyphs {
                break;
            }

            let sid = u16::try_from(first as u32 + i).map_err(|_| {
                CffError::BrokenCharset(
                    format!("range starting at SID {} runs past 65535", first).into(),
                )
            })?;
            sids.push(sid);
        }
    }

    sids.truncate(n_glyphs);
    Ok(sids)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::font::cff::parse::CffParser;

    fn parse(bytes: &[u8], n_glyphs: u16) -> CffResult<Vec<u16>> {
        let mut parser = CffParser::new(bytes);
        CffCharset::parse(&mut parser, n_glyphs)?.sids(n_glyphs)
    }

    #[test]
    fn format_zero() {
        let sids = parse(&[0, 0, 34, 0, 35, 1, 0x87], 4).unwrap();

        assert_eq!(sids, [0, 34, 35, 391]);
    }

    #[test]
    fn format_one_expands_runs() {
        let sids = parse(&[1, 0, 34, 2, 0, 66, 0], 5).unwrap();

        assert_eq!(sids, [0, 34, 35, 36, 66]);
    }

    #[test]
    fn format_two_truncates_overshoot() {
        let sids = parse(&[2, 0, 10, 0, 9], 4).unwrap();

        assert_eq!(sids, [0, 10, 11, 12]);
    }

    #[test]
    fn range_past_last_sid() {
        let sids = parse(&[2, 0xff, 0xfe, 0, 5], 3).unwrap();
        assert_eq!(sids, [0, 65534, 65535]);

        let err = parse(&[2, 0xff, 0xfe, 0, 5], 4).unwrap_err();
        assert!(matches!(
            CffError::find(&err),
            Some(CffError::BrokenCharset(..))
        ));
    }

    #[test]
    fn single_glyph_reads_only_format() {
        let mut parser = CffParser::new(&[1]);
        let charset = CffCharset::parse(&mut parser, 1).unwrap();

        assert_eq!(charset.sids(1).unwrap(), [0]);
        assert_eq!(parser.cursor(), 1);
    }

    #[test]
    fn invalid_format() {
        let err = parse(&[3, 0, 0], 2).unwrap_err();

        assert_eq!(
            CffError::find(&err),
            Some(&CffError::InvalidCharsetFormat { format: 3 })
        );
    }

    #[test]
    fn predefined_charsets() {
        assert_eq!(CffCharset::IsoAdobe.sids(3).unwrap(), [0, 1, 2]);
        assert_eq!(CffCharset::Expert.sids(3).unwrap(), [0, 1, 229]);
        assert_eq!(CffCharset::ExpertSubset.sids(3).unwrap(), [0, 1, 231]);
        assert!(CffCharset::ExpertSubset.sids(88).is_err());
    }

    #[test]
    fn truncated_charset() {
        let err = parse(&[0, 0, 34], 3).unwrap_err();

        assert_eq!(CffError::find(&err), Some(&CffError::UnexpectedEndOfData));
    }
}
