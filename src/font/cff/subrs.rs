use crate::error::{CffError, CffResult};

use super::CffIndex;

/// Global or local subroutines of a font, called by biased index
#[derive(Debug, Clone)]
pub struct SubroutineTable {
    programs: Vec<Vec<u8>>,
    bias: i32,
}

impl SubroutineTable {
    pub fn new(programs: Vec<Vec<u8>>) -> Self {
        let bias = Self::bias_for_len(programs.len());

        Self { programs, bias }
    }

    pub fn from_index(index: &CffIndex) -> Self {
        Self::new(index.iter().map(<[u8]>::to_vec).collect())
    }

    /// Keeps the operands of `callsubr` small: the index written in a
    /// charstring is the subroutine number minus this bias
    pub const fn bias_for_len(len: usize) -> i32 {
        if len < 1240 {
            107
        } else if len < 33900 {
            1131
        } else {
            32768
        }
    }

    pub fn bias(&self) -> i32 {
        self.bias
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Resolves the operand of `callsubr` or `callgsubr`
    pub fn get(&self, operand: f64) -> CffResult<&[u8]> {
        let idx = operand.trunc() as i64 + self.bias as i64;

        usize::try_from(idx)
            .ok()
            .and_then(|idx| self.programs.get(idx))
            .map(Vec::as_slice)
            .ok_or_else(|| {
                CffError::broken_glyph(format!(
                    "subroutine {} out of range ({} subroutines)",
                    idx,
                    self.programs.len()
                ))
                .into()
            })
    }
}

impl Default for SubroutineTable {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::font::cff::{parse::CffParser, test_util::encode_index};

    #[test]
    fn bias_thresholds() {
        assert_eq!(SubroutineTable::bias_for_len(0), 107);
        assert_eq!(SubroutineTable::bias_for_len(1239), 107);
        assert_eq!(SubroutineTable::bias_for_len(1240), 1131);
        assert_eq!(SubroutineTable::bias_for_len(33899), 1131);
        assert_eq!(SubroutineTable::bias_for_len(33900), 32768);
    }

    #[test]
    fn operands_are_biased() {
        let bytes = encode_index(&[&[11][..], &[139, 11][..]]);
        let mut parser = CffParser::new(&bytes);
        let subrs = SubroutineTable::from_index(&CffIndex::parse(&mut parser).unwrap());

        assert_eq!(subrs.len(), 2);
        assert_eq!(subrs.get(-107.0).unwrap(), [11]);
        assert_eq!(subrs.get(-106.0).unwrap(), [139, 11]);

        for operand in [-108.0, -105.0, 0.0] {
            let err = subrs.get(operand).unwrap_err();
            assert!(matches!(
                CffError::find(&err),
                Some(CffError::BrokenGlyph(..))
            ));
        }
    }

    #[test]
    fn large_tables_use_larger_bias() {
        let programs = vec![vec![11]; 1240];
        let blobs: Vec<&[u8]> = programs.iter().map(Vec::as_slice).collect();
        let bytes = encode_index(&blobs);
        let mut parser = CffParser::new(&bytes);
        let subrs = SubroutineTable::from_index(&CffIndex::parse(&mut parser).unwrap());

        assert_eq!(subrs.bias(), 1131);
        assert!(subrs.get(-1131.0).is_ok());
        assert!(subrs.get(108.0).is_ok());
        assert!(subrs.get(109.0).is_err());
    }
}
