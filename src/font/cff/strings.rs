use crate::error::{CffError, CffResult};

use super::{
    consts::{N_STANDARD_STRINGS, STANDARD_STRINGS},
    CffIndex,
};

/// Resolves string ids: the standard strings first, then the strings of the
/// font's String INDEX
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    custom: Vec<String>,
}

impl StringTable {
    pub fn new(string_index: &CffIndex) -> Self {
        // CFF strings are ASCII in practice and Latin-1 by definition
        let custom = string_index
            .iter()
            .map(|s| s.iter().map(|&b| b as char).collect())
            .collect();

        Self { custom }
    }

    pub fn get(&self, sid: u16) -> CffResult<&str> {
        let sid_idx = sid as usize;

        let s = match STANDARD_STRINGS.get(sid_idx) {
            Some(s) => Some(*s),
            None => self
                .custom
                .get(sid_idx - N_STANDARD_STRINGS)
                .map(String::as_str),
        };

        s.ok_or_else(|| CffError::UnknownStringId { sid }.into())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::font::cff::{parse::CffParser, test_util::encode_index};

    #[test]
    fn standard_then_custom() {
        let bytes = encode_index(&[&b"MyFont-Regular"[..], &b"caf\xe9"[..]]);
        let mut parser = CffParser::new(&bytes);
        let strings = StringTable::new(&CffIndex::parse(&mut parser).unwrap());

        assert_eq!(strings.get(0).unwrap(), ".notdef");
        assert_eq!(strings.get(34).unwrap(), "A");
        assert_eq!(strings.get(390).unwrap(), "Semibold");
        assert_eq!(strings.get(391).unwrap(), "MyFont-Regular");
        assert_eq!(strings.get(392).unwrap(), "café");

        let err = strings.get(393).unwrap_err();
        assert_eq!(
            CffError::find(&err),
            Some(&CffError::UnknownStringId { sid: 393 })
        );
    }
}
