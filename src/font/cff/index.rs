use crate::{
    error::{CffError, CffResult},
    parse_binary::BinaryParser,
};

use super::Offsize;

/// An ordered sequence of variable-length byte blobs behind an offset table
#[derive(Debug, Clone)]
pub struct CffIndex<'a> {
    pub count: u16,
    pub offsize: Offsize,
    /// `count + 1` offsets, 1-based relative to the byte preceding `data`
    pub offset: Vec<u32>,
    pub data: &'a [u8],
}

impl<'a> CffIndex<'a> {
    pub const fn empty() -> Self {
        Self {
            count: 0,
            offsize: 0,
            offset: Vec::new(),
            data: &[],
        }
    }

    /// Reads an INDEX at the parser's cursor, leaving the cursor just past it.
    ///
    /// An INDEX with a count of zero is only the two count bytes.
    pub fn parse(parser: &mut impl BinaryParser<'a>) -> CffResult<Self> {
        let count = parser.parse_u16()?;

        if count == 0 {
            return Ok(Self::empty());
        }

        let offsize = parser.next()?;
        let mut offset = Vec::with_capacity(count as usize + 1);

        for _ in 0..=count {
            offset.push(parser.parse_offset(offsize)?);
        }

        if offset[0] != 1 {
            anyhow::bail!(CffError::BrokenIndex("first offset must be 1".into()));
        }

        if offset.windows(2).any(|w| w[0] > w[1]) {
            anyhow::bail!(CffError::BrokenIndex("offsets are not ascending".into()));
        }

        let len = offset[count as usize] as usize - 1;
        let data = parser.parse_slice(len)?;

        Ok(Self {
            count,
            offsize,
            offset,
            data,
        })
    }

    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn iter(&self) -> CffIndexIterator<'a, '_> {
        CffIndexIterator::new(self)
    }

    pub fn get(&self, idx: usize) -> Option<&'a [u8]> {
        if idx >= self.len() {
            return None;
        }

        let start = self.offset[idx] as usize;
        let end = self.offset[idx + 1] as usize;

        self.data.get(start - 1..end - 1)
    }
}

#[derive(Debug)]
pub struct CffIndexIterator<'a, 'b> {
    index: &'b CffIndex<'a>,
    cursor: usize,
}

impl<'a, 'b> CffIndexIterator<'a, 'b> {
    pub fn new(index: &'b CffIndex<'a>) -> Self {
        Self { index, cursor: 0 }
    }
}

impl<'a, 'b> Iterator for CffIndexIterator<'a, 'b> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.index.get(self.cursor)?;
        self.cursor += 1;
        Some(n)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::font::cff::{parse::CffParser, test_util::encode_index};

    #[test]
    fn reads_every_blob_with_its_length() {
        let blobs: [&[u8]; 3] = [b"abc", b"", b"defgh"];
        let mut bytes = encode_index(&blobs);
        bytes.extend_from_slice(b"tail");

        let mut parser = CffParser::new(&bytes);
        let index = CffIndex::parse(&mut parser).unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(index.iter().collect::<Vec<_>>(), blobs);
        assert_eq!(&bytes[parser.cursor()..], b"tail");
    }

    #[test]
    fn empty_index_is_two_bytes() {
        let bytes = [0, 0, 0xff, 0xff];
        let mut parser = CffParser::new(&bytes);

        let index = CffIndex::parse(&mut parser).unwrap();

        assert!(index.is_empty());
        assert_eq!(parser.cursor(), 2);
    }

    #[test]
    fn four_byte_offsets() {
        let bytes = [0, 1, 4, 0, 0, 0, 1, 0, 0, 0, 3, b'h', b'i'];
        let mut parser = CffParser::new(&bytes);

        let index = CffIndex::parse(&mut parser).unwrap();

        assert_eq!(index.get(0), Some(&b"hi"[..]));
        assert_eq!(index.get(1), None);
    }

    #[test]
    fn truncated_data() {
        let bytes = [0, 1, 1, 1, 10, b'x'];
        let mut parser = CffParser::new(&bytes);

        let err = CffIndex::parse(&mut parser).unwrap_err();

        assert_eq!(CffError::find(&err), Some(&CffError::UnexpectedEndOfData));
    }

    #[test]
    fn invalid_offsize() {
        let bytes = [0, 1, 5, 0, 0, 0, 0, 1];
        let mut parser = CffParser::new(&bytes);

        let err = CffIndex::parse(&mut parser).unwrap_err();

        assert_eq!(
            CffError::find(&err),
            Some(&CffError::InvalidOffsetSize { off_size: 5 })
        );
    }

    #[test]
    fn descending_offsets() {
        let bytes = [0, 2, 1, 1, 3, 2, b'a', b'b'];
        let mut parser = CffParser::new(&bytes);

        let err = CffIndex::parse(&mut parser).unwrap_err();

        assert!(matches!(
            CffError::find(&err),
            Some(CffError::BrokenIndex(..))
        ));
    }
}
