use crate::error::{CffError, CffResult};

/// Generic trait for parsing big-endian binary formats
pub trait BinaryParser<'a> {
    fn buffer(&self) -> &'a [u8];
    fn cursor(&self) -> usize;
    fn cursor_mut(&mut self) -> &mut usize;

    fn next(&mut self) -> CffResult<u8> {
        let b = self.buffer().get(self.cursor()).copied();
        if b.is_some() {
            *self.cursor_mut() += 1;
        }
        b.ok_or_else(|| CffError::UnexpectedEndOfData.into())
    }

    fn peek(&mut self) -> Option<u8> {
        self.buffer().get(self.cursor()).copied()
    }

    fn parse_u16(&mut self) -> CffResult<u16> {
        let b1 = self.next()?;
        let b2 = self.next()?;

        Ok(u16::from_be_bytes([b1, b2]))
    }

    fn parse_i16(&mut self) -> CffResult<i16> {
        let b1 = self.next()?;
        let b2 = self.next()?;

        Ok(i16::from_be_bytes([b1, b2]))
    }

    fn parse_u32(&mut self) -> CffResult<u32> {
        let b1 = self.next()?;
        let b2 = self.next()?;
        let b3 = self.next()?;
        let b4 = self.next()?;

        Ok(u32::from_be_bytes([b1, b2, b3, b4]))
    }

    fn parse_i32(&mut self) -> CffResult<i32> {
        Ok(self.parse_u32()? as i32)
    }

    /// Reads a CFF `Offset` of `off_size` bytes (1 through 4)
    fn parse_offset(&mut self, off_size: u8) -> CffResult<u32> {
        if !(1..=4).contains(&off_size) {
            anyhow::bail!(CffError::InvalidOffsetSize { off_size });
        }

        let mut offset = 0;
        for _ in 0..off_size {
            offset = (offset << 8) | self.next()? as u32;
        }

        Ok(offset)
    }

    /// Returns the next `len` bytes, advancing past them
    fn parse_slice(&mut self, len: usize) -> CffResult<&'a [u8]> {
        let start = self.cursor();
        let end = start
            .checked_add(len)
            .ok_or(CffError::UnexpectedEndOfData)?;
        let slice = self
            .buffer()
            .get(start..end)
            .ok_or(CffError::UnexpectedEndOfData)?;

        *self.cursor_mut() = end;

        Ok(slice)
    }

    /// Decodes the single- and two-byte integer encodings shared by DICT data
    /// and Type 2 charstrings, given a leading byte in `32..=254`
    fn parse_short_int(&mut self, b0: u8) -> CffResult<i32> {
        Ok(match b0 {
            32..=246 => b0 as i32 - 139,
            247..=250 => {
                let b1 = self.next()? as i32;
                (b0 as i32 - 247) * 256 + b1 + 108
            }
            251..=254 => {
                let b1 = self.next()? as i32;
                -(b0 as i32 - 251) * 256 - b1 - 108
            }
            _ => unreachable!("not a short integer lead byte: {}", b0),
        })
    }
}
