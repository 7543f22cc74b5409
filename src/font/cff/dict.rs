use crate::{
    error::{CffError, CffResult, Unsupported},
    parse_binary::BinaryParser,
};

#[derive(Debug, Clone, PartialEq)]
pub struct TopDict {
    pub version: Option<u16>,
    pub notice: Option<u16>,
    pub copyright: Option<u16>,
    pub full_name: Option<u16>,
    pub family_name: Option<u16>,
    pub weight: Option<u16>,
    pub is_fixed_pitch: bool,
    pub italic_angle: f64,
    pub underline_position: f64,
    pub underline_thickness: f64,
    pub paint_type: f64,
    pub charstring_type: u32,
    pub font_matrix: [f64; 6],
    pub unique_id: Option<f64>,
    pub font_b_box: [f64; 4],
    pub stroke_width: f64,
    pub xuid: Option<Vec<f64>>,
    pub charset: u32,
    pub encoding: u32,
    pub char_strings: Option<u32>,
    /// Private DICT size and offset
    pub private: Option<(u32, u32)>,
    pub synthetic_base: Option<f64>,
    pub post_script: Option<u16>,
    pub base_font_name: Option<u16>,
    pub base_font_blend: Option<Vec<f64>>,
}

impl Default for TopDict {
    fn default() -> Self {
        TopDict {
            version: None,
            notice: None,
            copyright: None,
            full_name: None,
            family_name: None,
            weight: None,
            is_fixed_pitch: false,
            italic_angle: 0.0,
            underline_position: -100.0,
            underline_thickness: 50.0,
            paint_type: 0.0,
            charstring_type: 2,
            font_matrix: [0.001, 0.0, 0.0, 0.001, 0.0, 0.0],
            unique_id: None,
            font_b_box: [0.0, 0.0, 0.0, 0.0],
            stroke_width: 0.0,
            xuid: None,
            charset: 0,
            encoding: 0,
            char_strings: None,
            private: None,
            synthetic_base: None,
            post_script: None,
            base_font_name: None,
            base_font_blend: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrivateDict {
    pub blue_values: Option<Vec<f64>>,
    pub other_blues: Option<Vec<f64>>,
    pub family_blues: Option<Vec<f64>>,
    pub family_other_blues: Option<Vec<f64>>,
    pub blue_scale: f64,
    pub blue_shift: f64,
    pub blue_fuzz: f64,
    pub std_hw: Option<f64>,
    pub std_vw: Option<f64>,
    pub stem_snap_h: Option<Vec<f64>>,
    pub stem_snap_v: Option<Vec<f64>>,
    pub force_bold: bool,
    pub language_group: f64,
    pub expansion_factor: f64,
    pub initial_random_seed: f64,
    /// Offset of the local subroutine INDEX, relative to the Private DICT
    pub subrs: Option<u32>,
    pub default_width_x: f64,
    pub nominal_width_x: f64,
}

impl Default for PrivateDict {
    fn default() -> Self {
        PrivateDict {
            blue_values: None,
            other_blues: None,
            family_blues: None,
            family_other_blues: None,
            blue_scale: 0.039625,
            blue_shift: 7.0,
            blue_fuzz: 1.0,
            std_hw: None,
            std_vw: None,
            stem_snap_h: None,
            stem_snap_v: None,
            force_bold: false,
            language_group: 0.0,
            expansion_factor: 0.06,
            initial_random_seed: 0.0,
            subrs: None,
            default_width_x: 0.0,
            nominal_width_x: 0.0,
        }
    }
}

pub(crate) struct CffDictInterpreter<'a> {
    buffer: &'a [u8],
    cursor: usize,
    operand_stack: Vec<f64>,
}

impl<'a> CffDictInterpreter<'a> {
    fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            cursor: 0,
            operand_stack: Vec::new(),
        }
    }

    fn push(&mut self, n: f64) {
        self.operand_stack.push(n);
    }

    /// Pops the single operand of a scalar key
    fn pop(&mut self) -> CffResult<f64> {
        let [n] = self.pop_arr::<1>()?;
        Ok(n)
    }

    /// Pops exactly `N` operands, in the order they were pushed
    fn pop_arr<const N: usize>(&mut self) -> CffResult<[f64; N]> {
        let operands = std::mem::take(&mut self.operand_stack);
        let found = operands.len();

        operands.try_into().map_err(|_| {
            CffError::broken_dict(format!("expected {} operands, found {}", N, found)).into()
        })
    }

    /// Pops every operand of a delta-encoded array. Each element after the
    /// first is the previous element minus the next operand
    fn pop_delta(&mut self) -> Vec<f64> {
        let mut deltas = Vec::with_capacity(self.operand_stack.len());

        for operand in std::mem::take(&mut self.operand_stack) {
            let next = match deltas.last() {
                Some(prev) => prev - operand,
                None => operand,
            };
            deltas.push(next);
        }

        deltas
    }

    fn pop_bool(&mut self) -> CffResult<bool> {
        Ok(self.pop()? != 0.0)
    }

    fn pop_u16(&mut self) -> CffResult<u16> {
        let n = self.pop()?;

        anyhow::ensure!(
            n >= 0.0 && n <= u16::MAX as f64 && n.fract() == 0.0,
            CffError::broken_dict(format!("expected a string id, found {}", n))
        );

        Ok(n as u16)
    }

    fn pop_u32(&mut self) -> CffResult<u32> {
        let n = self.pop()?;
        as_offset(n)
    }

    fn pop_private(&mut self) -> CffResult<(u32, u32)> {
        let [size, offset] = self.pop_arr()?;
        Ok((as_offset(size)?, as_offset(offset)?))
    }

    fn parse_number(&mut self, b0: u8) -> CffResult<()> {
        match b0 {
            28 => {
                let n = self.parse_i16()?;
                self.push(n as f64);
            }
            29 => {
                let n = self.parse_i32()?;
                self.push(n as f64);
            }
            30 => {
                let n = self.parse_real()?;
                self.push(n);
            }
            32..=254 => {
                let n = self.parse_short_int(b0)?;
                self.push(n as f64);
            }
            _ => anyhow::bail!(CffError::UnknownOperator { b0, b1: None }),
        }

        Ok(())
    }

    /// Reads a nibble-encoded real number, after its leading `30` byte
    fn parse_real(&mut self) -> CffResult<f64> {
        let mut s = String::new();

        'bytes: loop {
            let b = self.next()?;

            for nibble in [b >> 4, b & 0xf] {
                match nibble {
                    0..=9 => s.push((b'0' + nibble) as char),
                    10 => s.push('.'),
                    11 => s.push('E'),
                    12 => s.push_str("E-"),
                    14 => s.push('-'),
                    15 => break 'bytes,
                    _ => anyhow::bail!(CffError::ReservedNibble { nibble }),
                }
            }
        }

        s.parse()
            .map_err(|_| CffError::broken_dict(format!("malformed real number {:?}", s)).into())
    }

    fn finish(&self) -> CffResult<()> {
        anyhow::ensure!(
            self.operand_stack.is_empty(),
            CffError::broken_dict(format!(
                "{} operands left without a key",
                self.operand_stack.len()
            ))
        );

        Ok(())
    }

    pub fn parse_top_dict(buffer: &'a [u8]) -> CffResult<TopDict> {
        let mut parser = Self::new(buffer);
        let mut dict = TopDict::default();

        while parser.peek().is_some() {
            match parser.next()? {
                0 => dict.version = Some(parser.pop_u16()?),
                1 => dict.notice = Some(parser.pop_u16()?),
                2 => dict.full_name = Some(parser.pop_u16()?),
                3 => dict.family_name = Some(parser.pop_u16()?),
                4 => dict.weight = Some(parser.pop_u16()?),
                5 => dict.font_b_box = parser.pop_arr()?,
                12 => match parser.next()? {
                    0 => dict.copyright = Some(parser.pop_u16()?),
                    1 => dict.is_fixed_pitch = parser.pop_bool()?,
                    2 => dict.italic_angle = parser.pop()?,
                    3 => dict.underline_position = parser.pop()?,
                    4 => dict.underline_thickness = parser.pop()?,
                    5 => dict.paint_type = parser.pop()?,
                    6 => dict.charstring_type = parser.pop_u32()?,
                    7 => dict.font_matrix = parser.pop_arr()?,
                    8 => dict.stroke_width = parser.pop()?,
                    20 => dict.synthetic_base = Some(parser.pop()?),
                    21 => dict.post_script = Some(parser.pop_u16()?),
                    22 => dict.base_font_name = Some(parser.pop_u16()?),
                    23 => dict.base_font_blend = Some(parser.pop_delta()),
                    op @ 30..=38 => {
                        anyhow::bail!(CffError::UnsupportedFeature(Unsupported::CidKeyedFont {
                            op
                        }))
                    }
                    b1 => anyhow::bail!(CffError::UnknownOperator { b0: 12, b1: Some(b1) }),
                },
                13 => dict.unique_id = Some(parser.pop()?),
                14 => dict.xuid = Some(parser.pop_delta()),
                15 => dict.charset = parser.pop_u32()?,
                16 => dict.encoding = parser.pop_u32()?,
                17 => dict.char_strings = Some(parser.pop_u32()?),
                18 => dict.private = Some(parser.pop_private()?),
                b0 @ 0..=21 => anyhow::bail!(CffError::UnknownOperator { b0, b1: None }),
                b0 => parser.parse_number(b0)?,
            }
        }

        parser.finish()?;

        if dict.charstring_type != 2 {
            anyhow::bail!(CffError::UnsupportedFeature(
                Unsupported::CharstringType(dict.charstring_type)
            ));
        }

        Ok(dict)
    }

    pub fn parse_private_dict(buffer: &'a [u8]) -> CffResult<PrivateDict> {
        let mut parser = Self::new(buffer);
        let mut dict = PrivateDict::default();

        while parser.peek().is_some() {
            match parser.next()? {
                6 => dict.blue_values = Some(parser.pop_delta()),
                7 => dict.other_blues = Some(parser.pop_delta()),
                8 => dict.family_blues = Some(parser.pop_delta()),
                9 => dict.family_other_blues = Some(parser.pop_delta()),
                10 => dict.std_hw = Some(parser.pop()?),
                11 => dict.std_vw = Some(parser.pop()?),
                12 => match parser.next()? {
                    9 => dict.blue_scale = parser.pop()?,
                    10 => dict.blue_shift = parser.pop()?,
                    11 => dict.blue_fuzz = parser.pop()?,
                    12 => dict.stem_snap_h = Some(parser.pop_delta()),
                    13 => dict.stem_snap_v = Some(parser.pop_delta()),
                    14 => dict.force_bold = parser.pop_bool()?,
                    17 => dict.language_group = parser.pop()?,
                    18 => dict.expansion_factor = parser.pop()?,
                    19 => dict.initial_random_seed = parser.pop()?,
                    b1 => anyhow::bail!(CffError::UnknownOperator { b0: 12, b1: Some(b1) }),
                },
                19 => dict.subrs = Some(parser.pop_u32()?),
                20 => dict.default_width_x = parser.pop()?,
                21 => dict.nominal_width_x = parser.pop()?,
                b0 @ 0..=21 => anyhow::bail!(CffError::UnknownOperator { b0, b1: None }),
                b0 => parser.parse_number(b0)?,
            }
        }

        parser.finish()?;

        Ok(dict)
    }
}

fn as_offset(n: f64) -> CffResult<u32> {
    anyhow::ensure!(
        n >= 0.0 && n <= u32::MAX as f64 && n.fract() == 0.0,
        CffError::broken_dict(format!("expected an offset, found {}", n))
    );

    Ok(n as u32)
}

impl<'a> BinaryParser<'a> for CffDictInterpreter<'a> {
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
