use std::fmt;

use fixed::{types::extra::U16, FixedU32};

use crate::{
    error::{CffError, CffResult},
    parse_binary::BinaryParser,
};

/// Operand of the `255` charstring encoding: the high word is the integer
/// part and the low word the fraction
pub type F16Dot16 = FixedU32<U16>;

/// Escape byte introducing a two-byte operator
const ESCAPE: u8 = 12;

/// Type 2 charstring operator
///
/// See <https://adobe-type-tools.github.io/font-tech-notes/pdfs/5177.Type2.pdf#page=31>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    HStem,
    VStem,
    VMoveTo,
    RLineTo,
    HLineTo,
    VLineTo,
    RrCurveTo,
    CallSubr,
    Return,
    EndChar,
    HStemHm,
    HintMask,
    CntrMask,
    RMoveTo,
    HMoveTo,
    VStemHm,
    RCurveLine,
    RLineCurve,
    VvCurveTo,
    HhCurveTo,
    CallGsubr,
    VhCurveTo,
    HvCurveTo,

    DotSection,
    And,
    Or,
    Not,
    Abs,
    Add,
    Sub,
    Div,
    Neg,
    Eq,
    Drop,
    Put,
    Get,
    IfElse,
    Random,
    Mul,
    Sqrt,
    Dup,
    Exch,
    Index,
    Roll,
    HFlex,
    Flex,
    HFlex1,
    Flex1,
}

impl Operator {
    pub fn from_opcode(opcode: u8) -> Option<Self> {
        use Operator::*;
        Some(match opcode {
            1 => HStem,
            3 => VStem,
            4 => VMoveTo,
            5 => RLineTo,
            6 => HLineTo,
            7 => VLineTo,
            8 => RrCurveTo,
            10 => CallSubr,
            11 => Return,
            14 => EndChar,
            18 => HStemHm,
            19 => HintMask,
            20 => CntrMask,
            21 => RMoveTo,
            22 => HMoveTo,
            23 => VStemHm,
            24 => RCurveLine,
            25 => RLineCurve,
            26 => VvCurveTo,
            27 => HhCurveTo,
            29 => CallGsubr,
            30 => VhCurveTo,
            31 => HvCurveTo,
            _ => return None,
        })
    }

    /// Operators preceded by the escape byte `12`
    pub fn from_two_byte_opcode(opcode: u8) -> Option<Self> {
        use Operator::*;
        Some(match opcode {
            0 => DotSection,
            3 => And,
            4 => Or,
            5 => Not,
            9 => Abs,
            10 => Add,
            11 => Sub,
            12 => Div,
            14 => Neg,
            15 => Eq,
            18 => Drop,
            20 => Put,
            21 => Get,
            22 => IfElse,
            23 => Random,
            24 => Mul,
            26 => Sqrt,
            27 => Dup,
            28 => Exch,
            29 => Index,
            30 => Roll,
            34 => HFlex,
            35 => Flex,
            36 => HFlex1,
            37 => Flex1,
            _ => return None,
        })
    }

    pub fn mnemonic(self) -> &'static str {
        use Operator::*;
        match self {
            HStem => "hstem",
            VStem => "vstem",
            VMoveTo => "vmoveto",
            RLineTo => "rlineto",
            HLineTo => "hlineto",
            VLineTo => "vlineto",
            RrCurveTo => "rrcurveto",
            CallSubr => "callsubr",
            Return => "return",
            EndChar => "endchar",
            HStemHm => "hstemhm",
            HintMask => "hintmask",
            CntrMask => "cntrmask",
            RMoveTo => "rmoveto",
            HMoveTo => "hmoveto",
            VStemHm => "vstemhm",
            RCurveLine => "rcurveline",
            RLineCurve => "rlinecurve",
            VvCurveTo => "vvcurveto",
            HhCurveTo => "hhcurveto",
            CallGsubr => "callgsubr",
            VhCurveTo => "vhcurveto",
            HvCurveTo => "hvcurveto",
            DotSection => "dotsection",
            And => "and",
            Or => "or",
            Not => "not",
            Abs => "abs",
            Add => "add",
            Sub => "sub",
            Div => "div",
            Neg => "neg",
            Eq => "eq",
            Drop => "drop",
            Put => "put",
            Get => "get",
            IfElse => "ifelse",
            Random => "random",
            Mul => "mul",
            Sqrt => "sqrt",
            Dup => "dup",
            Exch => "exch",
            Index => "index",
            Roll => "roll",
            HFlex => "hflex",
            Flex => "flex",
            HFlex1 => "hflex1",
            Flex1 => "flex1",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token {
    Integer(i32),
    Fixed(F16Dot16),
    Operator(Operator),
}

impl Token {
    /// The value of a numeric operand
    pub fn number(self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(n as f64),
            Self::Fixed(n) => Some(n.to_num()),
            Self::Operator(..) => None,
        }
    }
}

/// Decodes a charstring or subroutine program into tokens, one at a time.
///
/// The data bytes following `hintmask` and `cntrmask` are not tokens; their
/// length depends on the stem hints declared so far, so the interpreter
/// steps over them with [`CharStringTokenizer::skip_mask`]
#[derive(Debug, Clone)]
pub struct CharStringTokenizer<'a> {
    buffer: &'a [u8],
    cursor: usize,
}

impl<'a> CharStringTokenizer<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, cursor: 0 }
    }

    /// Returns `None` once the program is exhausted
    pub fn next_token(&mut self) -> CffResult<Option<Token>> {
        let b0 = match self.peek() {
            Some(b0) => b0,
            None => return Ok(None),
        };
        self.cursor += 1;

        let token = match b0 {
            ESCAPE => {
                let b1 = self.next()?;
                let op = Operator::from_two_byte_opcode(b1)
                    .ok_or(CffError::ReservedOperator { b0, b1: Some(b1) })?;
                Token::Operator(op)
            }
            28 => Token::Integer(self.parse_i16()? as i32),
            32..=254 => Token::Integer(self.parse_short_int(b0)?),
            255 => Token::Fixed(F16Dot16::from_bits(self.parse_u32()?)),
            _ => {
                let op = Operator::from_opcode(b0)
                    .ok_or(CffError::ReservedOperator { b0, b1: None })?;
                Token::Operator(op)
            }
        };

        Ok(Some(token))
    }

    /// Steps over the mask bytes following a `hintmask` or `cntrmask`
    pub fn skip_mask(&mut self, len: usize) -> CffResult<&'a [u8]> {
        self.parse_slice(len)
    }

    /// Decodes a whole program that contains no hint masks
    pub fn tokenize(buffer: &'a [u8]) -> CffResult<Vec<Token>> {
        let mut tokenizer = Self::new(buffer);
        let mut tokens = Vec::new();

        while let Some(token) = tokenizer.next_token()? {
            if matches!(
                token,
                Token::Operator(Operator::HintMask | Operator::CntrMask)
            ) {
                anyhow::bail!(CffError::broken_glyph(
                    "hint masks cannot be tokenized without interpreting stem hints"
                ));
            }
            tokens.push(token);
        }

        Ok(tokens)
    }
}

impl<'a> BinaryParser<'a> for CharStringTokenizer<'a> {
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
