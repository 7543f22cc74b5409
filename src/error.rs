use std::{borrow::Cow, fmt};

pub type CffResult<T> = anyhow::Result<T>;

/// Features of the CFF and Type 2 charstring formats this crate recognizes
/// but does not decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unsupported {
    Flex,
    HFlex,
    HFlex1,
    Flex1,
    Random,

    /// `endchar` with the four `seac` operands of an accented character
    AccentedEndChar,

    /// Top DICT operators `12 30` through `12 38`
    CidKeyedFont { op: u8 },

    /// A `CharstringType` other than 2
    CharstringType(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CffError {
    /// The `StartData` marker preceding the CFF data was never found
    MarkerNotFound,

    UnexpectedEndOfData,

    UnsupportedVersion {
        major: u8,
    },

    UnsupportedHeaderSize {
        header_size: u8,
    },

    InvalidOffsetSize {
        off_size: u8,
    },

    BrokenIndex(Cow<'static, str>),

    InvalidCharsetFormat {
        format: u8,
    },

    BrokenCharset(Cow<'static, str>),

    UnknownStringId {
        sid: u16,
    },

    /// The Top DICT has no `CharStrings` offset
    MissingCharStrings,

    /// DICT key outside the known set. `b1` is the second byte of an escaped
    /// (`12 x`) key
    UnknownOperator {
        b0: u8,
        b1: Option<u8>,
    },

    /// Charstring byte outside the Type 2 grammar
    ReservedOperator {
        b0: u8,
        b1: Option<u8>,
    },

    ReservedNibble {
        nibble: u8,
    },

    /// Two glyph indices of one font resolve to the same glyph name
    DuplicateGlyphMapping {
        name: String,
    },

    BrokenDict(Cow<'static, str>),

    BrokenGlyph(Cow<'static, str>),

    UnsupportedFeature(Unsupported),
}

impl CffError {
    /// Finds the `CffError` at the root of an error, looking through any
    /// context attached while it propagated
    pub fn find(err: &anyhow::Error) -> Option<&CffError> {
        err.downcast_ref::<CffError>()
    }

    /// Whether `err` reports a feature this crate does not implement, as
    /// opposed to malformed data
    pub fn is_unsupported(err: &anyhow::Error) -> bool {
        matches!(Self::find(err), Some(CffError::UnsupportedFeature(..)))
    }

    pub(crate) fn broken_glyph(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::BrokenGlyph(reason.into())
    }

    pub(crate) fn broken_dict(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::BrokenDict(reason.into())
    }
}

impl fmt::Display for CffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MarkerNotFound => write!(f, "StartData marker not found"),
            Self::UnexpectedEndOfData => write!(f, "unexpected end of data"),
            Self::UnsupportedVersion { major } => {
                write!(f, "unsupported CFF major version {}", major)
            }
            Self::UnsupportedHeaderSize { header_size } => {
                write!(f, "unsupported CFF header size {}", header_size)
            }
            Self::InvalidOffsetSize { off_size } => write!(f, "invalid offsize: {}", off_size),
            Self::BrokenIndex(reason) => write!(f, "broken INDEX: {}", reason),
            Self::InvalidCharsetFormat { format } => {
                write!(f, "invalid charset format: {}", format)
            }
            Self::BrokenCharset(reason) => write!(f, "broken charset: {}", reason),
            Self::UnknownStringId { sid } => write!(f, "unknown string id {}", sid),
            Self::MissingCharStrings => write!(f, "top dict has no CharStrings offset"),
            Self::UnknownOperator { b0, b1: None } => write!(f, "unknown dict operator {}", b0),
            Self::UnknownOperator { b0, b1: Some(b1) } => {
                write!(f, "unknown dict operator {} {}", b0, b1)
            }
            Self::ReservedOperator { b0, b1: None } => {
                write!(f, "reserved charstring operator {}", b0)
            }
            Self::ReservedOperator { b0, b1: Some(b1) } => {
                write!(f, "reserved charstring operator {} {}", b0, b1)
            }
            Self::ReservedNibble { nibble } => write!(f, "reserved real number nibble {}", nibble),
            Self::DuplicateGlyphMapping { name } => {
                write!(f, "glyph name {:?} is mapped more than once", name)
            }
            Self::BrokenDict(reason) => write!(f, "broken dict: {}", reason),
            Self::BrokenGlyph(reason) => write!(f, "broken glyph: {}", reason),
            Self::UnsupportedFeature(feature) => write!(f, "unsupported: {:?}", feature),
        }
    }
}

impl std::error::Error for CffError {}
