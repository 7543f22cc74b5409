/*!
 * https://adobe-type-tools.github.io/font-tech-notes/pdfs/5176.CFF.pdf
 *
 * See also:
 *  - https://adobe-type-tools.github.io/font-tech-notes/pdfs/5177.Type2.pdf
 */

mod charset;
mod charstring;
mod consts;
mod dict;
mod index;
mod parse;
mod strings;
mod subrs;
#[cfg(test)]
pub(crate) mod test_util;
mod tokenizer;

pub use charset::*;
pub use charstring::{CffCharStringInterpreter, CharStringContext, CharStringOutline};
pub use consts::STANDARD_STRINGS;
pub use dict::{PrivateDict, TopDict};
pub use index::*;
pub use parse::CffParser;
pub use strings::StringTable;
pub use subrs::SubroutineTable;
pub use tokenizer::{CharStringTokenizer, Operator, Token};

type Offsize = u8;

/// The structures of one font in a CFF FontSet, before any glyph is
/// interpreted
#[derive(Debug)]
pub struct CffFile<'a> {
    pub header: CffHeader,
    pub name_index: CffIndex<'a>,
    pub top_dict: TopDict,
    pub string_index: CffIndex<'a>,
    pub global_subr_index: CffIndex<'a>,
    pub charstring_index: CffIndex<'a>,
    pub charset: CffCharset,
    pub private_dict: Option<PrivateDict>,
    pub local_subr_index: Option<CffIndex<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CffHeader {
    pub major: u8,
    pub minor: u8,
    pub header_size: u8,
    pub off_size: u8,
}
