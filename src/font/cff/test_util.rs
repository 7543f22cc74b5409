//! Encoders for assembling synthetic CFF data in tests

use super::tokenizer::{F16Dot16, Operator};

pub(crate) fn encode_index(blobs: &[&[u8]]) -> Vec<u8> {
    if blobs.is_empty() {
        return vec![0, 0];
    }

    let last_offset = blobs.iter().map(|blob| blob.len()).sum::<usize>() + 1;
    let offsize: u8 = match last_offset {
        0..=0xff => 1,
        0x100..=0xffff => 2,
        0x1_0000..=0xff_ffff => 3,
        _ => 4,
    };

    let mut out = (blobs.len() as u16).to_be_bytes().to_vec();
    out.push(offsize);

    let mut offset = 1u32;
    out.extend_from_slice(&offset.to_be_bytes()[4 - offsize as usize..]);
    for blob in blobs {
        offset += blob.len() as u32;
        out.extend_from_slice(&offset.to_be_bytes()[4 - offsize as usize..]);
    }

    for blob in blobs {
        out.extend_from_slice(blob);
    }

    out
}

/// Shortest DICT encoding of `n`
pub(crate) fn encode_dict_int(n: i32) -> Vec<u8> {
    match n {
        -107..=107 => vec![(n + 139) as u8],
        108..=1131 => {
            let n = n - 108;
            vec![(n / 256 + 247) as u8, (n % 256) as u8]
        }
        -1131..=-108 => {
            let n = -n - 108;
            vec![(n / 256 + 251) as u8, (n % 256) as u8]
        }
        -32768..=32767 => {
            let [b1, b2] = (n as i16).to_be_bytes();
            vec![28, b1, b2]
        }
        _ => encode_dict_offset(n as u32),
    }
}

/// Five byte DICT encoding, so offsets can be patched in without moving
/// anything after them
pub(crate) fn encode_dict_offset(n: u32) -> Vec<u8> {
    let mut out = vec![29];
    out.extend_from_slice(&n.to_be_bytes());
    out
}

pub(crate) fn encode_dict_real(s: &str) -> Vec<u8> {
    let mut nibbles = Vec::new();
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        nibbles.push(match c {
            '0'..='9' => c as u8 - b'0',
            '.' => 0xa,
            'E' | 'e' if chars.peek() == Some(&'-') => {
                chars.next();
                0xc
            }
            'E' | 'e' => 0xb,
            '-' => 0xe,
            _ => panic!("cannot encode {:?} as a real number", s),
        });
    }

    nibbles.push(0xf);
    if nibbles.len() % 2 != 0 {
        nibbles.push(0xf);
    }

    let mut out = vec![30];
    out.extend(nibbles.chunks_exact(2).map(|pair| pair[0] << 4 | pair[1]));
    out
}

/// One element of a charstring program
#[derive(Debug, Clone, Copy)]
pub(crate) enum Cs {
    Int(i32),
    Fixed(f64),
    Op(Operator),
    /// Raw bytes, such as hint mask data
    Bytes(&'static [u8]),
}

pub(crate) fn encode_charstring(program: &[Cs]) -> Vec<u8> {
    let mut out = Vec::new();

    for &item in program {
        match item {
            Cs::Int(n @ -1131..=1131) => out.extend(encode_dict_int(n)),
            Cs::Int(n) => {
                let [b1, b2] = i16::try_from(n)
                    .expect("charstring integers are 16 bits")
                    .to_be_bytes();
                out.extend([28, b1, b2]);
            }
            Cs::Fixed(n) => {
                out.push(255);
                out.extend(F16Dot16::from_num(n).to_bits().to_be_bytes());
            }
            Cs::Op(op) => out.extend(encode_operator(op)),
            Cs::Bytes(bytes) => out.extend_from_slice(bytes),
        }
    }

    out
}

fn encode_operator(op: Operator) -> Vec<u8> {
    if let Some(b0) = (0..32).find(|&b0| Operator::from_opcode(b0) == Some(op)) {
        return vec![b0];
    }

    let b1 = (0..=255)
        .find(|&b1| Operator::from_two_byte_opcode(b1) == Some(op))
        .expect("every operator has an encoding");

    vec![12, b1]
}

/// Assembles a single-font FontSet resource: some text, the `StartData`
/// marker, then the CFF data
///
/// Layout of the CFF data: header, Name INDEX, Top DICT INDEX, String INDEX,
/// global subrs, CharStrings, charset, Private DICT, local subrs.
#[derive(Debug, Clone)]
pub(crate) struct FontBuilder {
    pub name: &'static str,
    /// Top DICT entries besides the offsets the builder computes
    pub top_dict: Vec<u8>,
    pub strings: Vec<Vec<u8>>,
    pub global_subrs: Vec<Vec<u8>>,
    pub char_strings: Vec<Vec<u8>>,
    /// Raw charset bytes, format byte included. `None` uses the predefined
    /// ISOAdobe charset
    pub charset: Option<Vec<u8>>,
    /// Private DICT entries besides `Subrs`. `None` omits the Private DICT
    pub private_dict: Option<Vec<u8>>,
    pub local_subrs: Vec<Vec<u8>>,
}

impl Default for FontBuilder {
    fn default() -> Self {
        Self {
            name: "TestFont",
            top_dict: Vec::new(),
            strings: Vec::new(),
            global_subrs: Vec::new(),
            char_strings: vec![encode_charstring(&[Cs::Op(Operator::EndChar)])],
            charset: None,
            private_dict: Some(Vec::new()),
            local_subrs: Vec::new(),
        }
    }
}

impl FontBuilder {
    fn private_dict_bytes(&self) -> Option<Vec<u8>> {
        let mut private = self.private_dict.clone()?;

        if !self.local_subrs.is_empty() {
            // the subrs follow the dict immediately
            let len = private.len() + 6;
            private.extend(encode_dict_offset(len as u32));
            private.push(19);
        }

        Some(private)
    }

    fn top_dict_bytes(
        &self,
        char_strings: u32,
        charset: Option<u32>,
        private: Option<(u32, u32)>,
    ) -> Vec<u8> {
        let mut top = self.top_dict.clone();

        top.extend(encode_dict_offset(char_strings));
        top.push(17);

        if let Some(charset) = charset {
            top.extend(encode_dict_offset(charset));
            top.push(15);
        }

        if let Some((size, offset)) = private {
            top.extend(encode_dict_offset(size));
            top.extend(encode_dict_offset(offset));
            top.push(18);
        }

        top
    }

    /// The CFF data alone, starting at the header
    pub fn build_cff(&self) -> Vec<u8> {
        fn blobs(v: &[Vec<u8>]) -> Vec<&[u8]> {
            v.iter().map(Vec::as_slice).collect()
        }

        let private = self.private_dict_bytes();

        let header = [1, 0, 4, 4];
        let name_index = encode_index(&[self.name.as_bytes()]);
        let string_index = encode_index(&blobs(&self.strings));
        let global_subrs = encode_index(&blobs(&self.global_subrs));
        let char_strings = encode_index(&blobs(&self.char_strings));
        let local_subrs = encode_index(&blobs(&self.local_subrs));

        // every offset has a fixed width, so placeholders measure the Top DICT
        let placeholder = self.top_dict_bytes(
            0,
            self.charset.as_ref().map(|_| 0),
            private.as_ref().map(|_| (0, 0)),
        );
        let top_dict_index_len = encode_index(&[&placeholder]).len();

        let char_strings_offset = header.len()
            + name_index.len()
            + top_dict_index_len
            + string_index.len()
            + global_subrs.len();
        let charset_offset = char_strings_offset + char_strings.len();
        let private_offset =
            charset_offset + self.charset.as_ref().map_or(0, |charset| charset.len());

        let top_dict = self.top_dict_bytes(
            char_strings_offset as u32,
            self.charset.as_ref().map(|_| charset_offset as u32),
            private
                .as_ref()
                .map(|private| (private.len() as u32, private_offset as u32)),
        );

        let mut out = header.to_vec();
        out.extend(name_index);
        out.extend(encode_index(&[&top_dict]));
        out.extend(string_index);
        out.extend(global_subrs);
        out.extend(char_strings);
        if let Some(charset) = &self.charset {
            out.extend_from_slice(charset);
        }
        if let Some(private) = private {
            out.extend(private);
            if !self.local_subrs.is_empty() {
                out.extend(local_subrs);
            }
        }

        out
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = b"%!PS-Adobe-3.0 Resource-FontSet\n/FontSetInit /ProcSet findresource begin\n"
            .to_vec();
        out.extend_from_slice(format!("/{} ", self.name).as_bytes());
        out.extend_from_slice(b"StartData ");
        out.extend(self.build_cff());
        out
    }
}
