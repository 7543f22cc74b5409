use std::{
    collections::{BTreeMap, HashMap, HashSet},
    path::{Path, PathBuf},
};

use anyhow::Context;
use rayon::prelude::*;

use crate::{
    error::{CffError, CffResult},
    options::DecodeOptions,
};

use self::cff::{
    CffCharStringInterpreter, CffFile, CffParser, CharStringContext, PrivateDict, StringTable,
    SubroutineTable, TopDict,
};

pub use self::glyph::Glyph;

pub mod cff;
mod glyph;

/// A decoded CFF font: its dictionaries and the outline of every glyph
#[derive(Debug, Clone)]
pub struct Font {
    /// The entry of the Name INDEX
    name: String,
    full_name: String,
    top_dict: TopDict,
    private_dict: Option<PrivateDict>,
    strings: StringTable,
    global_subrs: SubroutineTable,
    local_subrs: Option<SubroutineTable>,
    /// One SID per glyph index
    charset: Vec<u16>,
    glyphs: Vec<Glyph>,
    glyph_ids: HashMap<String, usize>,
}

impl Font {
    fn from_cff(cff: CffFile, options: &DecodeOptions) -> CffResult<Self> {
        let strings = StringTable::new(&cff.string_index);

        let name = cff
            .name_index
            .get(0)
            .map(|name| name.iter().map(|&b| b as char).collect::<String>())
            .ok_or_else(|| CffError::BrokenIndex("the Name INDEX is empty".into()))?;

        let full_name = match cff.top_dict.full_name {
            Some(sid) => strings.get(sid).context("resolving FullName")?.to_owned(),
            None => name.clone(),
        };

        let charset = cff.charset.sids(cff.charstring_index.count)?;
        let names = glyph_names(&charset, &strings)?;

        let global_subrs = SubroutineTable::from_index(&cff.global_subr_index);
        let local_subrs = cff.local_subr_index.as_ref().map(SubroutineTable::from_index);

        log::debug!(
            "decoding {:?}: {} glyphs, {} local subroutines",
            full_name,
            names.len(),
            local_subrs.as_ref().map_or(0, SubroutineTable::len)
        );

        let ctx = CharStringContext {
            global_subrs: &global_subrs,
            local_subrs: local_subrs.as_ref(),
            nominal_width_x: cff
                .private_dict
                .as_ref()
                .map_or(0.0, |private| private.nominal_width_x),
            options,
        };

        let mut glyphs = Vec::with_capacity(names.len());

        for (gid, (program, name)) in cff.charstring_index.iter().zip(names).enumerate() {
            let outline = match CffCharStringInterpreter::evaluate(program, ctx) {
                Ok(outline) => outline,
                Err(err) if options.skip_unsupported_glyphs && CffError::is_unsupported(&err) => {
                    log::warn!("skipping glyph {} ({}): {}", gid, name, err);
                    continue;
                }
                Err(err) => {
                    return Err(err.context(format!("interpreting glyph {} ({})", gid, name)))
                }
            };

            log::trace!(
                "glyph {} ({}): width {}, {} segments",
                gid,
                name,
                outline.width,
                outline.commands.len()
            );

            glyphs.push(Glyph {
                sid: charset[gid],
                name,
                width: outline.width,
                commands: outline.commands,
            });
        }

        let glyph_ids = glyphs
            .iter()
            .enumerate()
            .map(|(idx, glyph)| (glyph.name.clone(), idx))
            .collect();

        Ok(Self {
            name,
            full_name,
            top_dict: cff.top_dict,
            private_dict: cff.private_dict,
            strings,
            global_subrs,
            local_subrs,
            charset,
            glyphs,
            glyph_ids,
        })
    }

    /// The name of the font in its FontSet
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `FullName` from the Top DICT, or the FontSet name without one
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// `[xmin, ymin, xmax, ymax]`
    pub fn font_bbox(&self) -> [f64; 4] {
        self.top_dict.font_b_box
    }

    pub fn top_dict(&self) -> &TopDict {
        &self.top_dict
    }

    pub fn private_dict(&self) -> Option<&PrivateDict> {
        self.private_dict.as_ref()
    }

    pub fn strings(&self) -> &StringTable {
        &self.strings
    }

    pub fn global_subrs(&self) -> &SubroutineTable {
        &self.global_subrs
    }

    pub fn local_subrs(&self) -> Option<&SubroutineTable> {
        self.local_subrs.as_ref()
    }

    /// The SID of every glyph index, `.notdef` first
    pub fn charset(&self) -> &[u16] {
        &self.charset
    }

    pub fn glyph(&self, name: &str) -> Option<&Glyph> {
        self.glyph_ids.get(name).map(|&idx| &self.glyphs[idx])
    }

    /// The glyph at index `gid` of the CharStrings INDEX, if it was decoded
    pub fn glyph_by_index(&self, gid: usize) -> Option<&Glyph> {
        let name = self.strings.get(*self.charset.get(gid)?).ok()?;

        self.glyph(name)
    }

    /// Every decoded glyph, in glyph index order
    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }
}

/// Resolves the name of every glyph, which must be unique within the font
fn glyph_names(charset: &[u16], strings: &StringTable) -> CffResult<Vec<String>> {
    let mut seen = HashSet::with_capacity(charset.len());
    let mut names = Vec::with_capacity(charset.len());

    for &sid in charset {
        let name = strings.get(sid)?;

        if !seen.insert(name) {
            anyhow::bail!(CffError::DuplicateGlyphMapping {
                name: name.to_owned()
            });
        }

        names.push(name.to_owned());
    }

    Ok(names)
}

/// Decodes the first font of a FontSet resource
pub fn decode_font(bytes: &[u8], options: &DecodeOptions) -> CffResult<Font> {
    let cff = CffParser::from_font_set(bytes)?.parse()?;

    Font::from_cff(cff, options)
}

pub fn decode_file(path: impl AsRef<Path>, options: &DecodeOptions) -> CffResult<Font> {
    let path = path.as_ref();

    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;

    decode_font(&bytes, options).with_context(|| format!("decoding {}", path.display()))
}

/// The fonts decoded from many files, keyed by full name, and the files that
/// failed
#[derive(Debug, Default)]
pub struct FontBatch {
    pub fonts: BTreeMap<String, Font>,
    pub failures: Vec<(PathBuf, anyhow::Error)>,
}

/// Decodes every file in parallel. A file that fails is recorded and does not
/// affect the others
pub fn decode_batch<P>(paths: &[P], options: &DecodeOptions) -> FontBatch
where
    P: AsRef<Path> + Sync,
{
    let results: Vec<(PathBuf, CffResult<Font>)> = paths
        .par_iter()
        .map(|path| (path.as_ref().to_path_buf(), decode_file(path, options)))
        .collect();

    let mut batch = FontBatch::default();

    for (path, result) in results {
        match result {
            Ok(font) => {
                let full_name = font.full_name().to_owned();
                if batch.fonts.insert(full_name.clone(), font).is_some() {
                    log::warn!(
                        "{} replaces an earlier font named {:?}",
                        path.display(),
                        full_name
                    );
                }
            }
            Err(err) => {
                log::error!("{:#}", err);
                batch.failures.push((path, err));
            }
        }
    }

    batch
}
