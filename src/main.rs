use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context;

use cff::{
    render::{glyph_file_stem, render_glyph, sanitize_font_name},
    DecodeOptions, Font,
};

/// Writes the outline of every glyph in CFF FontSet files as SVG
#[derive(clap::Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Directory receiving one `<font name>.d` directory per font
    #[arg(short, long, default_value = ".")]
    output: PathBuf,
    /// Replace font directories that already exist
    #[arg(short, long)]
    force: bool,
    /// Fail glyphs that leave operands on the stack
    #[arg(long)]
    strict: bool,
    /// Leave out glyphs using flex, seac-style endchar or random instead of
    /// failing their font
    #[arg(long)]
    skip_unsupported: bool,
    /// FontSet resources to decode
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

impl Args {
    fn decode_options(&self) -> DecodeOptions {
        let mut options = if self.strict {
            DecodeOptions::strict()
        } else {
            DecodeOptions::default()
        };
        options.skip_unsupported_glyphs = self.skip_unsupported;
        options
    }
}

/// Writes `font` below `output`. A font directory that already exists is an
/// error unless `force` is set
fn write_font(font: &Font, output: &Path, force: bool) -> anyhow::Result<()> {
    let dir = output.join(format!("{}.d", sanitize_font_name(font.full_name())));

    if dir.exists() {
        anyhow::ensure!(
            force,
            "output directory {} exists, use --force to replace it",
            dir.display()
        );
        fs::remove_dir_all(&dir).with_context(|| format!("removing {}", dir.display()))?;
    }

    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    for glyph in font.glyphs() {
        let path = dir.join(format!("{}.svg", glyph_file_stem(&glyph.name)));

        fs::write(&path, render_glyph(glyph, font.font_bbox()))
            .with_context(|| format!("writing {}", path.display()))?;
    }

    log::info!(
        "wrote {} glyphs of {:?} to {}",
        font.glyphs().len(),
        font.full_name(),
        dir.display()
    );

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    use clap::Parser as _;
    let args = Args::parse();

    let batch = cff::decode_batch(&args.files, &args.decode_options());
    let mut failed = !batch.failures.is_empty();

    for (path, err) in &batch.failures {
        eprintln!("{}: {:#}", path.display(), err);
    }

    for font in batch.fonts.values() {
        if let Err(err) = write_font(font, &args.output, args.force) {
            eprintln!("{}: {:#}", font.full_name(), err);
            failed = true;
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// A FontSet holding one font, `F`, whose only glyph is an empty `.notdef`
    fn minimal_font() -> Font {
        let mut file = b"/F StartData ".to_vec();
        file.extend([
            1, 0, 4, 1, // header
            0, 1, 1, 1, 2, b'F', // Name INDEX
            0, 1, 1, 1, 3, 160, 17, // Top DICT INDEX, CharStrings at 21
            0, 0, // String INDEX
            0, 0, // global subrs
            0, 1, 1, 1, 2, 14, // CharStrings: endchar
        ]);

        cff::decode_font(&file, &DecodeOptions::default()).unwrap()
    }

    #[test]
    fn existing_output_needs_force() {
        let font = minimal_font();
        let output = std::env::temp_dir().join(format!("cff2svg-{}", std::process::id()));
        fs::create_dir_all(&output).unwrap();

        write_font(&font, &output, false).unwrap();
        assert!(output.join("F.d").join("_notdef.svg").exists());

        let err = write_font(&font, &output, false).unwrap_err();
        assert!(err.to_string().contains("--force"));

        fs::write(output.join("F.d").join("stale.svg"), "").unwrap();
        write_font(&font, &output, true).unwrap();
        assert!(!output.join("F.d").join("stale.svg").exists());
        assert!(output.join("F.d").join("_notdef.svg").exists());

        fs::remove_dir_all(&output).unwrap();
    }
}
