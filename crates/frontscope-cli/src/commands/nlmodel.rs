//! NLModel matrix inspection.

use clap::Args;
use frontscope_config::FrontscopeConfig;
use frontscope_io::{NlModelLayout, dims_from_name, read_nlmodel};
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct NlModelArgs {
    /// Binary file holding the NLModel buffer read from the device
    #[arg(short = 'f', long)]
    nlmodel_file: Option<PathBuf>,

    /// Write the payload as a file usable with the set NLModel command
    #[arg(short = 's', long, value_name = "FILE")]
    generate_set_file: Option<PathBuf>,

    /// Row count of a dump without a size header
    #[arg(long, requires = "cols")]
    rows: Option<usize>,

    /// Column count of a dump without a size header
    #[arg(long, requires = "rows")]
    cols: Option<usize>,
}

/// Layout of `path`: explicit dimensions win, then a `.r<rows>.c<cols>`
/// suffix, otherwise the dump carries its own header.
fn layout_for(path: &Path, rows: Option<usize>, cols: Option<usize>) -> NlModelLayout {
    match (rows, cols) {
        (Some(rows), Some(cols)) => NlModelLayout::Explicit { rows, cols },
        _ => dims_from_name(path)
            .map_or(NlModelLayout::Header, |(rows, cols)| NlModelLayout::Explicit {
                rows,
                cols,
            }),
    }
}

pub fn run(args: NlModelArgs, config: &FrontscopeConfig) -> anyhow::Result<()> {
    let path = args
        .nlmodel_file
        .unwrap_or_else(|| config.files.nlmodel_file.clone());
    if !path.is_file() {
        anyhow::bail!("Error: file {} not found", path.display());
    }

    let layout = layout_for(&path, args.rows, args.cols);
    tracing::debug!(file = %path.display(), ?layout, "reading NLModel");
    let model = read_nlmodel(&path, layout)?;

    println!(
        "NLModel matrix has {} rows and {} columns",
        model.rows(),
        model.cols()
    );
    print!("{model}");

    if let Some(out) = &args.generate_set_file {
        model.write_payload(out)?;
        println!("Set file saved in {}", out.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dimensions_override_file_name() {
        let path = Path::new("nlm.r4.c8");
        assert_eq!(
            layout_for(path, Some(2), Some(3)),
            NlModelLayout::Explicit { rows: 2, cols: 3 }
        );
        assert_eq!(
            layout_for(path, None, None),
            NlModelLayout::Explicit { rows: 4, cols: 8 }
        );
        assert_eq!(
            layout_for(Path::new("nlm_buffer.bin"), None, None),
            NlModelLayout::Header
        );
    }
}
