//! Enum-to-string lookup header generation.

use clap::Args;
use frontscope_codegen::{EnumTable, headers_equivalent, parse_enum_file, render_header, write_header};
use std::path::PathBuf;

#[derive(Args)]
pub struct EnumTableArgs {
    /// C header declaring the enum
    #[arg(value_name = "HEADER")]
    header: PathBuf,

    /// Typedef name of the enum
    #[arg(long, default_value = "control_ret_t")]
    enum_name: String,

    /// Generated header path
    #[arg(short, long, default_value = "src.autogen/control_ret_str_map.h")]
    output: PathBuf,

    /// Compare with the existing output instead of writing it
    #[arg(long)]
    check: bool,
}

pub fn run(args: EnumTableArgs) -> anyhow::Result<()> {
    let definition = parse_enum_file(&args.header, &args.enum_name)?;
    let table = EnumTable::from_definition(&definition);
    println!(
        "{}: {} enumerators, highest value {}",
        args.enum_name,
        definition.entries.len(),
        definition.max_value().unwrap_or(0)
    );

    if args.check {
        let existing = std::fs::read_to_string(&args.output)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", args.output.display()))?;
        if !headers_equivalent(&existing, &render_header(&table, &args.enum_name)) {
            anyhow::bail!("{} is out of date", args.output.display());
        }
        println!("{} is up to date", args.output.display());
        return Ok(());
    }

    write_header(&args.output, &table, &args.enum_name)?;
    println!("Lookup table saved in {}", args.output.display());
    Ok(())
}
