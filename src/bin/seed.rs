use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use clap::Parser;

/// Four demo clients covering multivalued balances, an empty attribute,
/// and a history with more dates than amounts.
const SAMPLE_CLIENTS: &str = "\
101^John Doe^2500.00]400.00]12.50^2023-11-01]2023-12-01]2024-01-15
102^Jane Smith^150.00]800.00^2024-02-10]2024-03-15
103^Alex Chen^9800.00^^2024-04-20
104^Lisa Wong^100.00]50.00^2024-05-01]2024-05-15]2024-06-01]2024-06-15
";

#[derive(Parser)]
#[command(
    name = "pickwick-seed",
    about = "Writes a demo legacy client flat file for the pickwick server"
)]
struct Cli {
    /// Destination for the delimited data file.
    #[arg(long, default_value = "LEGACY_CLIENTS.dat")]
    data_file: PathBuf,
    /// Overwrite the data file if it already exists.
    #[arg(long)]
    force: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.data_file.exists() && !cli.force {
        bail!(
            "refusing to overwrite {} (pass --force to replace it)",
            cli.data_file.display()
        );
    }

    write_string(&cli.data_file, SAMPLE_CLIENTS)?;
    println!(
        "Seeded {} legacy client records at {}",
        SAMPLE_CLIENTS.lines().count(),
        cli.data_file.display()
    );
    Ok(())
}

fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| {
            format!(
                "failed to create parent directories for {}",
                parent.display()
            )
        })?;
    }
    let mut file = fs::File::create(path)
        .with_context(|| format!("failed to create file at {}", path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("failed to write data to {}", path.display()))?;
    Ok(())
}
