use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;

use entfix::create::{self, GenerateOptions, GenerateOutcome};
use entfix::render::RenderOptions;

#[derive(Parser)]
#[command(
    name = "entfix-gen",
    about = "Generate the entity fix table from old/ and new/ entity lumps"
)]
struct Cli {
    /// Directory holding the `old` and `new` entity subdirectories
    entities_root: PathBuf,
    /// Generated Rust source to write
    output: PathBuf,
    /// Regenerate even if the output is newer than every input
    #[arg(long)]
    force: bool,
    /// Path the generated code uses to reach the entfix runtime types
    #[arg(long, default_value = "entfix")]
    crate_path: String,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let options = GenerateOptions {
        force: cli.force,
        render: RenderOptions {
            crate_path: cli.crate_path,
        },
    };

    let start = Instant::now();
    let outcome = create::run(&cli.entities_root, &cli.output, &options)?;
    let elapsed = start.elapsed();

    match outcome {
        GenerateOutcome::UpToDate => {
            println!("Entity fixes up to date: {}", cli.output.display());
        }
        GenerateOutcome::Written(summary) => {
            println!("Entity fixes generated: {}", cli.output.display());
            println!("  Maps: {}", summary.maps);
            println!("  Operations: {}", summary.operations);
            println!("  Literals: {}", summary.literals);
            println!("  Literal bytes: {}", summary.literal_bytes);
            println!("  Time elapsed: {:.3}s", elapsed.as_secs_f64());
        }
    }

    Ok(())
}
