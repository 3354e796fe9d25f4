use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use markin::{init_logging, load_steps, AnnotatorOptions, ExportOptions, Session};

#[derive(Debug, Parser)]
#[command(name = "markin", version, about = "Headless annotation editor core")]
struct Cli {
    /// Emit log lines as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replay a JSON step script and print the exported annotations
    Replay(ReplayArgs),
    /// Print the default annotator options as JSON
    Defaults,
}

#[derive(Debug, Args)]
struct ReplayArgs {
    /// Step script (JSON array)
    script: PathBuf,

    /// Annotator options file (JSON or TOML)
    #[arg(long)]
    options: Option<PathBuf>,

    /// Normalize exported coordinates
    #[arg(long)]
    normalize: bool,

    /// Normalization width
    #[arg(long, requires = "normalize")]
    width: Option<f64>,

    /// Normalization height
    #[arg(long, requires = "normalize")]
    height: Option<f64>,

    /// Write the export here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json)?;
    tracing::debug!(
        "markin {} built {}",
        markin::VERSION,
        markin::BUILD_DATE
    );

    match cli.command {
        Command::Replay(args) => replay(args),
        Command::Defaults => {
            let json = serde_json::to_string_pretty(&AnnotatorOptions::default())?;
            println!("{}", json);
            Ok(())
        }
    }
}

fn replay(args: ReplayArgs) -> Result<()> {
    let options = match &args.options {
        Some(path) => AnnotatorOptions::load_from_file(path)
            .with_context(|| format!("Failed to load options from {}", path.display()))?,
        None => AnnotatorOptions::default(),
    };
    let steps = load_steps(&args.script)?;

    let mut session = Session::new(options)?;
    session.run(&steps)?;

    let export = ExportOptions {
        normalize: args.normalize,
        width: args.width,
        height: args.height,
    };
    let json = session.annotator().annotations_json(&export)?;

    match &args.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}
