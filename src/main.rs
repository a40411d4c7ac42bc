use std::{
    fs::{self, File},
    io::BufWriter,
    path::PathBuf,
};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use vm_translator::{config::DEFAULT_ENTRY_POINT, TranslatorConfig};

/// Translate VM code into Hack assembly.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// A `.vm` file or a directory of `.vm` files.
    #[arg(value_name = "INPUT")]
    input: PathBuf,
    /// Output file; defaults to `<input>.asm`.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
    /// Omit the stack setup and entry call.
    #[arg(long)]
    no_bootstrap: bool,
    /// Omit `//` annotations.
    #[arg(long)]
    no_comments: bool,
    /// Function called by the bootstrap.
    #[arg(long, env = "VM_ENTRY", default_value = DEFAULT_ENTRY_POINT)]
    entry: String,
    /// Increase output verbosity.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// `RUST_LOG` directives when given and valid, else a level from `-v`.
fn log_filter(verbose: u8, env: Option<&str>) -> EnvFilter {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env.and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(level))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter(cli.verbose, env.as_deref()))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = TranslatorConfig {
        bootstrap: !cli.no_bootstrap,
        comments: !cli.no_comments,
        entry_point: cli.entry,
    };

    let units = vm_translator::load_units(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;

    let outfilename = cli
        .output
        .unwrap_or_else(|| vm_translator::default_output(&cli.input));
    let outfile = File::create(&outfilename)
        .with_context(|| format!("creating {}", outfilename.display()))?;

    // A failed translation leaves nothing usable behind.
    if let Err(e) = vm_translator::translate_program(&units, BufWriter::new(outfile), &config) {
        let _ = fs::remove_file(&outfilename);
        return Err(e).with_context(|| format!("translating {}", cli.input.display()));
    }

    info!(output = %outfilename.display(), "done");
    Ok(())
}
