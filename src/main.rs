use anyhow::Context;
use clap::Parser;
use eol_utl::{Config, EolKind, Pipeline};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "eol-utl",
    version,
    author,
    about = "Normalize and reroute line endings in text streams",
    long_about = "Normalize and reroute line endings in text streams.\n\n\
    This tool reads text in fixed-size chunks, recognizes all three line \
    separator forms (LF, CR, CRLF) even when a CRLF pair is split across \
    two reads, and rewrites the stream with a uniform separator or routes \
    it to the file named by the stream's first line.\n\n\
    USAGE EXAMPLES:\n  \
      # Normalize a file to Unix line endings\n  \
      eol-utl --input notes.txt --output notes.unix.txt\n\n  \
      # Convert stdin to Windows line endings on stdout\n  \
      eol-utl --eol crlf < input.txt > output.txt\n\n  \
      # Write the stream body to the file named by its first line\n  \
      eol-utl --input payload.txt --route-by-header\n\n  \
      # Print machine-readable statistics\n  \
      eol-utl --input big.log --output clean.log --stats"
)]
struct Cli {
    /// Input file (defaults to standard input)
    #[arg(short, long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Output file (defaults to standard output)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Target end-of-line form
    #[arg(short, long, value_enum, default_value = "lf")]
    eol: CliEol,

    /// Read size per chunk, in bytes
    #[arg(long, default_value_t = 8192, value_name = "BYTES")]
    chunk_size: usize,

    /// Take the output path from the stream's first line
    ///
    /// The first line of the input names the destination file; it is
    /// created (parent directories included) and receives everything
    /// after the header line, separators preserved as-is.
    #[arg(long, conflicts_with = "output")]
    route_by_header: bool,

    /// Print statistics as JSON instead of the plain summary
    #[arg(long)]
    stats: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliEol {
    /// Unix "\n"
    Lf,
    /// Windows "\r\n"
    Crlf,
    /// Classic Mac "\r"
    Cr,
    /// Remove separators entirely
    Strip,
}

impl From<CliEol> for EolKind {
    fn from(e: CliEol) -> Self {
        match e {
            CliEol::Lf => Self::Lf,
            CliEol::Crlf => Self::CrLf,
            CliEol::Cr => Self::Cr,
            CliEol::Strip => Self::Strip,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose)?;

    let mut builder = Config::builder()
        .eol(cli.eol.into())
        .chunk_size(cli.chunk_size)
        .route_by_header(cli.route_by_header);

    if let Some(input) = cli.input {
        builder = builder.input(input);
    }

    if let Some(output) = cli.output {
        builder = builder.output(output);
    }

    let config = builder.build().context("Failed to build configuration")?;

    let result = Pipeline::new(config)
        .context("Failed to create pipeline")?
        .run()
        .context("Rewrite failed")?;

    if cli.stats {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if result.output != "<stdout>" {
        // Writing the summary into the rewritten stream would corrupt it.
        result.print_summary();
    }

    Ok(())
}

fn setup_tracing(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => EnvFilter::new("eol_utl=warn"),
        1 => EnvFilter::new("eol_utl=info"),
        2 => EnvFilter::new("eol_utl=debug"),
        _ => EnvFilter::new("eol_utl=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_thread_ids(false).with_writer(std::io::stderr))
        .init();

    Ok(())
}
