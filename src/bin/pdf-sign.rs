//! PDF Sign CLI tool
//!
//! A command-line tool for stamping a signature image onto a PDF page.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process;

use pdf_sign::date::{parse_date_expression, DateExpression};
use pdf_sign::layout::DEFAULT_COORDS;
use pdf_sign::output::resolve_output_path;
use pdf_sign::pdf::{sign_pdf, PagePolicy, SignOptions};
use pdf_sign::Placement;

/// PDF Sign - Add a signature image (and optional date) to a PDF page
#[derive(Parser)]
#[command(name = "pdf-sign")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Sign page 1, 200pt from the left, 300pt up, 125x40pt
    pdf-sign contract.pdf signature.png --coords 1x200x300x125x40 -o contract_signed.pdf

    # Sign with today's date and derive the output name (contract_signed.pdf)
    pdf-sign contract.pdf signature.png --date --rename

    # Stamp a specific date
    pdf-sign contract.pdf signature.png --date-on 2024-01-01 -o out.pdf")]
struct Cli {
    /// The PDF file to sign
    pdf: PathBuf,

    /// The signature image (PNG or JPEG)
    signature: PathBuf,

    /// Stamp today's date right of the signature
    #[arg(long)]
    date: bool,

    /// Stamp a specific date instead of today ("today", "2024-01-01", "01/31/2024")
    #[arg(long, value_name = "EXPR")]
    date_on: Option<String>,

    /// Output file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Name the output <input>_signed.pdf when --output is not given
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_name = "BOOL")]
    rename: Option<String>,

    /// Where to place the signature: PAGExXxYxWIDTHxHEIGHT.
    /// 1x200x300x125x40 means page 1, 200 units from the left, 300 units up
    /// from the bottom, 125 units wide and 40 tall. Pages start at 1; units
    /// are PDF points (1/72 inch).
    #[arg(long, default_value = DEFAULT_COORDS, value_parser = parse_coords)]
    coords: Placement,

    /// Font size of the date stamp in points
    #[arg(long, default_value_t = 12.0)]
    font_size: f32,

    /// Write the PDF unsigned instead of failing when the page does not exist
    #[arg(long)]
    lenient_pages: bool,

    /// More log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_coords(s: &str) -> Result<Placement, String> {
    s.parse::<Placement>().map_err(|e| e.to_string())
}

/// Interpret the optional --rename value
fn is_truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "no" | "off"
    )
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let date = match (cli.date_on.as_deref(), cli.date) {
        (Some(expr), _) => Some(parse_date_expression(expr)?),
        (None, true) => Some(DateExpression::Today),
        (None, false) => None,
    };

    let rename = cli.rename.as_deref().is_some_and(is_truthy);
    let output = resolve_output_path(&cli.pdf, cli.output.as_deref(), rename)?;

    let options = SignOptions {
        source: cli.pdf,
        signature: cli.signature,
        output,
        placement: cli.coords,
        date,
        page_policy: if cli.lenient_pages { PagePolicy::Lenient } else { PagePolicy::Strict },
        font_size: cli.font_size,
    };

    eprintln!("Signing page {} of {}...", options.placement.page, options.source.display());

    let written = sign_pdf(&options)
        .with_context(|| format!("Failed to sign {}", options.source.display()))?;

    eprintln!("Output: {}", written.display());

    Ok(())
}
