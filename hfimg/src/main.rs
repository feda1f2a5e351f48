//! hfimg: batch converter for the HEIF family.
//!
//! Decodes HEIF/HEIC/AVIF containers to JPEG or PNG, packs raster images into
//! lossless HEIC containers, and lists the images inside a container.

mod batch;
mod convert;
mod inspect;
mod output;

use clap::{Args, Parser, Subcommand, ValueEnum};
use heifconv::{ColorModel, FormatSet, FormatTag, RasterKind};

#[derive(Parser)]
#[command(name = "hfimg", version, about)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode containers to JPEG or PNG.
    Raster(RasterArgs),

    /// Pack images into lossless HEIC containers.
    Container(ContainerArgs),

    /// List top-level images and extract the primary one as `<stem>_lowlevel.png`.
    Inspect(InspectArgs),
}

/// Options shared by the converting subcommands.
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Input files, directories or glob patterns.
    #[arg(required = true)]
    pub files: Vec<String>,

    /// Output file (single input) or directory (trailing slash or existing dir).
    #[arg(short, long)]
    pub output: Option<String>,

    /// Number of parallel workers (default: CPU count).
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    /// Print a per-file summary table when done.
    #[arg(long)]
    pub report: bool,
}

/// Arguments for the `raster` subcommand.
#[derive(Args, Debug)]
pub struct RasterArgs {
    #[command(flatten)]
    pub batch: BatchArgs,

    /// Output format.
    #[arg(short, long, value_enum)]
    pub format: RasterArg,

    /// JPEG quality (1-100, default 90).
    #[arg(short, long, allow_negative_numbers = true)]
    pub quality: Option<i32>,

    /// Source formats to accept (default: heif,heic,avif).
    #[arg(long, value_enum, value_delimiter = ',')]
    pub accept: Vec<FormatArg>,
}

impl RasterArgs {
    pub fn accepted_sources(&self) -> FormatSet {
        if self.accept.is_empty() {
            return FormatSet::CONTAINER_FAMILY;
        }
        let tags: Vec<FormatTag> = self.accept.iter().map(|f| f.to_format_tag()).collect();
        FormatSet::from_formats(&tags)
    }
}

/// Arguments for the `container` subcommand.
#[derive(Args, Debug)]
pub struct ContainerArgs {
    #[command(flatten)]
    pub batch: BatchArgs,
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Input files, directories or glob patterns.
    #[arg(required = true)]
    pub files: Vec<String>,

    /// Color model used when extracting the primary image.
    #[arg(long, value_enum, default_value = "auto")]
    pub color: ColorArg,

    /// Only list images, do not decode the primary one.
    #[arg(long)]
    pub no_extract: bool,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Raster output format.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum RasterArg {
    Jpeg,
    Png,
}

impl RasterArg {
    pub fn to_raster_kind(self) -> RasterKind {
        match self {
            RasterArg::Jpeg => RasterKind::Jpeg,
            RasterArg::Png => RasterKind::Png,
        }
    }
}

/// Any recognized format, for `--accept`.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FormatArg {
    Heif,
    Heic,
    Avif,
    Jpeg,
    Png,
}

impl FormatArg {
    pub fn to_format_tag(self) -> FormatTag {
        match self {
            FormatArg::Heif => FormatTag::Heif,
            FormatArg::Heic => FormatTag::Heic,
            FormatArg::Avif => FormatTag::Avif,
            FormatArg::Jpeg => FormatTag::Jpeg,
            FormatArg::Png => FormatTag::Png,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ColorArg {
    Auto,
    Rgb,
    Rgba,
}

impl ColorArg {
    pub fn to_color_model(self) -> ColorModel {
        match self {
            ColorArg::Auto => ColorModel::Unspecified,
            ColorArg::Rgb => ColorModel::Rgb,
            ColorArg::Rgba => ColorModel::Rgba,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let failed = match cli.command {
        Command::Raster(args) => convert::run_raster(args)?,
        Command::Container(args) => convert::run_container(args)?,
        Command::Inspect(args) => inspect::run(args)?,
    };

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
