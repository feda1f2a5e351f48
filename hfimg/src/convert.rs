//! The `raster` and `container` subcommands.

use heifconv::{CodecRegistry, Converter, FormatSet, FormatTag};
use log::debug;

use crate::batch::{self, BatchSummary};
use crate::output::OutputConfig;
use crate::{BatchArgs, ContainerArgs, RasterArgs};

/// Run `raster`; returns the number of failed files.
pub fn run_raster(args: RasterArgs) -> anyhow::Result<usize> {
    let kind = args.format.to_raster_kind();
    let registry = CodecRegistry::all();
    let converter = Converter::new(&registry).with_accepted_sources(args.accepted_sources());
    debug!(
        "raster: {:?} accepting {:?}",
        kind,
        converter.accepted_sources().iter().collect::<Vec<_>>()
    );

    let sources = converter.accepted_sources();
    run_batch(&args.batch, sources, kind.extension(), |input, output| {
        Ok(converter
            .to_raster(kind, input, output, args.quality)?
            .bytes_written)
    })
}

/// Run `container`; returns the number of failed files.
pub fn run_container(args: ContainerArgs) -> anyhow::Result<usize> {
    let registry = CodecRegistry::all();
    let converter = Converter::new(&registry);
    let extension = FormatTag::Heic.extensions()[0];

    // Scanned .heic files are earlier outputs; only raster sources qualify
    run_batch(&args.batch, FormatSet::RASTER, extension, |input, output| {
        Ok(converter.to_container(input, output)?.bytes_written)
    })
}

fn run_batch<F>(
    args: &BatchArgs,
    sources: FormatSet,
    extension: &'static str,
    convert: F,
) -> anyhow::Result<usize>
where
    F: Fn(&std::path::Path, &std::path::Path) -> anyhow::Result<usize> + Sync,
{
    let files = batch::expand_inputs(&args.files, sources)?;
    if files.is_empty() {
        anyhow::bail!("no image files found");
    }

    let output_config = OutputConfig::new(args.output.as_deref(), extension);
    let input_count = files.len();

    let summary = batch::run(&files, args.jobs, |input| {
        let output = output_config.resolve(input, input_count)?;
        OutputConfig::ensure_parent(&output)?;
        let written = convert(input, &output)?;
        Ok((output, written as u64))
    })?;

    finish(&summary, args.report);
    Ok(summary.error_count())
}

fn finish(summary: &BatchSummary, report: bool) {
    if report {
        summary.print_report();
    } else if summary.error_count() > 0 && summary.results.len() > 1 {
        eprintln!(
            "{} of {} files had errors",
            summary.error_count(),
            summary.results.len()
        );
    }
}
