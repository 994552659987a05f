use anyhow::Context;
use clap::Parser;
use img_convert::cli::Args;
use img_convert::report::{ConsoleReporter, JsonReporter, Reporter};
use img_convert::{convert_all, logger, Config, MediaCodec};
use tracing::info;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init(args.verbosity());

    let config = Config::from_args(&args).context("Invalid configuration")?;
    info!(
        "Converting to {} (quality {}, effort {}{})",
        config.format,
        config.quality,
        config.effort,
        if config.lossless { ", lossless" } else { "" }
    );

    let mut reporter: Box<dyn Reporter> = if args.json {
        Box::new(JsonReporter)
    } else {
        Box::new(ConsoleReporter::new(args.verbosity().is_quiet()))
    };

    let codec = MediaCodec::default();
    // Per-file failures are already in the summary; only an inaccessible work set is fatal.
    convert_all(&config, &codec, reporter.as_mut())?;

    Ok(())
}
