use crate::constants::{DEFAULT_ANIMATED_EFFORT_CEILING, DEFAULT_ASSETS_DIR};
use crate::formats::OutputFormat;
use crate::logger::Verbosity;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "img-convert",
    about = "Convert images (and optionally videos) to WebP or AVIF next to the originals",
    long_about = "img-convert walks an assets directory, or takes an explicit list of files, and writes \
                  a .webp or .avif copy beside every image it finds. Originals are never modified or \
                  removed, and files that already have a converted sibling are skipped, so the tool \
                  can be re-run safely. Files are processed one at a time to keep memory use bounded.",
    version,
    after_help = "EXAMPLES:\n  \
    img-convert                          # convert ./assets to WebP\n  \
    img-convert avif -d ./public         # convert ./public to AVIF\n  \
    img-convert webp hero.png \"icons/*.png\" -l\n  \
    ASSETS_DIR=static AVIF_QUALITY=60 img-convert avif --video"
)]
pub struct Args {
    #[arg(
        value_name = "FORMAT|FILE",
        help = "Optional output format (webp, avif) followed by files or glob patterns",
        long_help = "The first value selects the output format when it is `webp` or `avif` (default: webp). \
                     Any remaining values are files or glob patterns to convert instead of scanning the \
                     assets directory."
    )]
    pub targets: Vec<String>,

    #[arg(
        short = 'd',
        long = "dir",
        env = "ASSETS_DIR",
        default_value = DEFAULT_ASSETS_DIR,
        help = "Directory to scan when no files are given"
    )]
    pub dir: PathBuf,

    #[arg(
        short = 'l',
        long,
        env = "LOSSLESS",
        help = "Encode losslessly (quality is ignored)",
        long_help = "Produce bit-exact output. LOSSLESS=true (or 1, yes, on) has the same effect; \
                     false, 0, no, off or an empty value leave it disabled."
    )]
    pub lossless: bool,

    #[arg(
        short = 'q',
        long,
        help = "Quality 0-100 for the selected format",
        long_help = "Overrides WEBP_QUALITY / AVIF_QUALITY for this run."
    )]
    pub quality: Option<u8>,

    #[arg(
        short = 'e',
        long,
        help = "Effort (0-6 for WebP, 0-9 for AVIF)",
        long_help = "Trades encode time for smaller files. Overrides WEBP_EFFORT / AVIF_EFFORT for this run."
    )]
    pub effort: Option<u8>,

    #[arg(long, env = "WEBP_QUALITY", help = "Default WebP quality (80)")]
    pub webp_quality: Option<u8>,

    #[arg(long, env = "WEBP_EFFORT", help = "Default WebP effort (4)")]
    pub webp_effort: Option<u8>,

    #[arg(long, env = "AVIF_QUALITY", help = "Default AVIF quality (50)")]
    pub avif_quality: Option<u8>,

    #[arg(long, env = "AVIF_EFFORT", help = "Default AVIF effort (4)")]
    pub avif_effort: Option<u8>,

    #[arg(
        long,
        env = "ANIMATED_EFFORT_CEILING",
        default_value_t = DEFAULT_ANIMATED_EFFORT_CEILING,
        help = "Maximum effort used for animated GIF/WebP and video sources"
    )]
    pub animated_effort_ceiling: u8,

    #[arg(
        long,
        env = "CONVERT_VIDEO",
        help = "Also convert video files (requires ffmpeg)",
        long_help = "Adds mp4, mov, webm, mkv, avi and m4v to the scanned extensions. Videos become \
                     animated WebP or AVIF through ffmpeg."
    )]
    pub video: bool,

    #[arg(long, help = "Print the run summary as JSON")]
    pub json: bool,

    #[arg(long, conflicts_with = "verbose", help = "Only print the summary and errors")]
    pub quiet: bool,

    #[arg(short = 'v', long, help = "Log every decision")]
    pub verbose: bool,
}

impl Args {
    /// Splits positional values into the optional format selector and the file list.
    pub fn split_targets(&self) -> (Option<OutputFormat>, Vec<String>) {
        match self.targets.split_first() {
            Some((first, rest)) => match OutputFormat::parse_token(first) {
                Some(format) => (Some(format), rest.to_vec()),
                None => (None, self.targets.clone()),
            },
            None => (None, Vec::new()),
        }
    }

    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else if self.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::parse_from(std::iter::once("img-convert").chain(argv.iter().copied()))
    }

    #[test]
    fn test_split_targets_format_only() {
        let args = parse(&["avif"]);
        assert_eq!(args.split_targets(), (Some(OutputFormat::Avif), vec![]));
    }

    #[test]
    fn test_split_targets_format_and_files() {
        let args = parse(&["WEBP", "a.png", "b.jpg"]);
        assert_eq!(
            args.split_targets(),
            (
                Some(OutputFormat::WebP),
                vec!["a.png".to_string(), "b.jpg".to_string()]
            )
        );
    }

    #[test]
    fn test_split_targets_files_without_format() {
        let args = parse(&["a.png"]);
        assert_eq!(args.split_targets(), (None, vec!["a.png".to_string()]));
    }

    #[test]
    fn test_split_targets_empty() {
        let args = parse(&[]);
        assert_eq!(args.split_targets(), (None, vec![]));
    }

    #[test]
    fn test_flags() {
        let args = parse(&["avif", "-l", "-q", "70", "-e", "6", "--video", "--json"]);
        assert!(args.lossless);
        assert_eq!(args.quality, Some(70));
        assert_eq!(args.effort, Some(6));
        assert!(args.video);
        assert!(args.json);
        assert_eq!(args.verbosity(), Verbosity::Normal);
    }

    #[test]
    fn test_quiet_and_verbose_conflict() {
        let result = Args::try_parse_from(["img-convert", "--quiet", "--verbose"]);
        assert!(result.is_err());
    }
}
