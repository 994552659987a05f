pub mod batch;
pub mod cli;
pub mod codec;
pub mod config;
pub mod constants;
pub mod error;
pub mod ffmpeg;
pub mod formats;
pub mod image_codec;
pub mod logger;
pub mod policy;
pub mod report;
pub mod scanner;
pub mod stats;
pub mod utils;

pub use batch::{convert_all, BatchDriver};
pub use codec::{Codec, MediaCodec, MediaProbe};
pub use config::{Config, Discovery};
pub use error::{ConvertError, Result};
pub use formats::{MediaKind, OutputFormat};
pub use policy::{ConversionPolicy, Decision, EncodeParams, FileTask, SkipReason};
pub use report::{ConsoleReporter, JsonReporter, Reporter};
pub use stats::{ConversionOutcome, RunStatistics};
