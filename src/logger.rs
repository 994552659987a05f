use tracing_subscriber::EnvFilter;

/// How chatty the run should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Summary and errors only
    Quiet,
    #[default]
    Normal,
    /// Every policy decision is logged
    Verbose,
}

impl Verbosity {
    pub fn is_quiet(self) -> bool {
        self == Verbosity::Quiet
    }

    fn default_directive(self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "info",
            Verbosity::Verbose => "debug",
        }
    }
}

/// Installs the global tracing subscriber. Diagnostics go to stderr so stdout
/// stays clean for the report (and for `--json`). `RUST_LOG` wins over `verbosity`.
pub fn init(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.default_directive()));

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();

    if let Err(e) = result {
        eprintln!("Warning: Failed to install log subscriber: {}", e);
    }
}
