pub mod link;
pub mod profiles;
pub mod run;
pub mod script;

use std::fmt::Display;
use std::path::Path;

use phosphor_core::AppConfig;

/// Set up `env_logger` from `RUST_LOG`.
///
/// The TUI owns the terminal, so without a log file it logs nothing by
/// default; every other command defaults to warnings on stderr.
pub fn init_logging(log_file: Option<&Path>, tui: bool) {
    let default = default_filter(log_file.is_some(), tui);
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default));
    if let Some(path) = log_file {
        match std::fs::File::create(path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => eprintln!("Warning: cannot open log file {}: {e}", path.display()),
        }
    }
    let _ = builder.try_init();
}

fn default_filter(has_log_file: bool, tui: bool) -> &'static str {
    if tui && !has_log_file { "off" } else { "warn" }
}

/// Load the config at `path`, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> phosphor_core::Result<AppConfig> {
    match path {
        Some(p) => AppConfig::load(p),
        None => Ok(AppConfig::default()),
    }
}

/// Print `Error: ...` and exit 1.
pub fn fail(e: impl Display) -> ! {
    eprintln!("Error: {e}");
    std::process::exit(1)
}
