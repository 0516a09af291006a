//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! Behavior:
//! - LOG_LEVEL controls the filter (e.g. "debug" or detailed directives like
//!   "info,progress=debug,quiz=info,tower_http=info"). Unset or unparseable
//!   values fall back to `DEFAULT_FILTER`.
//! - LOG_FORMAT selects "pretty" (default) or "json" structured logs.
//!
//! Targets used across the service: `learnpath` (lifecycle, store, errors),
//! `progress` (XP and course progress), `quiz` (scoring) and `ranking`.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str =
    "info,learnpath=debug,progress=debug,quiz=info,ranking=info,tower_http=info,axum=info";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// Anything other than "json" (case-insensitive) is pretty.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let format = LogFormat::parse(std::env::var("LOG_FORMAT").ok().as_deref());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // The json and pretty builders are different types.
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
