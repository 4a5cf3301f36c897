use std::{io, str::FromStr};

use tracing::{warn, Level};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{filter, fmt};

const CRATE_TARGET: &str = "jazz_nyc_lib";
const BIN_TARGET: &str = "jazz_nyc";

/// Installs the global subscriber. Our own targets log at `level`,
/// dependencies at `WARN`.
pub fn init(level: &str) {
    let parsed = Level::from_str(level.trim());
    let crate_level = parsed.as_ref().copied().unwrap_or(Level::INFO);

    let filter = filter::Targets::new()
        .with_target(CRATE_TARGET, crate_level)
        .with_target(BIN_TARGET, crate_level)
        .with_target("tower_http", crate_level)
        .with_default(Level::WARN);

    let initialised = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stdout))
        .try_init();

    if initialised.is_err() {
        return;
    }
    if parsed.is_err() {
        warn!("Unknown log level '{level}'. Continuing with INFO.");
    }
}
