#![warn(clippy::all)]

use foodgram::config::Config;
use tracing::{error, trace_span};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry};

#[tokio::main]
async fn main() {
    let stdout_log = tracing_subscriber::fmt::layer().with_span_events(FmtSpan::CLOSE);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = Registry::default().with(stdout_log).with(filter);

    tracing::subscriber::set_global_default(subscriber).expect("Unable to set global subscriber");

    let config = {
        let span = trace_span!("loading config");
        let _guard = span.enter();
        Config::load().expect("Invalid configuration")
    };

    if let Err(e) = foodgram::start_server(config).await {
        error!("Server failed: {e}");
        std::process::exit(1);
    }
}
