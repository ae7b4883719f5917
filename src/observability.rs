use biometrics::{Collector, Counter, Moments};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::error::{Error, Result};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("groqchat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("groqchat.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("groqchat.client.request_duration_seconds");

pub(crate) static STREAM_CHUNKS: Counter = Counter::new("groqchat.stream.chunks");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("groqchat.stream.errors");
pub(crate) static STREAM_TTFB: Moments = Moments::new("groqchat.stream.ttfb_seconds");
pub(crate) static STREAM_DURATION: Moments = Moments::new("groqchat.stream.duration_seconds");

pub(crate) static STORE_APPENDS: Counter = Counter::new("groqchat.store.appends");
pub(crate) static STORE_ERRORS: Counter = Counter::new("groqchat.store.errors");
pub(crate) static STORE_CONNECT_RETRIES: Counter = Counter::new("groqchat.store.connect_retries");

pub(crate) static TURNS_COMPLETED: Counter = Counter::new("groqchat.session.turns_completed");
pub(crate) static TURNS_INTERRUPTED: Counter = Counter::new("groqchat.session.turns_interrupted");
pub(crate) static TURNS_FAILED: Counter = Counter::new("groqchat.session.turns_failed");

pub(crate) static EXPORTS: Counter = Counter::new("groqchat.export.files");
pub(crate) static EXPORT_ERRORS: Counter = Counter::new("groqchat.export.errors");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_CHUNKS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_moments(&STREAM_TTFB);
    collector.register_moments(&STREAM_DURATION);

    collector.register_counter(&STORE_APPENDS);
    collector.register_counter(&STORE_ERRORS);
    collector.register_counter(&STORE_CONNECT_RETRIES);

    collector.register_counter(&TURNS_COMPLETED);
    collector.register_counter(&TURNS_INTERRUPTED);
    collector.register_counter(&TURNS_FAILED);

    collector.register_counter(&EXPORTS);
    collector.register_counter(&EXPORT_ERRORS);
}

/// Installs the stderr log subscriber used by the binaries.
///
/// Logs at WARN, or DEBUG when `verbose` is set.
pub fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|err| Error::configuration(format!("cannot install log subscriber: {err}")))
}
