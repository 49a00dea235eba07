use tracing::Level;
use tracing_subscriber::fmt;

/// Installs the stderr subscriber. Warnings always show; `verbose` adds the
/// per-image segmentation and formatting records.
pub fn init(verbose: bool) {
    let max_level = if verbose { Level::DEBUG } else { Level::WARN };
    let _ = fmt()
        .with_writer(std::io::stderr)
        .with_max_level(max_level)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .try_init();
}
