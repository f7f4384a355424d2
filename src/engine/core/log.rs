use anyhow::Result;
use chrono::Local;
use std::io::Write;
use tracing::Level;

/// Install the stderr subscriber. Safe to call more than once; later calls are ignored.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Write debug log to ffplan.log in current directory
/// Appends to file, creating it if needed
pub fn write_debug_log(message: &str) -> Result<()> {
    use std::fs::OpenOptions;

    let log_path = std::env::current_dir()?.join("ffplan.log");
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    writeln!(file, "[{}] {}", timestamp, message)?;
    Ok(())
}
