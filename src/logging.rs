//! Tracing setup. Everything at ERROR level is also appended to the error
//! log file whose newest line the console dashboard shows.

use std::{
    fs::{self, OpenOptions},
    io::SeekFrom,
    path::Path,
    sync::Mutex,
};

use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use crate::config::LoggingConfig;

const TAIL_WINDOW: u64 = 4096;

pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    let path = Path::new(&config.error_log_path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let error_log = OpenOptions::new().create(true).append(true).open(path)?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "beacon=debug,tower_http=debug,axum=debug".into()),
        )
        .with(fmt::layer())
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(error_log))
                .with_filter(LevelFilter::ERROR),
        )
        .try_init()?;

    Ok(())
}

/// Newest non-empty line of the error log, if the file exists. Only the end
/// of the file is read; the window doubles until it holds the whole line.
pub async fn last_error_line(path: &str) -> Option<String> {
    let mut file = tokio::fs::File::open(path).await.ok()?;
    let len = file.metadata().await.ok()?.len();
    let mut window = TAIL_WINDOW;

    loop {
        let start = len.saturating_sub(window);
        file.seek(SeekFrom::Start(start)).await.ok()?;

        let mut tail = Vec::with_capacity((len - start) as usize);
        file.read_to_end(&mut tail).await.ok()?;

        let text = String::from_utf8_lossy(&tail);
        let text = text.trim_end();

        match text.rfind('\n') {
            Some(pos) => return Some(text[pos + 1..].trim().to_string()),
            None if start == 0 => {
                return (!text.is_empty()).then(|| text.trim().to_string());
            }
            None => window = window.saturating_mul(2),
        }
    }
}
