//! nextlaunch - track the next rocket launch from a public calendar feed.
//!
//! One `FeedCache` is shared by a `LaunchSelector` per configured rocket
//! name. Every scan interval all selectors refresh and their snapshots
//! are printed to stdout as JSON lines.

mod config;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use futures::future::join_all;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::Config;
use nextlaunch_core::{FeedCache, LaunchSelector, SensorSnapshot};

/// Log file name prefix inside `log_dir`
const LOG_FILE_PREFIX: &str = "nextlaunch.log";

#[derive(Debug, Default)]
struct Args {
    once: bool,
    config: Option<PathBuf>,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let mut parsed = Args::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--once" => parsed.once = true,
                "--config" => {
                    let path = args
                        .next()
                        .ok_or_else(|| anyhow::anyhow!("--config requires a path"))?;
                    parsed.config = Some(PathBuf::from(path));
                }
                other => bail!("Unknown argument: {}", other),
            }
        }
        Ok(parsed)
    }
}

/// Initialize the tracing subscriber for logging.
/// The returned guard must live as long as file logging is wanted.
fn init_tracing(log_dir: Option<&PathBuf>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = Args::parse(std::env::args().skip(1))?;
    let config = Config::load(args.config.as_deref())?;

    let _guard = init_tracing(config.log_dir.as_ref());
    info!(url = %config.feed_url, rockets = ?config.rocket_name, "nextlaunch starting");

    let feed = Arc::new(
        FeedCache::new(config.feed_url.clone()).context("Failed to create HTTP client")?,
    );

    let mut selectors: Vec<LaunchSelector> = config
        .rocket_name
        .iter()
        .map(|name| {
            debug!(rocket = %name, "Sensor device");
            LaunchSelector::new(name, Arc::clone(&feed))
        })
        .collect();

    // Ctrl-C also interrupts a cycle stuck in a slow fetch
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    if args.once {
        tokio::select! {
            result = run_cycle(&mut selectors) => result?,
            _ = &mut shutdown => {}
        }
        return Ok(());
    }

    let mut interval =
        tokio::time::interval(Duration::from_secs(config.scan_interval_minutes * 60));

    loop {
        tokio::select! {
            result = async {
                interval.tick().await;
                run_cycle(&mut selectors).await
            } => result?,
            _ = &mut shutdown => break,
        }
    }

    info!("nextlaunch shutting down");
    Ok(())
}

/// Refresh every selector concurrently and collect their snapshots.
async fn refresh_all(selectors: &mut [LaunchSelector]) -> Vec<SensorSnapshot> {
    join_all(selectors.iter_mut().map(|s| s.refresh())).await;
    selectors.iter().map(LaunchSelector::snapshot).collect()
}

/// One scheduler tick: refresh, then print one JSON line per selector.
async fn run_cycle(selectors: &mut [LaunchSelector]) -> Result<()> {
    for snapshot in refresh_all(selectors).await {
        let line = serde_json::to_string(&snapshot)
            .with_context(|| format!("Failed to serialize {}", snapshot.name))?;
        println!("{}", line);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use nextlaunch_core::{DeviceClass, FeedError, FeedSource};

    const URL: &str = "https://example.test/0.ics";

    /// Answers every fetch with the same document after a delay.
    struct SlowSource {
        body: String,
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl FeedSource for SlowSource {
        async fn fetch(&self, _url: &str) -> Result<String, FeedError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(self.body.clone())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_cycle_updates_every_selector() {
        let source = Arc::new(SlowSource {
            body: concat!(
                "BEGIN:VCALENDAR\r\nVERSION:2.0\r\n",
                "BEGIN:VEVENT\r\nDTSTART:20990101T000000Z\r\nSUMMARY:Falcon 9\r\nEND:VEVENT\r\n",
                "BEGIN:VEVENT\r\nDTSTART:20990102T000000Z\r\nSUMMARY:Electron\r\nEND:VEVENT\r\n",
                "END:VCALENDAR\r\n",
            )
            .to_string(),
            fetches: AtomicUsize::new(0),
        });
        let feed = Arc::new(FeedCache::with_source(URL, source.clone()));
        let mut selectors: Vec<LaunchSelector> = ["Falcon", "Electron", "ALL"]
            .iter()
            .map(|name| LaunchSelector::new(name, Arc::clone(&feed)))
            .collect();

        let snapshots = refresh_all(&mut selectors).await;

        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
        let states: Vec<(&str, &str)> = snapshots
            .iter()
            .map(|s| (s.name.as_str(), s.state.as_str()))
            .collect();
        assert_eq!(
            states,
            vec![
                ("Next Rocket Falcon", "2099-01-01T00:00:00+00:00"),
                ("Next Rocket Electron", "2099-01-02T00:00:00+00:00"),
                ("Next Rocket ALL", "2099-01-01T00:00:00+00:00"),
            ]
        );
        assert!(snapshots.iter().all(|s| s.device_class == DeviceClass::Timestamp));
    }

    fn args(list: &[&str]) -> Result<Args> {
        Args::parse(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_args_default() {
        let parsed = args(&[]).expect("parse");
        assert!(!parsed.once);
        assert!(parsed.config.is_none());
    }

    #[test]
    fn test_args_once_and_config() {
        let parsed = args(&["--once", "--config", "/tmp/nl.json"]).expect("parse");
        assert!(parsed.once);
        assert_eq!(parsed.config, Some(PathBuf::from("/tmp/nl.json")));
    }

    #[test]
    fn test_args_errors() {
        assert!(args(&["--config"]).is_err());
        assert!(args(&["--verbose"]).is_err());
    }
}
