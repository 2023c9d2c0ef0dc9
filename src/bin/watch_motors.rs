use anyhow::Result;
use clap::Parser;
use motor_server_rs::export::{self, ExportFormat};
use motor_server_rs::poller::client::HistoryClient;
use motor_server_rs::poller::{capacity_from_minutes, MotorPoller, PollerEvent, PollerSettings};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "watch-motors",
    version,
    about = "Headless dashboard poller for motor-server-rs"
)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    base_url: String,
    #[arg(long, default_value_t = 4)]
    motors: i32,
    #[arg(long, default_value_t = 1)]
    interval_seconds: u64,
    /// Rolling history capacity in entries.
    #[arg(long, default_value_t = 300)]
    history: usize,
    /// Rolling history as minutes at the one-second cadence; overrides --history.
    #[arg(long)]
    history_minutes: Option<u64>,
    /// Export each motor's retained history here on shutdown.
    #[arg(long)]
    export_dir: Option<PathBuf>,
    /// Export flavour: csv or txt.
    #[arg(long, default_value = "csv")]
    export_format: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let capacity = args
        .history_minutes
        .map(capacity_from_minutes)
        .unwrap_or_else(|| args.history.max(1));
    let settings = PollerSettings {
        interval: Duration::from_secs(args.interval_seconds.max(1)),
        history_capacity: capacity,
    };
    let (_settings_tx, settings_rx) = watch::channel(settings);
    let (events_tx, mut events_rx) = mpsc::channel(64);

    let motor_ids: Vec<i32> = (1..=args.motors.max(1)).collect();
    let poller = MotorPoller::new(
        HistoryClient::new(&args.base_url),
        motor_ids.clone(),
        settings_rx,
        events_tx,
    );
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(poller.run(cancel.clone()));
    tracing::info!(
        base_url = %args.base_url,
        motors = args.motors,
        history_capacity = capacity,
        "watching motors"
    );

    loop {
        tokio::select! {
            event = events_rx.recv() => {
                match event {
                    Some(PollerEvent::DataReady { motor_id, sample }) => {
                        tracing::info!(
                            motor_id,
                            temperature = sample.temperature,
                            voltage = sample.voltage,
                            "sample"
                        );
                    }
                    Some(PollerEvent::AlertsChanged { motor_id, raised, cleared }) => {
                        tracing::warn!(motor_id, ?raised, ?cleared, "alerts changed");
                    }
                    Some(PollerEvent::NotificationOpened(notification)) => {
                        tracing::warn!(
                            motor_id = notification.motor_id,
                            kinds = ?notification.kinds,
                            "alert notification opened"
                        );
                    }
                    Some(PollerEvent::NotificationClosed) => {
                        tracing::info!("alert notification closed");
                    }
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown signal received");
                break;
            }
        }
    }

    // Dropping the receiver unblocks any in-flight event send; cancellation
    // then stops the loop at the next scheduling point.
    drop(events_rx);
    cancel.cancel();
    let state = handle.await?;

    if let Some(dir) = args.export_dir {
        std::fs::create_dir_all(&dir)?;
        let format = match args.export_format.as_str() {
            "txt" | "tsv" => ExportFormat::Tsv,
            _ => ExportFormat::Csv,
        };
        for motor_id in motor_ids {
            let Some(history) = state.history(motor_id) else {
                continue;
            };
            if history.is_empty() {
                continue;
            }
            let path = export::export_history(&dir, motor_id, history, format, chrono::Utc::now())?;
            tracing::info!(motor_id, path = %path.display(), "exported history");
        }
    }

    Ok(())
}
