use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::poller::history::HistoryBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Tsv,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "txt",
        }
    }
}

/// Writes one motor's retained history to `dir`, one row per entry with
/// columns Index, Temperature, Voltage. Returns the written path, named
/// `motor_{id}_data_{timestamp}.{csv,txt}`.
pub fn export_history(
    dir: &Path,
    motor_id: i32,
    history: &HistoryBuffer,
    format: ExportFormat,
    stamp: DateTime<Utc>,
) -> Result<PathBuf> {
    let filename = format!(
        "motor_{motor_id}_data_{}.{}",
        stamp.format("%Y%m%d_%H%M%S"),
        format.extension()
    );
    let path = dir.join(filename);

    match format {
        ExportFormat::Csv => {
            let mut writer = csv::Writer::from_path(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            writer.write_record(["Index", "Temperature", "Voltage"])?;
            for (index, sample) in history.iter().enumerate() {
                writer.write_record([
                    index.to_string(),
                    sample.temperature.to_string(),
                    sample.voltage.to_string(),
                ])?;
            }
            writer.flush()?;
        }
        ExportFormat::Tsv => {
            let mut file = std::fs::File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            writeln!(file, "Index\tTemperature\tVoltage")?;
            for (index, sample) in history.iter().enumerate() {
                writeln!(
                    file,
                    "{index}\t{:.2}\t{:.2}",
                    sample.temperature, sample.voltage
                )?;
            }
        }
    }

    Ok(path)
}
