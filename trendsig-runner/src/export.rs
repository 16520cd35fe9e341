//! Artifact export: per-bar signals CSV, events JSON, run manifest.
//!
//! All JSON artifacts carry a `schema_version` field. Unknown versions
//! are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use trendsig_core::data::DataSource;
use trendsig_core::domain::{CompositeSignal, CrossoverEvent};
use trendsig_core::signals::SignalConfig;
use trendsig_core::DataNotice;

use crate::runner::{SignalRun, SCHEMA_VERSION};

/// Run summary written as `manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub schema_version: u32,
    pub symbol: String,
    pub interval: String,
    pub config_hash: String,
    pub dataset_hash: String,
    pub source: DataSource,
    pub signal: SignalConfig,
    pub bar_count: usize,
    pub event_count: usize,
    pub latest_signal: Option<CompositeSignal>,
    pub notices: Vec<DataNotice>,
}

impl Manifest {
    pub fn from_run(run: &SignalRun) -> Self {
        Self {
            schema_version: run.schema_version,
            symbol: run.symbol.clone(),
            interval: run.interval.clone(),
            config_hash: run.config_hash.clone(),
            dataset_hash: run.dataset_hash.clone(),
            source: run.source,
            signal: run.report.config.clone(),
            bar_count: run.bar_count,
            event_count: run.report.events.len(),
            latest_signal: run.report.latest_signal().map(|(_, s)| s),
            notices: run.report.notices.clone(),
        }
    }
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_manifest_json(run: &SignalRun) -> Result<String> {
    serde_json::to_string_pretty(&Manifest::from_run(run))
        .context("failed to serialize manifest to JSON")
}

/// Deserialize a manifest, rejecting unknown schema versions.
pub fn import_manifest_json(json: &str) -> Result<Manifest> {
    let manifest: Manifest =
        serde_json::from_str(json).context("failed to deserialize manifest from JSON")?;
    if manifest.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            manifest.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(manifest)
}

pub fn export_events_json(events: &[CrossoverEvent]) -> Result<String> {
    serde_json::to_string_pretty(events).context("failed to serialize events to JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Per-bar signal table.
///
/// Columns: timestamp, close, fast_trend, fast_direction, slow_trend,
/// slow_direction, composite, position_change. Undefined values are empty.
pub fn export_signals_csv(run: &SignalRun) -> Result<String> {
    let report = &run.report;
    let changes = report.position_changes();
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "timestamp",
        "close",
        "fast_trend",
        "fast_direction",
        "slow_trend",
        "slow_direction",
        "composite",
        "position_change",
    ])?;

    for (i, bar) in run.bars.iter().enumerate() {
        let fast = report.fast.states[i];
        let slow = report.slow.as_ref().and_then(|s| s.states[i]);
        wtr.write_record([
            bar.timestamp.to_rfc3339(),
            bar.close_value().map(|c| format!("{c:.6}")).unwrap_or_default(),
            fast.map(|s| format!("{:.6}", s.trend_value)).unwrap_or_default(),
            fast.map(|s| format!("{:?}", s.direction)).unwrap_or_default(),
            slow.map(|s| format!("{:.6}", s.trend_value)).unwrap_or_default(),
            slow.map(|s| format!("{:?}", s.direction)).unwrap_or_default(),
            report.composite[i]
                .map(|c| c.as_i8().to_string())
                .unwrap_or_default(),
            changes[i].map(|d| d.to_string()).unwrap_or_default(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

pub fn write_signals_csv(run: &SignalRun, path: &Path) -> Result<()> {
    std::fs::write(path, export_signals_csv(run)?)
        .with_context(|| format!("failed to write {}", path.display()))
}

pub fn write_events_json(events: &[CrossoverEvent], path: &Path) -> Result<()> {
    std::fs::write(path, export_events_json(events)?)
        .with_context(|| format!("failed to write {}", path.display()))
}

pub fn write_manifest_json(run: &SignalRun, path: &Path) -> Result<()> {
    std::fs::write(path, export_manifest_json(run)?)
        .with_context(|| format!("failed to write {}", path.display()))
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a run.
///
/// Creates `{symbol}_{config hash prefix}/` under `output_dir` containing
/// `signals.csv`, `events.json` and `manifest.json`. Re-running the same
/// configuration overwrites the same directory.
pub fn save_artifacts(run: &SignalRun, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(format!("{}_{}", sanitize(&run.symbol), run.short_id()));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    write_signals_csv(run, &run_dir.join("signals.csv"))?;
    write_events_json(&run.report.events, &run_dir.join("events.json"))?;
    write_manifest_json(run, &run_dir.join("manifest.json"))?;

    tracing::info!(dir = %run_dir.display(), "artifacts saved");
    Ok(run_dir)
}

/// Exchange-prefixed symbols such as `NSE:SBIN-EQ` are not valid path names everywhere.
fn sanitize(symbol: &str) -> String {
    symbol
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect()
}
