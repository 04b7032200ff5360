//! Command implementations

use crate::generate;
use anyhow::bail;
use gfe_foundation::{FailurePolicy, GfeConfig, Placement, ProgressCounter};
use gfe_task::{BatchReport, GenerationBatch, Origin, WorkError};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// Arguments of `gfe generate`
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub width: u32,
    pub height: u32,
    pub cores: u32,
    pub output: PathBuf,
    /// Placements whose work item reports a bad region
    pub failing: Vec<Placement>,
    pub report: Option<PathBuf>,
}

/// JSON report written by `--report`
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub policy: FailurePolicy,
    pub completed: Vec<Placement>,
    pub failed: Vec<FailedPlacement>,
}

#[derive(Debug, Serialize)]
pub struct FailedPlacement {
    pub placement: Placement,
    pub error: String,
    pub origin: Origin,
    pub panicked: bool,
}

impl RunSummary {
    fn from_report(policy: FailurePolicy, report: &BatchReport<Placement>) -> Self {
        Self {
            policy,
            completed: report.completed.clone(),
            failed: report
                .failed
                .iter()
                .map(|(placement, failure)| FailedPlacement {
                    placement: *placement,
                    error: format!("{:#}", failure),
                    origin: failure.origin().clone(),
                    panicked: failure.is_panic(),
                })
                .collect(),
        }
    }
}

/// Run one generation pass over the requested grid
pub fn run_generate(config: &GfeConfig, request: &GenerateRequest) -> anyhow::Result<()> {
    let Some(placements) = generate::grid(request.width, request.height, request.cores) else {
        bail!(
            "grid of {}x{} chips with {} cores is too large",
            request.width,
            request.height,
            request.cores
        );
    };
    if placements.is_empty() {
        bail!("nothing to generate: the grid has no placements");
    }
    if let Some(outside) = request.failing.iter().find(|p| !placements.contains(p)) {
        bail!("--fail {} is outside the grid", outside);
    }
    fs::create_dir_all(&request.output)?;

    let progress = Arc::new(ProgressCounter::new(
        "Generating data specifications",
        placements.len() as u64,
    ));
    let policy = config.batch.failure_policy;

    let mut batch = GenerationBatch::from_config(progress.clone(), config);
    for placement in placements {
        let output = request.output.clone();
        let fails = request.failing.contains(&placement);
        batch.add(placement, move || {
            if fails {
                return Err(WorkError::msg(format!("bad region for {}", placement)));
            }
            generate::write_data_spec(&output, &placement)
        });
    }

    let report = match batch.run() {
        Ok(report) => report,
        Err(e) => {
            if let Some(origin) = e.origin() {
                error!("Generation aborted: {} (at {})", e, origin);
            }
            return Err(e.into());
        }
    };

    for (placement, failure) in &report.failed {
        error!("{}: {} (at {})", placement, failure, failure.origin());
    }
    info!(
        "{}/{} data specifications written to {}",
        progress.count(),
        report.total(),
        request.output.display()
    );

    if let Some(path) = &request.report {
        write_summary(path, &RunSummary::from_report(policy, &report))?;
    }

    if !report.is_success() {
        bail!(
            "{} of {} placements failed",
            report.failed.len(),
            report.total()
        );
    }
    Ok(())
}

fn write_summary(path: &Path, summary: &RunSummary) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json)?;
    info!("Report written to {}", path.display());
    Ok(())
}

/// Effective configuration as TOML
pub fn render_config(config: &GfeConfig) -> anyhow::Result<String> {
    Ok(toml::to_string(config)?)
}
