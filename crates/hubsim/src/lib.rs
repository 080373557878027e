//! 🔭 hubsim — simulate Hubble error logs against an Insight instance.
//!
//! One invocation = one batch: build a raw log (default template or user
//! file), normalize it into the canonical ingestion shape, replicate it
//! `count` times with per-copy distinguishing mutations, POST every copy at
//! the ingestion endpoint, and — for local runs — fire the processing
//! trigger so the backend actually looks at the mess we made.
//!
//! The pipeline is strictly sequential and strictly one-shot. Nothing
//! persists past the invocation except regret and, ideally, some freshly
//! ingested errors on the staging dashboard.

pub mod app_config;
pub mod batch;
pub mod driver;
pub mod errors;
pub mod insight;
pub mod logs;
pub mod transforms;

use anyhow::{Context, Result};

pub use app_config::{AppConfig, load_config};
pub use driver::{Mode, SimulationPlan, SimulationReport, Target};
pub use errors::SimulateError;
pub use logs::Source;

/// 🚀 Run one simulation. The CLI's single entry point into the library.
pub async fn run(app_config: AppConfig, plan: SimulationPlan) -> Result<SimulationReport> {
    driver::run_simulation(&app_config, &plan)
        .await
        .context("Simulation run failed")
}
