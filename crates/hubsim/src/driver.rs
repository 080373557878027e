//! 🚦 The simulation driver — BUILD → SUBMIT → (local) TRIGGER → DONE.
//!
//! 🎬 COLD OPEN — INT. MISSION CONTROL — T-MINUS ONE INVOCATION
//!
//! Four states. No loops. No retries. Any failure terminates the invocation
//! where it stands, and anything already submitted STAYS submitted — this
//! pipeline is not transactional, it's a catapult. The only suspense comes
//! from two named pauses, inserted because the receiving service processes
//! asynchronously and charges interest on impatience.
//!
//! 🧠 Knowledge graph:
//! - [`SimulationPlan`] — everything the CLI decided: source, target, mode,
//!   count, time, file, project, client flag.
//! - [`run_simulation`] — the state machine. Strictly sequential,
//!   single-invocation, owns the batch exclusively. Concurrency was
//!   considered and politely declined; three POSTs do not need a runtime
//!   topology diagram.
//! - The trigger only fires at a LOCAL target. Staging has its own
//!   processing cron and reacts to outside help the way cats react to
//!   outside help.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDateTime;
use tokio::time::sleep;
use tracing::info;

use crate::app_config::AppConfig;
use crate::batch;
use crate::insight::InsightClient;
use crate::logs::Source;
use crate::transforms;

/// 🎯 Which Insight instance takes the hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Local,
    Staging,
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Local => write!(f, "local"),
            Target::Staging => write!(f, "staging"),
        }
    }
}

/// 🎭 How the batch copies get mutated before submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Identical copies, distinguishable only by their per-copy markers.
    #[default]
    Standard,
    /// Each copy gets a fresh random suffix on its distinguishing field.
    New,
    /// One extra copy aged back 90 days rides along with the fresh ones.
    Resurfaced,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Standard => write!(f, "standard"),
            Mode::New => write!(f, "new"),
            Mode::Resurfaced => write!(f, "resurfaced"),
        }
    }
}

/// 📋 One invocation's worth of decisions, assembled by the CLI.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub source: Source,
    pub target: Target,
    pub mode: Mode,
    /// How many fresh copies to submit. Resurfaced mode adds one on top.
    pub count: usize,
    /// Template stamp time; `None` means now (UTC).
    pub time: Option<NaiveDateTime>,
    /// User-supplied raw log file; `None` means the default template.
    pub file: Option<PathBuf>,
    /// The raw project/service argument, suffix and all (`Cerberus-prod`).
    pub project: Option<String>,
    /// Dress the default Kinesis template as collector-gateway traffic.
    pub as_client: bool,
}

/// 📊 What actually happened, for the CLI's closing table.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub source: Source,
    pub target: Target,
    pub mode: Mode,
    pub copies_submitted: usize,
    pub trigger_fired: bool,
}

/// 🚦 Run one simulation end to end.
///
/// `BUILD → SUBMIT → pause → (local only) TRIGGER → pause → DONE`. The first
/// error anywhere aborts the remaining states; already-submitted copies are
/// not recalled, apologized for, or cleaned up.
pub async fn run_simulation(
    config: &AppConfig,
    plan: &SimulationPlan,
) -> Result<SimulationReport> {
    // 🏗️ BUILD
    let batch = batch::build_batch(config, plan).await?;
    info!(
        copies = batch.len(),
        source = %plan.source,
        target = %plan.target,
        mode = %plan.mode,
        "🏗️ Batch built — proceeding to submission"
    );

    // 🏷️ The trigger wants the bare env (`prod`, not `Cerberus-prod`);
    // decompose the project argument the same way the batch builder did.
    let (_, env) = plan
        .project
        .as_deref()
        .map(|project| transforms::get_service_env(project, &config.service_suffixes))
        .unwrap_or_default();

    // 📮 SUBMIT
    let client = InsightClient::new(config, plan.target)?;
    let submission = client.submit_batch(plan.source, &batch).await?;
    named_pause("post-submit", config.post_submit_pause_ms).await;

    // ⚙️ TRIGGER — local runs only.
    let trigger_fired = match plan.target {
        Target::Local => {
            client.trigger_processing(&env, plan.source).await?;
            named_pause("post-trigger", config.post_trigger_pause_ms).await;
            true
        }
        Target::Staging => {
            info!("⏭️ Staging target — skipping the processing trigger, the cron has it");
            false
        }
    };

    Ok(SimulationReport {
        source: plan.source,
        target: plan.target,
        mode: plan.mode,
        copies_submitted: submission.submitted,
        trigger_fired,
    })
}

/// 😴 One named, unconditional pause. Not an event-driven wait — the
/// receiving service offers no signal to wait ON, so we sleep the documented
/// amount and trust the lag. Zero milliseconds means tests skip the nap.
async fn named_pause(name: &str, ms: u64) {
    if ms == 0 {
        return;
    }
    info!(pause = name, ms, "😴 Named pause — letting the backend catch its breath");
    sleep(Duration::from_millis(ms)).await;
}
