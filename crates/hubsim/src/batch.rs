//! 📦 Batch construction — one template log, `count` deep copies, assorted lies.
//!
//! 🎬 COLD OPEN — INT. CLONE FACILITY — PRODUCTION FLOOR
//!
//! One normalized error log stands on a pedestal. The machine hums. Out come
//! `count` identical copies — except they're NOT identical, because each one
//! gets a fresh random hex fragment stamped into its stacktrace, and in
//! `new` mode a fresh suffix bolted onto its distinguishing field. Identical
//! twins with different tattoos. The ingestion endpoint deduplicates by
//! content, and we are in the business of defeating that on purpose.
//!
//! 🧠 Knowledge graph:
//! - [`build_batch`] — the whole pipeline: load (file or template) → stamp →
//!   normalize → mutate per mode → replicate.
//! - [`populate_default_gcp_log`] / [`populate_default_kinesis_log`] — stamp
//!   a hollow template with time + service before normalization.
//! - `new` mode: fresh random suffix per copy on `resource` (GCP) /
//!   `exception.message` (Kinesis).
//! - `resurfaced` mode: ONE extra copy aged back 90 days rides along with the
//!   `count` fresh ones. ⚠️ Known limitation, faithfully preserved: these
//!   aged copies do not currently tickle the intended "resurfaced" code path
//!   on the receiving service. We build the batch as documented and make no
//!   promises about downstream enlightenment.
//! - Every copy, every mode: the `"x"` placeholder run in the Kinesis
//!   stacktrace is replaced with fresh hex, so batch members stay
//!   distinguishable even when otherwise identical.

use std::path::Path;

use chrono::{Duration, NaiveDateTime, Utc};
use rand::Rng;
use serde_json::json;
use tracing::debug;

use crate::app_config::AppConfig;
use crate::driver::{Mode, SimulationPlan};
use crate::errors::SimulateError;
use crate::logs::{ErrorLog, GcpRawLog, KinesisRawLog, RawLog, Source};
use crate::transforms::{self, kinesis::COLLECTION_GATEWAY};

/// 🏷️ The placeholder run in template stacktraces that gets swapped for
/// fresh hex on every copy. Seven x's. Not six. Not eight. Seven.
pub(crate) const STACKTRACE_MARKER: &str = "xxxxxxx";

/// 🏷️ The distinguishing value stamped into default templates — the raw
/// `resource` for GCP, the raw `exception.message` for Kinesis. Historical
/// string; changing it would orphan a decade of staging fixtures.
const DEFAULT_DISTINGUISHER: &str = "context@type";

/// 📐 Template timestamp format: ISO-ish with six-digit micros and a `Z`.
const RAW_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";
/// 📐 Canonical GCP `_time` format (same wire shape, parsed leniently).
const GCP_TIME_PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";
/// 📐 Canonical Kinesis `time` format.
const KINESIS_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// 🏗️ Build the full batch of error logs to submit.
///
/// 1. Load the raw log: user file when given (💀 `File` if missing, `Parse`
///    if the JSON is decorative), else the per-source default template
///    stamped with the invocation time and service.
/// 2. Normalize ONCE into the template [`ErrorLog`].
/// 3. Replicate into `count` deep copies, mutating per mode; `resurfaced`
///    appends one extra aged copy on top.
pub async fn build_batch(
    config: &AppConfig,
    plan: &SimulationPlan,
) -> anyhow::Result<Vec<ErrorLog>> {
    // 🏷️ Decompose the project argument once; the same (service, env) pair
    // feeds both template stamping and normalization, so a derived pair
    // re-applied reproduces the original string. No characters lost in
    // transit. We count them. 🔢
    let (service, env) = plan
        .project
        .as_deref()
        .map(|project| transforms::get_service_env(project, &config.service_suffixes))
        .unwrap_or_default();

    let raw = match &plan.file {
        Some(path) => load_raw_log(path, plan.source).await?,
        None => {
            let stamp = plan.time.unwrap_or_else(|| Utc::now().naive_utc());
            let mut raw = load_raw_log(config.template_path(plan.source), plan.source).await?;
            match &mut raw {
                RawLog::Gcp(gcp) => populate_default_gcp_log(gcp, stamp, &service),
                RawLog::Kinesis(kinesis) => {
                    populate_default_kinesis_log(kinesis, stamp, &service, plan.as_client)
                }
            }
            raw
        }
    };

    // 🔄 Normalize once. When simulating collector traffic we deliberately
    // withhold the service override so the gateway unmasking path actually
    // runs — that's the whole point of --client.
    let override_service = if plan.as_client { "" } else { service.as_str() };
    let template = transforms::normalize(raw, override_service, &env)?;

    let batch = replicate(&template, plan)?;
    debug!(
        copies = batch.len(),
        source = %plan.source,
        "📦 Batch assembled — the clones are ready and each one thinks it's special"
    );
    Ok(batch)
}

/// 📂 Read and parse one raw log file for the given source.
///
/// 💀 A missing file is a `File` error, garbage content is a `Parse` error —
/// distinct failures, distinct messages, zero guessing at 3am.
pub(crate) async fn load_raw_log(path: &Path, source: Source) -> anyhow::Result<RawLog> {
    let shown = path.display().to_string();
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|_| SimulateError::File { path: shown.clone() })?;

    let raw = match source {
        Source::Gcp => RawLog::Gcp(
            serde_json::from_str::<GcpRawLog>(&contents)
                .map_err(|_| SimulateError::Parse { path: shown.clone() })?,
        ),
        Source::Kinesis => RawLog::Kinesis(
            serde_json::from_str::<KinesisRawLog>(&contents)
                .map_err(|_| SimulateError::Parse { path: shown.clone() })?,
        ),
    };
    Ok(raw)
}

/// 🖋️ Stamp a hollow GCP template with identity and time.
pub fn populate_default_gcp_log(raw: &mut GcpRawLog, timestamp: NaiveDateTime, service: &str) {
    raw.app_id = format!("s~{service}");
    raw.end_time = timestamp.format(RAW_TIMESTAMP_FORMAT).to_string();
    raw.resource = DEFAULT_DISTINGUISHER.to_string();
}

/// 🖋️ Stamp a hollow Kinesis template with identity and time.
///
/// With `as_client`, the template impersonates the front-end collector: the
/// service name becomes the gateway and the REAL service hides in
/// `metadata.app_name`, exactly the disguise the normalizer knows how to
/// remove. Simulation all the way down.
pub fn populate_default_kinesis_log(
    raw: &mut KinesisRawLog,
    timestamp: NaiveDateTime,
    service: &str,
    as_client: bool,
) {
    raw.exception.message = DEFAULT_DISTINGUISHER.to_string();
    raw.timestamp = timestamp.format(RAW_TIMESTAMP_FORMAT).to_string();
    if as_client {
        raw.service.name = COLLECTION_GATEWAY.to_string();
        raw.metadata.insert("app_name".to_string(), json!(service));
    } else {
        raw.service.name = service.to_string();
    }
}

/// 🔄 Produce the deep copies, each one made content-distinct.
fn replicate(template: &ErrorLog, plan: &SimulationPlan) -> Result<Vec<ErrorLog>, SimulateError> {
    let mut batch = Vec::with_capacity(plan.count + 1);

    for _ in 0..plan.count {
        let mut copy = template.clone();
        if plan.mode == Mode::New {
            // 🆕 Fresh suffix per copy, per iteration. Not one suffix shared
            // across the batch — EACH copy gets its own. Snowflakes, but
            // deliberate ones.
            append_fresh_suffix(&mut copy);
        }
        refresh_stacktrace_marker(&mut copy);
        batch.push(copy);
    }

    if plan.mode == Mode::Resurfaced {
        // 🧟 One aged copy, 90 days in the past, riding along with the
        // fresh ones to poke the revival logic downstream. (Whether it
        // actually wakes anything up is a separate, documented sadness.)
        let mut aged = template.clone();
        age_back(&mut aged, Duration::days(90))?;
        refresh_stacktrace_marker(&mut aged);
        batch.push(aged);
    }

    Ok(batch)
}

/// 🆕 Append a fresh random suffix to the copy's distinguishing field.
fn append_fresh_suffix(log: &mut ErrorLog) {
    let suffix = random_hex(7);
    match log {
        ErrorLog::Gcp(gcp) => {
            gcp.resource = format!("{}-{suffix}", gcp.resource);
        }
        ErrorLog::Kinesis(kinesis) => {
            kinesis.exception.message = format!("{}-{suffix}", kinesis.exception.message);
        }
    }
}

/// 🎲 Swap the `"x"` placeholder run in the Kinesis stacktrace for fresh
/// hex. GCP copies carry no marker field, so they pass through unbothered.
fn refresh_stacktrace_marker(log: &mut ErrorLog) {
    if let ErrorLog::Kinesis(kinesis) = log {
        if kinesis.exception.stacktrace.contains(STACKTRACE_MARKER) {
            kinesis.exception.stacktrace = kinesis
                .exception
                .stacktrace
                .replacen(STACKTRACE_MARKER, &random_hex(STACKTRACE_MARKER.len()), 1);
        }
    }
}

/// 🕰️ Set a copy's time field back by `age` — the resurfaced time machine.
///
/// 💀 `Format` error if the template's own time field doesn't parse, which
/// would mean the normalizer emitted something it shouldn't have. If you
/// ever see this error, the call is coming from inside the house.
fn age_back(log: &mut ErrorLog, age: Duration) -> Result<(), SimulateError> {
    match log {
        ErrorLog::Gcp(gcp) => {
            let parsed = NaiveDateTime::parse_from_str(&gcp.time, GCP_TIME_PARSE_FORMAT)
                .map_err(|_| SimulateError::Format {
                    value: gcp.time.clone(),
                })?;
            gcp.time = (parsed - age).format(RAW_TIMESTAMP_FORMAT).to_string();
        }
        ErrorLog::Kinesis(kinesis) => {
            let parsed = NaiveDateTime::parse_from_str(&kinesis.time, KINESIS_TIME_FORMAT)
                .map_err(|_| SimulateError::Format {
                    value: kinesis.time.clone(),
                })?;
            kinesis.time = (parsed - age).format(KINESIS_TIME_FORMAT).to_string();
        }
    }
    Ok(())
}

/// 🎲 A fresh lowercase hex fragment of the requested length.
pub(crate) fn random_hex(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| char::from_digit(rng.random_range(0..16u32), 16).unwrap_or('f'))
        .collect()
}

/// 🕰️ Parse the CLI's `-t TIME` argument, accepting the shapes people
/// actually type: ISO with or without fraction/`Z`, or the space-separated
/// classic. 💀 `Format` error otherwise, with the rejected string attached.
pub fn parse_time_flag(value: &str) -> Result<NaiveDateTime, SimulateError> {
    const ACCEPTED: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.fZ",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
    ];
    ACCEPTED
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| SimulateError::Format {
            value: value.to_string(),
        })
}
