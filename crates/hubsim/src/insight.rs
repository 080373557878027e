//! 📡 The Insight client — where the simulated errors leave the building.
//!
//! 🎬 COLD OPEN — INT. LOADING DOCK — THE WIRE BOUNDARY
//!
//! Every error log in the batch gets the same send-off: serialized to JSON,
//! zipped into a base64 tuxedo, wrapped in a `{"data": [...]}` envelope, and
//! POSTed at the ingestion endpoint with two session cookies for ID. Then,
//! for local runs only, one more POST knocks on `/tasks/process_errors` and
//! asks the backend to please look at what we just delivered.
//!
//! 🧠 Knowledge graph:
//! - [`InsightClient`] — pure I/O, zero buffering, zero retries. Build the
//!   batch elsewhere; this module just fires it.
//! - Success = HTTP 200 for EVERY element. A single 403 aborts the whole
//!   batch on sight ([`SimulateError::Auth`]); any other non-200 is
//!   [`SimulateError::Transport`] with status + body attached. No retry.
//!   Retries are the caller's problem. The caller has decided not to have
//!   this problem either. Partial submission is a documented outcome.
//! - [`create_url`] — params in sorted key order, no trailing separator.
//!   (The previous generation of this helper left a lonely `&` dangling at
//!   the end of every query string. It has been spoken to.)

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::Utc;
use tracing::{debug, trace};

use crate::app_config::AppConfig;
use crate::driver::Target;
use crate::errors::SimulateError;
use crate::logs::{ErrorLog, Source};

/// 📐 Form timestamp format for the processing-trigger window.
const TRIGGER_WINDOW_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.000-00:00";

/// ⏱️ Half-width of the processing window, in seconds. The trigger asks the
/// backend to look at `[now-60s, now+60s]`, generously bracketing whatever
/// we just submitted.
const TRIGGER_WINDOW_SECONDS: i64 = 60;

/// 🔗 Join base + path, with optional query params in sorted key order and
/// no trailing separator. `create_url(base, path, &{})` is just `base+path`.
pub fn create_url(base: &str, path: &str, params: &BTreeMap<String, String>) -> String {
    if params.is_empty() {
        return format!("{base}{path}");
    }
    // 🔤 BTreeMap iterates in key order — the sorting is free and the
    // output is deterministic, which makes test assertions honest.
    let query: Vec<String> = params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    format!("{base}{path}?{}", query.join("&"))
}

/// 📊 What the submission loop accomplished: the full copy count, only ever
/// produced on total success. On failure no report materializes at all —
/// already-submitted copies stay submitted, uncounted and unapologetic; we
/// do not go in after them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionReport {
    pub submitted: usize,
}

/// 📡 The HTTP muscle. Holds one `reqwest::Client` (reused across requests),
/// the resolved base URL for the chosen target, and the cookie header both
/// endpoints want to see.
///
/// 🚰 Think of this as the drain at the end of the simulation pipeline. The
/// last stop. Knock knock. Who's there? HTTP POST. HTTP POST who? HTTP POST
/// your base64 envelope and hope the dev appserver is in a good mood.
#[derive(Debug)]
pub struct InsightClient {
    client: reqwest::Client,
    config: AppConfig,
    base_url: String,
}

impl InsightClient {
    /// 🚀 Stand up a client for the chosen target.
    ///
    /// ⚠️ By default NO request timeout is configured — an unresponsive
    /// endpoint will hold the invocation hostage indefinitely, exactly like
    /// the workflow this tool replaces. Set `request_timeout_secs` in the
    /// config if your patience is finite.
    pub fn new(config: &AppConfig, target: Target) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context(
            "💀 The HTTP client refused to be born. Probably a missing TLS cert \
             or a cursed system OpenSSL. Either way: tragic.",
        )?;

        Ok(Self {
            client,
            base_url: config.base_url(target).to_string(),
            config: config.clone(),
        })
    }

    /// 🍪 The session cookie header both endpoints expect: the dev
    /// appserver's login cookie and staging's SACSID, side by side. Whichever
    /// one the target cares about, it gets.
    fn cookie_header(&self) -> String {
        format!(
            "dev_appserver_login={}; SACSID={}",
            self.config.dev_appserver_login, self.config.sacsid
        )
    }

    /// 📮 Submit every log in the batch to the ingestion endpoint, one POST
    /// per copy, strictly sequential.
    ///
    /// Per copy: JSON-serialize → base64 → `{"data": [<b64>]}` → POST as
    /// `application/json` with session cookies.
    ///
    /// # Errors
    /// 💀 [`SimulateError::Auth`] on the first 403 — the rest of the batch is
    /// abandoned immediately; there is no universe where copy 3 succeeds
    /// after copy 2 got bounced at the door.
    /// 💀 [`SimulateError::Transport`] on any other non-200, with status and
    /// body attached for the postmortem.
    pub async fn submit_batch(
        &self,
        source: Source,
        batch: &[ErrorLog],
    ) -> Result<SubmissionReport> {
        let url = create_url(
            &self.base_url,
            self.config.incoming_path(source),
            &BTreeMap::new(),
        );
        debug!(copies = batch.len(), %url, "📮 Submitting batch to the ingestion endpoint");

        let mut submitted = 0usize;
        for log in batch {
            let payload = serde_json::to_string(log).context(
                "💀 Failed to serialize an error log that WE constructed. This is \
                 thermodynamically unlikely. File a bug.",
            )?;
            // 📮 The tuxedo. The endpoint only accepts its JSON pre-dressed.
            let envelope = serde_json::json!({ "data": [STANDARD.encode(payload)] }).to_string();

            let response = self
                .client
                .post(&url)
                .header("Content-Type", "application/json")
                .header("Cookie", self.cookie_header())
                .body(envelope)
                .send()
                .await
                .with_context(|| format!(
                    "💀 The submission never made it to {url}. We launched the envelope \
                     into the network and the network responded with what can only be \
                     described as 'not vibing with it.' Check that Insight is running."
                ))?;

            let status = response.status();
            if status.as_u16() == 403 {
                // 🔒 One 403 and the whole batch goes home. The cookies are
                // bad; re-sending won't make them fresher.
                return Err(SimulateError::Auth { url }.into());
            }
            // 🎯 Success means 200. Not "2xx-ish". A 204 from this endpoint
            // means something upstream changed and we want to hear about it.
            if status.as_u16() != 200 {
                let body = response.text().await.unwrap_or_default();
                return Err(SimulateError::Transport {
                    status: status.as_u16(),
                    url,
                    body,
                }
                .into());
            }

            submitted += 1;
            trace!(submitted, "🚀 Copy landed — the error has left the building, Elvis-style");
        }

        Ok(SubmissionReport { submitted })
    }

    /// ⚙️ Fire the processing trigger with a ±60s window around now (UTC).
    ///
    /// Form-encoded, with the `X-AppEngine-QueueName` header that convinces
    /// the endpoint we're a legitimate task queue and not three error logs
    /// in a trench coat. Same success/failure semantics as submission.
    ///
    /// The driver only calls this against a LOCAL target — staging has its
    /// own processing cron and does not appreciate the help.
    pub async fn trigger_processing(&self, env: &str, source: Source) -> Result<()> {
        let url = create_url(
            &self.base_url,
            &self.config.process_errors_path,
            &BTreeMap::new(),
        );
        let now = Utc::now();
        let start_time = (now - chrono::Duration::seconds(TRIGGER_WINDOW_SECONDS))
            .format(TRIGGER_WINDOW_FORMAT)
            .to_string();
        let end_time = (now + chrono::Duration::seconds(TRIGGER_WINDOW_SECONDS))
            .format(TRIGGER_WINDOW_FORMAT)
            .to_string();
        debug!(%url, %start_time, %end_time, "⚙️ Triggering error processing");

        let form = [
            ("start_time", start_time.as_str()),
            ("end_time", end_time.as_str()),
            ("env", env),
            ("source", &source.to_string()),
            ("should_check_lock", "true"),
        ];

        let response = self
            .client
            .post(&url)
            .header("X-AppEngine-QueueName", "yes")
            .header("Cookie", self.cookie_header())
            .form(&form)
            .send()
            .await
            .with_context(|| format!(
                "💀 The processing trigger never reached {url}. The batch is already \
                 submitted and sitting in the queue, unprocessed, like laundry."
            ))?;

        let status = response.status();
        if status.as_u16() == 403 {
            return Err(SimulateError::Auth { url }.into());
        }
        // 🎯 Same bar as submission: exactly 200, nothing adjacent.
        if status.as_u16() != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(SimulateError::Transport {
                status: status.as_u16(),
                url,
                body,
            }
            .into());
        }

        Ok(())
    }
}
