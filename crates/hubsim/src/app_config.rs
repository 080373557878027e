//! 🔧 App Configuration — the sacred TOML-to-struct pipeline, Insight edition.
//!
//! 📡 "The cookie is in an env var. Which env var? The one nobody wrote down."
//! — every simulation run, five minutes before it matters 🦆
//!
//! 🏗️ Powered by Figment, because manually parsing env vars is a form of
//! self-harm that even the borrow checker wouldn't approve of. Everything the
//! old shell-and-constants workflow kept as ambient globals — base URLs,
//! cookie values, endpoint paths, the service-suffix list, the two sacred
//! pauses — now travels in one explicit [`AppConfig`] struct, passed into the
//! driver like an adult passes dependencies.

use std::path::{Path, PathBuf};

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use tracing::info;

use crate::driver::Target;
use crate::logs::Source;

/// 📦 The AppConfig: one struct to rule them all, one struct to find them,
/// one struct to bring them all, and in the Figment bind them.
///
/// 🎯 Every knob defaults to the values the team has used since the original
/// scripts, so `hubsim kinesis -p cerberus-prod` works with zero config. The
/// cookies default to empty — secrets ride in as `HUBSIM_DEV_APPSERVER_LOGIN`
/// and `HUBSIM_SACSID`, never in a committed TOML file. We've all seen that
/// postmortem. We do not wish to star in the sequel.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// 📡 Where the local Insight dev server lives.
    #[serde(default = "default_base_url_local")]
    pub base_url_local: String,
    /// 📡 Where staging Insight lives. Has its own processing cron, so the
    /// driver never fires the trigger endpoint at it.
    #[serde(default = "default_base_url_staging")]
    pub base_url_staging: String,
    /// 📬 Ingestion path for GCP-shaped errors.
    #[serde(default = "default_incoming_gcp_path")]
    pub incoming_gcp_errors_path: String,
    /// 📬 Ingestion path for Kinesis-shaped errors.
    #[serde(default = "default_incoming_kinesis_path")]
    pub incoming_kinesis_errors_path: String,
    /// ⚙️ The processing-trigger path, local runs only.
    #[serde(default = "default_process_errors_path")]
    pub process_errors_path: String,
    /// 🔒 Session cookie for the local dev appserver.
    #[serde(default)]
    pub dev_appserver_login: String,
    /// 🔒 Session cookie for staging. Expires exactly when you need it most.
    #[serde(default)]
    pub sacsid: String,
    /// 🏷️ Ordered suffix list for service/env decomposition. First match
    /// wins, substring semantics — see `transforms::get_service_env`.
    #[serde(default = "default_service_suffixes")]
    pub service_suffixes: Vec<String>,
    /// 📂 Default GCP raw-log template.
    #[serde(default = "default_gcp_template")]
    pub default_gcp_template: PathBuf,
    /// 📂 Default Kinesis raw-log template.
    #[serde(default = "default_kinesis_template")]
    pub default_kinesis_template: PathBuf,
    /// 😴 Named pause after batch submission, in milliseconds. Exists because
    /// the receiving service processes asynchronously and needs a beat.
    /// Tests set it to 0 and get their afternoon back.
    #[serde(default = "default_post_submit_pause_ms")]
    pub post_submit_pause_ms: u64,
    /// 😴 Named pause after firing the processing trigger. The long one.
    #[serde(default = "default_post_trigger_pause_ms")]
    pub post_trigger_pause_ms: u64,
    /// ⏳ Optional HTTP request timeout in seconds. `None` (the default)
    /// means block forever, faithfully reproducing the historical behavior
    /// where an unresponsive endpoint holds the terminal hostage. Set it if
    /// you value your evenings.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_base_url_local() -> String {
    "http://localhost:8080".to_string()
}
fn default_base_url_staging() -> String {
    "https://w-insight-staging.appspot.com".to_string()
}
fn default_incoming_gcp_path() -> String {
    "/api/v1/hubble/incoming_gcp_errors".to_string()
}
fn default_incoming_kinesis_path() -> String {
    "/api/v1/hubble/incoming_errors".to_string()
}
fn default_process_errors_path() -> String {
    "/tasks/process_errors".to_string()
}
fn default_service_suffixes() -> Vec<String> {
    // ⚠️ ORDER MATTERS. First match wins during decomposition.
    ["-prod", "-eu", "-demo", "-sandbox", "-wk-dev"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_gcp_template() -> PathBuf {
    PathBuf::from("logs/default_gcp.json")
}
fn default_kinesis_template() -> PathBuf {
    PathBuf::from("logs/default_kinesis.json")
}
fn default_post_submit_pause_ms() -> u64 {
    1_000
}
fn default_post_trigger_pause_ms() -> u64 {
    10_000
}

impl Default for AppConfig {
    fn default() -> Self {
        // 🔧 Route through Figment with zero providers so the serde defaults
        // are the single source of truth. One set of defaults. No drift.
        Figment::new()
            .extract()
            .expect("built-in defaults must deserialize")
    }
}

impl AppConfig {
    /// 📡 Pick the base URL for a target. Local or staging. No third option.
    pub fn base_url(&self, target: Target) -> &str {
        match target {
            Target::Local => &self.base_url_local,
            Target::Staging => &self.base_url_staging,
        }
    }

    /// 📬 Pick the ingestion path for a source.
    pub fn incoming_path(&self, source: Source) -> &str {
        match source {
            Source::Gcp => &self.incoming_gcp_errors_path,
            Source::Kinesis => &self.incoming_kinesis_errors_path,
        }
    }

    /// 📂 Pick the default template path for a source.
    pub fn template_path(&self, source: Source) -> &Path {
        match source {
            Source::Gcp => &self.default_gcp_template,
            Source::Kinesis => &self.default_kinesis_template,
        }
    }
}

/// 🚀 Load the config — from a file, from env vars, or from the sheer power
/// of defaults.
///
/// 🔧 Merges environment variables (HUBSIM_*) with an optional TOML file.
/// TOML wins on conflicts. No file? No problem — the defaults cover a
/// stock local-Insight setup and the env carries the secrets.
///
/// 💀 Returns an error if the merged config is unparseable. The context
/// message will actually tell you which layer went wrong, because "error:
/// error" is not a diagnosis, it's an insult.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    info!(
        "🔧 Loading configuration: {:#?}",
        config_file_name.unwrap_or(Path::new("<env + defaults only>"))
    );

    // 🏗️ Env vars as the base layer — like a good sourdough starter.
    let config = Figment::new().merge(Env::prefixed("HUBSIM_"));

    // 🎯 Conditionally layer in TOML only if a file was actually provided.
    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment \
             variables (HUBSIM_*). One of them is lying. Probably the file.",
            path.display()
        ),
        None => "💀 Failed to parse configuration from environment variables \
                 (HUBSIM_*). No file was provided — this one's all on the \
                 environment. Classic."
            .to_string(),
    };

    config.extract().context(context_msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_test_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("💀 Failed to create test config. The filesystem said 'new phone who dis'.");
        file.write_all(contents.as_bytes())
            .expect("💀 Failed to write test config");
        file
    }

    #[test]
    fn the_one_where_defaults_match_the_original_constants() {
        let config = AppConfig::default();
        assert_eq!(config.base_url_local, "http://localhost:8080");
        assert_eq!(config.base_url_staging, "https://w-insight-staging.appspot.com");
        assert_eq!(config.incoming_gcp_errors_path, "/api/v1/hubble/incoming_gcp_errors");
        assert_eq!(config.incoming_kinesis_errors_path, "/api/v1/hubble/incoming_errors");
        assert_eq!(config.process_errors_path, "/tasks/process_errors");
        assert_eq!(
            config.service_suffixes,
            vec!["-prod", "-eu", "-demo", "-sandbox", "-wk-dev"]
        );
        assert_eq!(config.post_submit_pause_ms, 1_000);
        assert_eq!(config.post_trigger_pause_ms, 10_000);
        assert!(config.request_timeout_secs.is_none());
        assert_eq!(config.dev_appserver_login, "");
        assert_eq!(config.sacsid, "");
    }

    #[test]
    fn the_one_where_a_toml_file_overrides_the_pauses() {
        let file = write_test_config(
            r#"
            base_url_local = "http://localhost:9999"
            post_submit_pause_ms = 0
            post_trigger_pause_ms = 0
            request_timeout_secs = 5
            "#,
        );

        let config = load_config(Some(file.path()))
            .expect("💀 A perfectly valid TOML file should parse. It did not. Investigate.");

        assert_eq!(config.base_url_local, "http://localhost:9999");
        assert_eq!(config.post_submit_pause_ms, 0);
        assert_eq!(config.post_trigger_pause_ms, 0);
        assert_eq!(config.request_timeout_secs, Some(5));
        // ✅ Untouched knobs keep their defaults.
        assert_eq!(config.process_errors_path, "/tasks/process_errors");
    }

    #[test]
    fn the_one_where_helpers_route_by_target_and_source() {
        let config = AppConfig::default();
        assert_eq!(config.base_url(Target::Local), "http://localhost:8080");
        assert_eq!(
            config.base_url(Target::Staging),
            "https://w-insight-staging.appspot.com"
        );
        assert_eq!(
            config.incoming_path(Source::Gcp),
            "/api/v1/hubble/incoming_gcp_errors"
        );
        assert_eq!(
            config.incoming_path(Source::Kinesis),
            "/api/v1/hubble/incoming_errors"
        );
        assert_eq!(
            config.template_path(Source::Kinesis),
            Path::new("logs/default_kinesis.json")
        );
    }
}
