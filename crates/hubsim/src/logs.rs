//! 📦 The log shapes — raw logs in, canonical error logs out.
//!
//! 🎬 COLD OPEN — INT. INGESTION PIPELINE — TIMESTAMP UNKNOWN
//!
//! Two kinds of raw log walk into the normalizer. One fell out of GCP wearing
//! `appId` and `endTime` like a name tag from a conference it didn't want to
//! attend. The other crawled out of a Kinesis stream, dripping with nested
//! `exception` objects and a `metadata` map of unknowable depth. Neither is in
//! the shape Insight accepts. Both leave as an `ErrorLog`. That is the whole
//! economy of this module.
//!
//! 🧠 Knowledge graph:
//! - Raw shapes: [`GcpRawLog`], [`KinesisRawLog`] — loose, everything defaulted,
//!   because user-supplied JSON files owe us nothing and deliver less.
//! - Canonical shapes: [`GcpErrorLog`], [`KinesisErrorLog`] — what the
//!   `incoming_*_errors` endpoints actually want to receive.
//! - [`ErrorLog`] is the tagged union the driver replicates and submits.
//!   It serializes untagged: the wire sees the payload, not our enum drama.
//!
//! ⚠️ These are typed structs on purpose, not open maps. The two shapes are
//! fixed; compile-time coverage of their fields beats spelunking in a
//! `serde_json::Value` at 3am, and the compiler doesn't charge overtime.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 🏷️ Where an error log claims to come from.
///
/// Two origins, two wire shapes, two ingestion paths. This enum is the fork in
/// every road this crate has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Gcp,
    Kinesis,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 📡 The lowercase spelling is load-bearing: it goes into the
        // `source` form field of the process_errors trigger verbatim.
        match self {
            Source::Gcp => write!(f, "gcp"),
            Source::Kinesis => write!(f, "kinesis"),
        }
    }
}

// ---------------------------------------------------------------------------
// Raw shapes — what falls out of the template files and user-supplied JSON
// ---------------------------------------------------------------------------

/// 📦 A raw GCP request log, straight off the template or a user file.
///
/// Every field defaults to empty because template files ship hollow and get
/// stamped before normalization. `endTime` carries `%Y-%m-%dT%H:%M:%S.%fZ`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GcpRawLog {
    #[serde(rename = "appId", default)]
    pub app_id: String,
    #[serde(rename = "endTime", default)]
    pub end_time: String,
    #[serde(default)]
    pub latency: String,
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub stack: String,
    #[serde(rename = "versionId", default)]
    pub version_id: String,
}

/// 💥 The `exception` object inside a Kinesis raw log.
///
/// `type` is a Rust keyword, so it lives here under witness protection as
/// `kind`. Same field. New identity. Don't blow its cover on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExceptionBody {
    #[serde(default)]
    pub stacktrace: String,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// 🏷️ The nested `service` object on a raw Kinesis log. One field. One job.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServiceField {
    #[serde(default)]
    pub name: String,
}

/// 📦 The nested `container` object — only some producers attach one.
/// When present, its `name` becomes the normalized record's `version`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContainerField {
    #[serde(default)]
    pub name: String,
}

/// 📦 A raw Kinesis error log.
///
/// `timestamp` arrives as `%Y-%m-%dT%H:%M:%S.%fZ` or `%Y-%m-%dT%H:%M:%SZ` —
/// two formats, because somewhere upstream two producers never talked to each
/// other and now their indecision is our `match` statement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KinesisRawLog {
    #[serde(default)]
    pub exception: ExceptionBody,
    #[serde(default)]
    pub service: ServiceField,
    /// `None` means absent; normalization substitutes `"info"`. An explicit
    /// empty string is a choice, and we respect choices. Even bad ones.
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default = "empty_object")]
    pub context: Value,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<ContainerField>,
}

impl Default for KinesisRawLog {
    fn default() -> Self {
        Self {
            exception: ExceptionBody::default(),
            service: ServiceField::default(),
            level: None,
            timestamp: String::new(),
            context: empty_object(),
            message: None,
            metadata: Map::new(),
            container: None,
        }
    }
}

/// 🔧 serde default for `context` — an empty object, not `null`. The
/// ingestion endpoint treats `null` context the way cats treat closed doors.
fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// 🏷️ One raw log, either flavor. Loaded once per invocation, normalized once.
#[derive(Debug, Clone, PartialEq)]
pub enum RawLog {
    Gcp(GcpRawLog),
    Kinesis(KinesisRawLog),
}

// ---------------------------------------------------------------------------
// Canonical shapes — what the incoming_*_errors endpoints accept
// ---------------------------------------------------------------------------

/// ✅ A normalized GCP error log. `_time` keeps the raw `endTime` verbatim;
/// `stack` is always empty — the endpoint rebuilds it, ours is just ballast.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GcpErrorLog {
    #[serde(rename = "_time")]
    pub time: String,
    #[serde(rename = "appId")]
    pub app_id: String,
    pub resource: String,
    pub latency: String,
    pub stack: String,
    #[serde(rename = "versionId")]
    pub version_id: String,
}

/// ✅ A normalized Kinesis error log.
///
/// `service` is flattened to a plain string (`<service>` or
/// `<service>-<env>`), `time` is reformatted to `%Y/%m/%d %H:%M:%S`, and the
/// two optional fields stay off the wire entirely when absent —
/// `"source": null` and `"source": "client"` mean very different things to
/// the receiving end, and only one of them is ever true.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KinesisErrorLog {
    pub exception: ExceptionBody,
    pub level: String,
    pub message: String,
    pub metadata: Map<String, Value>,
    pub context: Value,
    pub service: String,
    pub time: String,
    /// `"client"` when the traffic came through the front-end collector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Container name, when the raw log carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// 📦 The canonical record the driver deep-copies `count` times into the
/// batch. Untagged on the wire — Insight gets the payload, not the enum.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ErrorLog {
    Gcp(GcpErrorLog),
    Kinesis(KinesisErrorLog),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_one_where_optional_fields_stay_off_the_wire() {
        // 🧪 No source, no version → neither key appears in the JSON.
        // Absence is a statement. `null` is a rumor.
        let log = KinesisErrorLog {
            exception: ExceptionBody::default(),
            level: "".into(),
            message: "".into(),
            metadata: Map::new(),
            context: empty_object(),
            service: "cerberus".into(),
            time: "2018/06/14 12:00:00".into(),
            source: None,
            version: None,
        };
        let wire = serde_json::to_string(&log).expect("canonical log must serialize");
        assert!(!wire.contains("\"source\""), "absent source must not serialize");
        assert!(!wire.contains("\"version\""), "absent version must not serialize");
    }

    #[test]
    fn the_one_where_exception_type_keeps_its_wire_name() {
        // 🧪 `kind` in Rust, `type` on the wire. The witness protection holds.
        let exc = ExceptionBody {
            stacktrace: "".into(),
            message: "boom".into(),
            kind: "ValueError".into(),
        };
        let wire = serde_json::to_value(&exc).expect("exception must serialize");
        assert_eq!(wire["type"], "ValueError");
        assert!(wire.get("kind").is_none());
    }

    #[test]
    fn the_one_where_a_hollow_raw_kinesis_log_still_parses() {
        // 🧪 A user file containing `{}` is rude but legal. Everything
        // defaults; context comes back as an object, not null.
        let raw: KinesisRawLog = serde_json::from_str("{}").expect("empty object must parse");
        assert_eq!(raw.context, empty_object());
        assert!(raw.level.is_none());
        assert!(raw.container.is_none());
    }

    #[test]
    fn the_one_where_error_log_serializes_untagged() {
        // 🧪 The wire must see `_time`, not `{"Gcp": {...}}`. Enum drama is
        // an internal affair.
        let log = ErrorLog::Gcp(GcpErrorLog {
            time: "2018-06-14T12:00:00.000000Z".into(),
            app_id: "s~cerberus".into(),
            resource: "context@type".into(),
            latency: "0.01337s".into(),
            stack: "".into(),
            version_id: "xx.xx.xx".into(),
        });
        let wire = serde_json::to_value(&log).expect("error log must serialize");
        assert_eq!(wire["_time"], "2018-06-14T12:00:00.000000Z");
        assert!(wire.get("Gcp").is_none());
    }
}
