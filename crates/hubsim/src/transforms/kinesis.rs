//! 🔄 Kinesis raw log → canonical Kinesis error log.
//!
//! 🎬 COLD OPEN — INT. SERVICE RESOLUTION TRIBUNAL — IN SESSION
//!
//! "State your service name for the record." The raw log shuffles its
//! papers. Maybe the CLI supplied one. Maybe the `service.name` field has
//! one. Maybe the name on file is the front-end collector and the REAL
//! service is hiding in `metadata.app_name` like a witness in the gallery.
//! The tribunal hears all three and rules in a fixed order of precedence.
//! Leave with no name at all and the verdict is [`SimulateError::Validation`]
//! — an error log with no service does not get to exist.
//!
//! And then there's the timestamp, which arrives in one of exactly two
//! formats and must leave in a third. Time zones were harmed in the making
//! of this module. All of them. Simultaneously.

use chrono::NaiveDateTime;
use serde_json::Value;

use crate::errors::SimulateError;
use crate::logs::{KinesisErrorLog, KinesisRawLog};

/// 🏷️ The front-end collector's service identity. Raw logs arriving under
/// this name are client traffic wearing the gateway's jacket — the real
/// service name is in `metadata.app_name`, and the normalized record gets
/// tagged `source: "client"` so downstream knows who actually called.
pub const COLLECTION_GATEWAY: &str = "app-int-collection-gateway";

/// 🔄 Normalize a raw Kinesis error log.
///
/// Service resolution precedence, first non-empty wins:
/// 1. the explicit `service` argument (CLI override),
/// 2. the raw record's `service.name` — unless that name is the collection
///    gateway, in which case the name is re-sourced from
///    `metadata.app_name` and the record is tagged `source: "client"`.
///
/// A non-empty `env` is appended as `<service>-<env>`. Defaults are filled
/// for absent fields (`level` → `"info"`, `message` → `""`), the container
/// name (when present) becomes `version`, and the timestamp is reparsed and
/// reformatted to `%Y/%m/%d %H:%M:%S`.
///
/// # Errors
/// 💀 [`SimulateError::Validation`] when the resolved service name is empty
/// after every fallback — that's an invariant, not a formatting preference.
/// 💀 [`SimulateError::Format`] when the timestamp matches neither supported
/// pattern.
pub fn normalize(
    raw: KinesisRawLog,
    service: &str,
    env: &str,
) -> Result<KinesisErrorLog, SimulateError> {
    let mut source = None;

    // 🏷️ Resolve the service name. The explicit argument outranks the raw
    // record; the gateway detour only applies when we're reading the record.
    let resolved = if !service.is_empty() {
        service.to_string()
    } else if raw.service.name == COLLECTION_GATEWAY {
        // 🕵️ Client traffic in a gateway trench coat. Unmask it.
        source = Some("client".to_string());
        raw.metadata
            .get("app_name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    } else {
        raw.service.name.clone()
    };

    // 💀 Empty after all fallbacks → refuse loudly. Appending an env suffix
    // to nothing would manufacture a "service" called `-prod`, and that
    // abomination must never reach the wire.
    if resolved.is_empty() {
        return Err(SimulateError::Validation);
    }

    let service_name = if env.is_empty() {
        resolved
    } else {
        format!("{resolved}-{env}")
    };

    let time = reformat_timestamp(&raw.timestamp)?;

    // 📦 Container name, when present and non-empty, rides along as version.
    let version = raw
        .container
        .as_ref()
        .filter(|c| !c.name.is_empty())
        .map(|c| c.name.clone());

    Ok(KinesisErrorLog {
        exception: raw.exception,
        level: raw.level.unwrap_or_else(|| "info".to_string()),
        message: raw.message.unwrap_or_default(),
        metadata: raw.metadata,
        context: raw.context,
        service: service_name,
        time,
        source,
        version,
    })
}

/// 🕰️ Parse a raw Kinesis timestamp and reformat it for the canonical shape.
///
/// Two producers upstream, two formats down here:
/// - fractional seconds present (a `.` anywhere) → strip the fraction and
///   the trailing `Z` wholesale, parse as `%Y-%m-%dT%H:%M:%S`;
/// - otherwise → parse as `%Y-%m-%dT%H:%M:%SZ`.
///
/// Output is always `%Y/%m/%d %H:%M:%S`. Anything that fits neither mold is
/// a [`SimulateError::Format`] with the offending string attached, so the
/// error message does the forensics for you.
fn reformat_timestamp(ts: &str) -> Result<String, SimulateError> {
    let parsed = if ts.contains('.') {
        // ✂️ Everything from the dot onward (fraction AND the Z) is dropped
        // before parsing. The fraction never mattered; the endpoint's format
        // has no room for it anyway.
        let head = ts.split_once('.').map(|(head, _)| head).unwrap_or(ts);
        NaiveDateTime::parse_from_str(head, "%Y-%m-%dT%H:%M:%S")
    } else {
        NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%SZ")
    }
    .map_err(|_| SimulateError::Format {
        value: ts.to_string(),
    })?;

    Ok(parsed.format("%Y/%m/%d %H:%M:%S").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::{ContainerField, ExceptionBody, ServiceField};
    use serde_json::Map;

    fn raw() -> KinesisRawLog {
        KinesisRawLog {
            exception: ExceptionBody {
                stacktrace: "".into(),
                message: "context@type".into(),
                kind: "".into(),
            },
            service: ServiceField {
                name: "service".into(),
            },
            level: Some("".into()),
            timestamp: "2018-06-14T12:00:00.000000Z".into(),
            context: serde_json::json!({}),
            message: Some("".into()),
            metadata: Map::new(),
            container: None,
        }
    }

    #[test]
    fn the_one_where_the_override_and_env_build_the_service_name() {
        let log = normalize(raw(), "project", "env").expect("normalization must succeed");
        assert_eq!(log.service, "project-env");
        assert_eq!(log.time, "2018/06/14 12:00:00");
        assert_eq!(log.exception.message, "context@type");
        assert!(log.source.is_none());
    }

    #[test]
    fn the_one_where_the_raw_service_name_is_the_fallback() {
        let log = normalize(raw(), "", "").expect("normalization must succeed");
        assert_eq!(log.service, "service");
        assert!(log.source.is_none());
    }

    #[test]
    fn the_one_where_gateway_traffic_gets_unmasked_as_client() {
        let mut input = raw();
        input.service.name = COLLECTION_GATEWAY.into();
        input
            .metadata
            .insert("app_name".into(), serde_json::json!("service"));

        let log = normalize(input, "", "").expect("normalization must succeed");
        assert_eq!(log.service, "service");
        assert_eq!(log.source.as_deref(), Some("client"));
    }

    #[test]
    fn the_one_where_gateway_plus_env_still_gets_the_suffix() {
        let mut input = raw();
        input.service.name = COLLECTION_GATEWAY.into();
        input
            .metadata
            .insert("app_name".into(), serde_json::json!("cerberus"));

        let log = normalize(input, "", "prod").expect("normalization must succeed");
        assert_eq!(log.service, "cerberus-prod");
        assert_eq!(log.source.as_deref(), Some("client"));
    }

    #[test]
    fn the_one_where_an_empty_service_is_refused_not_shipped() {
        // 🧪 No override, empty raw name, no gateway rescue → Validation.
        // The invariant: an empty service is an ERROR, never a quiet field.
        let mut input = raw();
        input.service.name = "".into();
        let err = normalize(input, "", "").expect_err("empty service must fail");
        assert!(matches!(err, SimulateError::Validation));
    }

    #[test]
    fn the_one_where_the_gateway_with_no_app_name_is_also_refused() {
        // 🧪 Gateway name but metadata forgot the app_name. Still empty.
        // Still refused. The tribunal does not accept trench coats as ID.
        let mut input = raw();
        input.service.name = COLLECTION_GATEWAY.into();
        let err = normalize(input, "", "").expect_err("empty app_name must fail");
        assert!(matches!(err, SimulateError::Validation));
    }

    #[test]
    fn the_one_where_fractional_and_whole_second_timestamps_both_parse() {
        let mut with_fraction = raw();
        with_fraction.timestamp = "2018-06-14T12:00:00.000000Z".into();
        let log = normalize(with_fraction, "svc", "").expect("fractional must parse");
        assert_eq!(log.time, "2018/06/14 12:00:00");

        let mut without_fraction = raw();
        without_fraction.timestamp = "2018-06-14T12:00:00Z".into();
        let log = normalize(without_fraction, "svc", "").expect("whole-second must parse");
        assert_eq!(log.time, "2018/06/14 12:00:00");
    }

    #[test]
    fn the_one_where_a_lawless_timestamp_is_a_format_error() {
        let mut input = raw();
        input.timestamp = "last tuesday, around lunch".into();
        let err = normalize(input, "svc", "").expect_err("garbage timestamp must fail");
        assert!(matches!(err, SimulateError::Format { .. }));
    }

    #[test]
    fn the_one_where_absent_level_and_message_get_their_defaults() {
        // 🧪 Absent (None) level → "info". An EXPLICIT empty level stays
        // empty — present-but-empty is a statement, absence is a shrug.
        let mut input = raw();
        input.level = None;
        input.message = None;
        let log = normalize(input, "svc", "").expect("normalization must succeed");
        assert_eq!(log.level, "info");
        assert_eq!(log.message, "");

        let log = normalize(raw(), "svc", "").expect("normalization must succeed");
        assert_eq!(log.level, "", "explicit empty level must be preserved");
    }

    #[test]
    fn the_one_where_the_container_name_becomes_the_version() {
        let mut input = raw();
        input.container = Some(ContainerField {
            name: "cerberus-7f9c4".into(),
        });
        let log = normalize(input, "svc", "").expect("normalization must succeed");
        assert_eq!(log.version.as_deref(), Some("cerberus-7f9c4"));

        let log = normalize(raw(), "svc", "").expect("normalization must succeed");
        assert!(log.version.is_none(), "no container, no version");
    }
}
