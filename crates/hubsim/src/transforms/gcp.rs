//! 🔄 GCP raw log → canonical GCP error log.
//!
//! The easy half of the normalizer. The timestamp is already in the target
//! format, so `endTime` just changes its name to `_time` and moves on with
//! its life. No parsing. No failure modes. Enjoy it while it lasts —
//! `kinesis.rs` is next door and it has OPINIONS about timestamps.

use crate::logs::{GcpErrorLog, GcpRawLog};

/// 🔄 Normalize a raw GCP request log.
///
/// - `service` non-empty → `appId` becomes `s~<service>`; otherwise the raw
///   `appId` rides through untouched.
/// - `endTime` → `_time`, verbatim. Same string, better name.
/// - `resource`, `latency`, `versionId` are copied as-is.
/// - `stack` is ALWAYS emptied. Whatever the raw log carried there, the
///   ingestion endpoint rebuilds its own; ours is dead weight on the wire.
pub fn normalize(raw: GcpRawLog, service: &str) -> GcpErrorLog {
    let app_id = if service.is_empty() {
        raw.app_id
    } else {
        // 🏷️ `s~` is App Engine's application-id prefix. The tilde is not a
        // typo. It has never been a typo. Stop asking.
        format!("s~{service}")
    };

    GcpErrorLog {
        time: raw.end_time,
        app_id,
        resource: raw.resource,
        latency: raw.latency,
        stack: String::new(),
        version_id: raw.version_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> GcpRawLog {
        GcpRawLog {
            app_id: "s~service".into(),
            end_time: "2018-06-14T12:00:00.000000Z".into(),
            latency: "0.01337s".into(),
            resource: "context@type".into(),
            stack: "".into(),
            version_id: "xx.xx.xx".into(),
        }
    }

    #[test]
    fn the_one_where_a_service_override_rewrites_the_app_id() {
        let log = normalize(raw(), "project");
        assert_eq!(log.app_id, "s~project");
        assert_eq!(log.time, "2018-06-14T12:00:00.000000Z");
        assert_eq!(log.resource, "context@type");
        assert_eq!(log.latency, "0.01337s");
        assert_eq!(log.version_id, "xx.xx.xx");
        assert_eq!(log.stack, "");
    }

    #[test]
    fn the_one_where_no_override_keeps_the_raw_app_id() {
        let log = normalize(raw(), "");
        assert_eq!(log.app_id, "s~service");
        assert_eq!(log.time, "2018-06-14T12:00:00.000000Z");
    }

    #[test]
    fn the_one_where_the_stack_is_always_emptied() {
        // 🧪 Even a raw log arriving with a fully loaded stack leaves empty.
        let mut input = raw();
        input.stack = "Traceback (most recent call last): everything".into();
        let log = normalize(input, "project");
        assert_eq!(log.stack, "");
    }

    #[test]
    fn the_one_where_end_time_survives_verbatim() {
        // 🧪 No parse, no reformat, no rounding of microseconds. The string
        // that came in is the string that goes out, wearing a `_time` badge.
        let mut input = raw();
        input.end_time = "2018-06-14T12:00:00.123456Z".into();
        let log = normalize(input, "");
        assert_eq!(log.time, "2018-06-14T12:00:00.123456Z");
    }
}
