//! 🔄 Transforms — raw log shapes in, Insight's canonical shapes out.
//!
//! 🎬 COLD OPEN — INT. CUSTOMS CHECKPOINT — THE WIRE BORDER
//!
//! Every raw log arrives at this module carrying paperwork from a country
//! Insight doesn't recognize. GCP passports. Kinesis visas. The normalizer
//! stamps them into the one shape the ingestion endpoint accepts, or it
//! denies entry with a typed error. There is no appeals process. There is
//! only `Result`.
//!
//! 🧠 Knowledge graph:
//! - [`normalize`] — the dispatcher; one call per invocation, pure, no I/O.
//! - [`gcp::normalize`] — rename `endTime` → `_time`, maybe override `appId`,
//!   always empty the stack. Infallible, which is suspicious but true.
//! - [`kinesis::normalize`] — service resolution (with the collector-gateway
//!   detour), env suffixing, two-format timestamp parsing. Very fallible.
//! - [`get_service_env`] — decomposes `Cerberus-prod` into (`Cerberus`,
//!   `prod`) against the configured suffix list.

pub mod gcp;
pub mod kinesis;

use crate::errors::SimulateError;
use crate::logs::{ErrorLog, RawLog};

/// 🔄 Normalize one raw log into the canonical shape for its source.
///
/// `service` and `env` are the pre-decomposed override from the CLI's
/// project argument (empty strings when no override was given). The raw log
/// is consumed — it had one job and this was it.
pub fn normalize(raw: RawLog, service: &str, env: &str) -> Result<ErrorLog, SimulateError> {
    match raw {
        RawLog::Gcp(raw) => Ok(ErrorLog::Gcp(gcp::normalize(raw, service))),
        RawLog::Kinesis(raw) => Ok(ErrorLog::Kinesis(kinesis::normalize(raw, service, env)?)),
    }
}

/// 🏷️ Split a raw service string into `(service, env)` against an ordered
/// suffix list: `Cerberus-prod` → `("Cerberus", "prod")`.
///
/// ⚠️ This is a SUBSTRING match, not an end-anchored one, and the first
/// suffix in the list that appears anywhere in the string wins. A service
/// literally containing `-eu` mid-name will be decomposed at that token.
/// That is the historical contract and downstream naming conventions lean on
/// it, so we keep it — compatibility over correctness, noted and signed.
///
/// No match → the full string comes back untouched with an empty env.
pub fn get_service_env(raw: &str, suffixes: &[String]) -> (String, String) {
    for suffix in suffixes {
        if raw.contains(suffix.as_str()) {
            // ✂️ Remove the first occurrence of the suffix; the env is the
            // suffix minus its leading dash.
            return (
                raw.replacen(suffix.as_str(), "", 1),
                suffix.trim_start_matches('-').to_string(),
            );
        }
    }
    (raw.to_string(), String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suffixes() -> Vec<String> {
        ["-prod", "-eu", "-demo", "-sandbox", "-wk-dev"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn the_one_where_a_prod_suffix_gets_peeled_off() {
        let (service, env) = get_service_env("service-prod", &suffixes());
        assert_eq!(service, "service");
        assert_eq!(env, "prod");
    }

    #[test]
    fn the_one_where_no_suffix_means_no_env() {
        let (service, env) = get_service_env("service", &suffixes());
        assert_eq!(service, "service");
        assert_eq!(env, "");
    }

    #[test]
    fn the_one_where_every_recognized_suffix_is_recognized() {
        for (raw, want_env) in [
            ("cerberus-prod", "prod"),
            ("cerberus-eu", "eu"),
            ("cerberus-demo", "demo"),
            ("cerberus-sandbox", "sandbox"),
            ("cerberus-wk-dev", "wk-dev"),
        ] {
            let (service, env) = get_service_env(raw, &suffixes());
            assert_eq!(service, "cerberus", "service for {raw}");
            assert_eq!(env, want_env, "env for {raw}");
        }
    }

    #[test]
    fn the_one_where_substring_matching_is_preserved_warts_and_all() {
        // 🧪 `-eu` appears mid-name. The historical contract says it still
        // matches. We are not here to fix it, we are here to pin it.
        let (service, env) = get_service_env("my-eu-service", &suffixes());
        assert_eq!(service, "my-service");
        assert_eq!(env, "eu");
    }

    #[test]
    fn the_one_where_the_first_listed_suffix_wins() {
        // 🧪 Both `-prod` and `-eu` present; list order decides, not
        // position in the string.
        let (service, env) = get_service_env("svc-eu-prod", &suffixes());
        assert_eq!(env, "prod");
        assert_eq!(service, "svc-eu");
    }

    #[test]
    fn the_one_where_decompose_then_recompose_round_trips() {
        // 🧪 Derived then re-applied must reproduce the original string —
        // the driver decomposes the project arg and the normalizer glues it
        // back together, and nobody may lose a character in transit.
        let (service, env) = get_service_env("Cerberus-prod", &suffixes());
        assert_eq!(format!("{service}-{env}"), "Cerberus-prod");
    }
}
