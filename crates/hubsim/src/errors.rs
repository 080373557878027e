//! 💀 The error taxonomy — every way this tool can die, catalogued with love.
//!
//! 🎬 COLD OPEN — INT. ON-CALL LAPTOP — 11:58 PM
//!
//! A simulated error fails to simulate. An error about errors. The engineer
//! stares into the abyss. The abyss returns HTTP 403. Somewhere, a cookie
//! expired quietly, telling no one.
//!
//! This module gives each failure a NAME, because "something went wrong" is
//! not a diagnosis, it's a shrug with a stack trace. Orchestration code wraps
//! these in `anyhow` context on the way up; tests downcast on the way down.
//! Everybody gets what they want. Nobody gets a retry — every variant here is
//! terminal for the invocation. We fail once, we fail honestly, we go home.

/// 💀 The six ways a simulation run ends in tears.
///
/// 🧠 Knowledge graph:
/// - `File` / `Parse` → raised while loading a raw log (template or user file)
/// - `Format` → a raw timestamp matched neither supported pattern
/// - `Validation` → the resolved Kinesis service name came out empty
/// - `Auth` → HTTP 403 from either endpoint; aborts the whole batch on sight
/// - `Transport` → any other non-200; status and body attached for the autopsy
///
/// None of these retry. Partial submission is a documented outcome, not a bug:
/// if copy 2 of 3 gets a 403, copy 1 is already living its best life in the
/// ingestion queue and we are not going in after it.
#[derive(Debug, thiserror::Error)]
pub enum SimulateError {
    /// 📂 The raw log file was not where it claimed to be.
    #[error("{path} does not exist")]
    File { path: String },

    /// 🗑️ The file opened fine and then betrayed us with its contents.
    #[error("{path} is not valid JSON")]
    Parse { path: String },

    /// 🕰️ A timestamp that matches neither supported pattern. Time found a
    /// third option. Time always finds a third option.
    #[error("timestamp '{value}' matches neither supported format")]
    Format { value: String },

    /// 👻 The resolved service name is empty. An error log with no service is
    /// a letter with no address — the ingestion endpoint would file it under
    /// "haunted". We refuse to send it.
    #[error("resolved service name is empty")]
    Validation,

    /// 🔒 403. The bouncer checked our cookies and did not like what he saw.
    #[error("authentication rejected (HTTP 403) by {url}")]
    Auth { url: String },

    /// 📡 Any other non-200. The body rides along because Insight's error
    /// pages occasionally contain the actual reason, buried in HTML.
    #[error("unexpected HTTP {status} from {url}: {body}")]
    Transport {
        status: u16,
        url: String,
        body: String,
    },
}
