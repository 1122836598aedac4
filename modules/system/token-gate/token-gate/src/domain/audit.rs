//! One audit line per chain evaluation.

use std::time::Duration;

use token_gate_sdk::AccessOutcome;

use super::masking::Masker;

/// Emit the audit record for a finished evaluation.
///
/// Rejection reasons are masked before they are written.
pub fn record_decision(masker: &Masker, path: &str, outcome: &AccessOutcome, elapsed: Duration) {
    let path = masker.mask(path);
    let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
    let class = outcome.class();

    let reason = match outcome {
        AccessOutcome::Allowed => {
            tracing::info!(path = %path, outcome = class, elapsed_ms, "access allowed");
            return;
        }
        AccessOutcome::Overtime => {
            tracing::warn!(
                path = %path,
                outcome = class,
                elapsed_ms,
                reason = "deadline exceeded",
                "access decision timed out"
            );
            return;
        }
        AccessOutcome::NoCredential(err) => masker.mask(&err.to_string()),
        AccessOutcome::InvalidCredential(err) => masker.mask(&err.to_string()),
        AccessOutcome::Forbidden => "no predicate granted access".to_owned(),
    };
    tracing::info!(path = %path, outcome = class, elapsed_ms, reason = %reason, "access denied");
}
