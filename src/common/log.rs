//! Lifecycle log events.
//!
//! Every public lifecycle operation reports one structured `tracing` event with
//! the same field set, so a subscriber can aggregate durations per operation.

use crate::common::error::{ErrorCode, HyperResult};
use crate::common::time;

/// Emit a lifecycle event for `module`/`event` that started at `started_ms`.
pub fn log_op(module: &str, event: &str, code: ErrorCode, started_ms: u128) {
    let dur_ms = time::elapsed_ms(started_ms);
    if code == ErrorCode::Ok {
        tracing::info!(
            module,
            event,
            code = code as u32,
            dur_ms = dur_ms as u64,
            "operation finished"
        );
    } else {
        tracing::warn!(
            module,
            event,
            code = code as u32,
            dur_ms = dur_ms as u64,
            "operation failed"
        );
    }
}

/// Log the outcome of `result` and hand it back unchanged.
pub fn log_result<T>(
    module: &str,
    event: &str,
    started_ms: u128,
    result: HyperResult<T>,
) -> HyperResult<T> {
    let code = match &result {
        Ok(_) => ErrorCode::Ok,
        Err(err) => err.code(),
    };
    log_op(module, event, code, started_ms);
    result
}
