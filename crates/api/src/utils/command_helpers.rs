//! Command execution helpers
//!
//! Every command runs through [`execute_command`] so timing and outcome
//! logging stay uniform.

use std::future::Future;
use std::time::Instant;

use carelog_domain::Result as DomainResult;
use tracing::warn;

use crate::utils::logging::{error_label, log_command_execution};

/// Execute a command, timing it and logging the outcome.
///
/// # Example
///
/// ```rust,ignore
/// pub async fn my_command(ctx: &AppContext) -> DomainResult<usize> {
///     execute_command("my_module::my_command", || async {
///         Ok(ctx.sync.queue().len().await)
///     })
///     .await
/// }
/// ```
pub async fn execute_command<F, Fut, T>(command_name: &str, command_fn: F) -> DomainResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = DomainResult<T>>,
{
    let start = Instant::now();
    let result = command_fn().await;
    let elapsed = start.elapsed();

    if let Err(err) = &result {
        warn!(command = command_name, error_type = error_label(err), error = %err, "command failed");
    }
    log_command_execution(command_name, elapsed, result.is_ok());

    result
}
