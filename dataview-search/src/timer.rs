//! Tokio-backed [`Scheduler`].

use std::time::Duration;

use futures::future::BoxFuture;

use dataview_core::traits::{ScheduledTask, Scheduler};

/// Runs scheduled tasks on the ambient tokio runtime.
///
/// Cancelling the returned [`ScheduledTask`] aborts the spawned task.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>) -> ScheduledTask {
        let handle = tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            task.await;
        });
        let abort = handle.abort_handle();
        ScheduledTask::new(move || abort.abort())
    }
}
