//! Multi-worker runs on scoped threads.

use std::thread;

use strata_partition::ChannelCommunicator;
use strata_types::{StrataError, StrataResult};
use tracing::{debug, error};

use crate::driver::{RunSummary, StepDriver};
use crate::setup::Simulation;

/// Runs `f` on one [`StepDriver`] per worker and returns every rank's
/// result in rank order.
///
/// When any rank fails, the first error that did not merely report a
/// failed peer is returned.
pub fn run_cluster_with<T, F>(sim: &Simulation, workers: usize, f: F) -> StrataResult<Vec<T>>
where
    T: Send,
    F: Fn(StepDriver<'_>) -> StrataResult<T> + Sync,
{
    let comms = ChannelCommunicator::cluster(workers)?;
    debug!(workers, "Starting worker threads");

    let results: Vec<StrataResult<T>> = thread::scope(|scope| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| {
                let f = &f;
                scope.spawn(move || {
                    let driver = StepDriver::new(sim, Box::new(comm))?;
                    f(driver)
                })
            })
            .collect();

        handles
            .into_iter()
            .enumerate()
            .map(|(rank, handle)| {
                handle.join().unwrap_or_else(|_| {
                    error!(rank, "Worker panicked");
                    Err(StrataError::Communication(format!("Worker {rank} panicked")))
                })
            })
            .collect()
    });

    let mut values = Vec::with_capacity(workers);
    let mut first_error: Option<StrataError> = None;
    for result in results {
        match result {
            Ok(value) => values.push(value),
            Err(e) => {
                let replace = match &first_error {
                    None => true,
                    Some(current) => is_secondary(current) && !is_secondary(&e),
                };
                if replace {
                    first_error = Some(e);
                }
            }
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(values),
    }
}

/// Errors a rank reports because a peer failed first.
fn is_secondary(e: &StrataError) -> bool {
    match e {
        StrataError::Communication(_) => true,
        StrataError::StepAborted { source, .. } => matches!(**source, StrataError::Communication(_)),
        _ => false,
    }
}

/// Runs the whole simulation on `workers` threads and returns the
/// root's summary.
pub fn run_cluster(sim: &Simulation, workers: usize) -> StrataResult<RunSummary> {
    let mut summaries = run_cluster_with(sim, workers, |mut driver| driver.run())?;
    if summaries.is_empty() {
        return Err(StrataError::Communication("Cluster has no workers".into()));
    }
    Ok(summaries.swap_remove(0))
}
