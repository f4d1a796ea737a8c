//! Runs a fixed number of worker tasks and restarts any that exit.

use std::{
    future::Future,
    time::{Duration, Instant},
};

use tokio::task::{AbortHandle, JoinError, JoinSet};
use tracing::{error, info, warn};

const BASE_DELAY: Duration = Duration::from_millis(250);
const MAX_DELAY: Duration = Duration::from_secs(30);
/// A worker that stayed up this long is considered healthy again.
const STABLE_AFTER: Duration = Duration::from_secs(60);

/// Delay before the next restart of a worker that has failed
/// `consecutive_failures` times in a row (counting the current failure).
pub fn restart_delay(consecutive_failures: u32) -> Duration {
    let exp = consecutive_failures.saturating_sub(1).min(16);
    BASE_DELAY.saturating_mul(1 << exp).min(MAX_DELAY)
}

struct Exit {
    worker: usize,
    started: Instant,
    result: Result<anyhow::Result<()>, JoinError>,
}

/// Spawns `workers` copies of `spawn_worker` and keeps them running until
/// `shutdown` resolves. Each worker gets its index.
pub async fn supervise<F, Fut, S>(workers: usize, spawn_worker: F, shutdown: S)
where
    F: Fn(usize) -> Fut,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    S: Future<Output = ()>,
{
    let mut set = JoinSet::new();
    let mut failures = vec![0u32; workers];

    for worker in 0..workers {
        start(&mut set, worker, Duration::ZERO, spawn_worker(worker));
    }
    info!(workers, "workers started");

    tokio::pin!(shutdown);
    loop {
        let exit = tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown requested; stopping workers");
                set.shutdown().await;
                return;
            }
            next = set.join_next() => match next {
                Some(Ok(exit)) => exit,
                Some(Err(e)) => {
                    // Only the wrapper task can fail here, and it is never aborted
                    // outside shutdown.
                    error!(error = %e, "worker wrapper failed");
                    continue;
                }
                None => return,
            },
        };

        let Exit { worker, started, result } = exit;
        match result {
            Ok(Ok(())) => warn!(worker, "worker exited"),
            Ok(Err(e)) => error!(worker, error = %e, "worker failed"),
            Err(e) => error!(worker, error = %e, "worker panicked"),
        }

        if started.elapsed() >= STABLE_AFTER {
            failures[worker] = 0;
        }
        failures[worker] = failures[worker].saturating_add(1);
        let delay = restart_delay(failures[worker]);
        warn!(worker, delay_ms = delay.as_millis() as u64, "restarting worker");
        start(&mut set, worker, delay, spawn_worker(worker));
    }
}

/// Aborts the inner worker task when its wrapper is cancelled.
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn start<Fut>(set: &mut JoinSet<Exit>, worker: usize, delay: Duration, fut: Fut)
where
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    set.spawn(async move {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let started = Instant::now();
        // Inner task so a panic is reported as a JoinError instead of
        // taking the wrapper down with it.
        let handle = tokio::spawn(fut);
        let _guard = AbortOnDrop(handle.abort_handle());
        let result = handle.await;
        Exit {
            worker,
            started,
            result,
        }
    });
}
