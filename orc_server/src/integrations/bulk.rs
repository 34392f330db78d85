use std::{future::Future, time::Duration};

use futures::future::join_all;
use log::*;
use rand::Rng;

pub const DEFAULT_BATCH_SIZE: usize = 20;

const MIN_BATCH_DELAY_SECS: u64 = 3;
const MAX_BATCH_DELAY_SECS: u64 = 8;

/// Run a job over a list of items in rate-limited batches.
///
/// Within a batch the jobs run concurrently; batches themselves run strictly sequentially, separated by a
/// randomized multi-second pause. Mail providers flag large uniform bursts as spam, so the pacing is the point,
/// not an optimization target. Returns the number of jobs that succeeded.
pub async fn run_in_batches<T, F, Fut, E>(items: Vec<T>, batch_size: usize, job: F) -> usize
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    let batch_size = batch_size.max(1);
    let num_batches = items.len().div_ceil(batch_size);
    let mut items = items.into_iter();
    let mut succeeded = 0;
    for batch_no in 1..=num_batches {
        let batch = items.by_ref().take(batch_size).map(&job).collect::<Vec<_>>();
        debug!("⏳️ Running batch {batch_no}/{num_batches} ({} jobs)", batch.len());
        succeeded += join_all(batch).await.into_iter().filter(Result::is_ok).count();
        if batch_no < num_batches {
            let delay = rand::thread_rng().gen_range(MIN_BATCH_DELAY_SECS..=MAX_BATCH_DELAY_SECS);
            trace!("⏳️ Sleeping {delay}s before next batch");
            tokio::time::sleep(Duration::from_secs(delay)).await;
        }
    }
    succeeded
}
