use std::future::Future;

use futures::stream::{FuturesUnordered, StreamExt};

/// Run every task concurrently and keep each outcome next to its key.
///
/// No task is cancelled when another fails, and outcomes come back in input
/// order regardless of completion order.
pub async fn gather_all<K, F, R>(tasks: Vec<(K, F)>) -> Vec<(K, R)>
where
    F: Future<Output = R>,
{
    let mut in_flight: FuturesUnordered<_> = tasks
        .into_iter()
        .enumerate()
        .map(|(index, (key, task))| async move { (index, key, task.await) })
        .collect();

    let mut outcomes = Vec::with_capacity(in_flight.len());
    while let Some(outcome) = in_flight.next().await {
        outcomes.push(outcome);
    }
    outcomes.sort_by_key(|(index, _, _)| *index);
    outcomes
        .into_iter()
        .map(|(_, key, result)| (key, result))
        .collect()
}
