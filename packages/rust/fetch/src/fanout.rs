//! Bounded, order-preserving concurrent map.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::warn;

/// Run `f` over `items` with at most `concurrency` in flight.
///
/// Results come back in input order. A task that panics yields `None`.
pub async fn fan_out<I, T, F, Fut>(items: Vec<I>, concurrency: usize, f: F) -> Vec<Option<T>>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let handles: Vec<_> = items
        .into_iter()
        .map(|item| {
            let sem = semaphore.clone();
            let f = f.clone();
            tokio::spawn(async move {
                let _permit = sem.acquire_owned().await.ok();
                f(item).await
            })
        })
        .collect();

    let mut out = Vec::with_capacity(handles.len());
    for handle in handles {
        out.push(match handle.await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, "worker task failed");
                None
            }
        });
    }
    out
}
