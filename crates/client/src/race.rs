//! Race a primary operation against a fallback, first success wins.
//!
//! Failure precedence: when both sides fail, the caller observes the
//! *primary's* error. A real network failure is more diagnostic than
//! "no cached value". Nothing is ever cancelled; a losing primary keeps
//! running so its side effects (cache refreshes) still complete.

use std::future::Future;

/// Resolve with whichever of `primary` and `fallback` succeeds first.
///
/// - `primary` fails first: await `fallback`; if it also fails, return
///   `primary`'s error.
/// - `fallback` succeeds first: return its value and detach `primary` so its
///   side effects complete.
/// - `fallback` fails first: return `primary`'s eventual result as-is.
///
/// Timeouts belong inside the fallback (sleep, then consult the cache); this
/// combinator never preempts either branch.
pub async fn first_successful<T, E, P, F>(primary: P, fallback: F) -> Result<T, E>
where
    P: Future<Output = Result<T, E>> + Send + 'static,
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let mut primary = Box::pin(primary);
    let mut fallback = Box::pin(fallback);

    tokio::select! {
        result = &mut primary => match result {
            Ok(value) => Ok(value),
            Err(primary_err) => match fallback.await {
                Ok(value) => Ok(value),
                Err(_) => Err(primary_err),
            },
        },
        result = &mut fallback => match result {
            Ok(value) => {
                tokio::spawn(async move {
                    let _ = primary.await;
                });
                Ok(value)
            }
            Err(_) => primary.await,
        },
    }
}
