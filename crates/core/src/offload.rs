//! Worker Dispatch
//!
//! Collaborator calls (network requests, file decoding) block the calling
//! thread. They run on tokio's blocking pool and are awaited from the
//! scheduling thread, which stays free for the other loops.

use crate::error::ServiceError;

/// Runs `work` on a worker thread and awaits its result.
pub async fn offload<F, T>(work: F) -> Result<T, ServiceError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ServiceError::Worker(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offload_returns_value() {
        let value = offload(|| 40 + 2).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_offload_runs_off_scheduler_thread() {
        let caller = std::thread::current().id();
        let worker = offload(|| std::thread::current().id()).await.unwrap();
        assert_ne!(caller, worker);
    }

    #[tokio::test]
    async fn test_offload_panic_becomes_worker_error() {
        let result: Result<(), _> = offload(|| panic!("boom")).await;
        assert!(matches!(result, Err(ServiceError::Worker(_))));
    }
}
