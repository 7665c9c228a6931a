use std::future::Future;

use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct LoadState<T> {
    pub data: T,
    pub loading: bool,
    pub error: Option<String>,
}

/// Observable load state tied to the lifetime of its owner.
///
/// Each load races the owner's lifecycle token: once [`unmount`] has been
/// called, in-flight responses are dropped instead of written back.
///
/// [`unmount`]: LoadCell::unmount
pub struct LoadCell<T> {
    state: watch::Sender<LoadState<T>>,
    lifecycle: CancellationToken,
}

impl<T: Clone + Send + Sync> LoadCell<T> {
    pub fn new(initial: T, loading: bool) -> Self {
        let (state, _) = watch::channel(LoadState {
            data: initial,
            loading,
            error: None,
        });
        Self {
            state,
            lifecycle: CancellationToken::new(),
        }
    }

    pub fn get(&self) -> LoadState<T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoadState<T>> {
        self.state.subscribe()
    }

    pub fn is_unmounted(&self) -> bool {
        self.lifecycle.is_cancelled()
    }

    pub fn unmount(&self) {
        self.lifecycle.cancel();
    }

    /// Runs `fetch` and stores its outcome. Returns `false` when the cell was
    /// unmounted before the fetch finished.
    pub async fn load<F>(&self, fetch: F) -> bool
    where
        F: Future<Output = Result<T, AppError>>,
    {
        if self.lifecycle.is_cancelled() {
            return false;
        }
        self.state.send_modify(|s| s.loading = true);

        tokio::select! {
            _ = self.lifecycle.cancelled() => {
                debug!("load abandoned after unmount");
                false
            }
            result = fetch => {
                self.state.send_modify(|s| {
                    s.loading = false;
                    match result {
                        Ok(data) => {
                            s.data = data;
                            s.error = None;
                        }
                        Err(e) => {
                            warn!("load failed: {}", e);
                            s.error = Some(e.to_string());
                        }
                    }
                });
                true
            }
        }
    }
}

impl<T> Drop for LoadCell<T> {
    fn drop(&mut self) {
        self.lifecycle.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Notify;

    #[tokio::test]
    async fn stores_data_and_clears_loading() {
        let cell = LoadCell::new(Vec::<u32>::new(), true);
        assert!(cell.get().loading);

        assert!(cell.load(async { Ok(vec![1, 2]) }).await);
        let state = cell.get();
        assert_eq!(state.data, vec![1, 2]);
        assert!(!state.loading);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn failure_keeps_previous_data() {
        let cell = LoadCell::new(vec![7u32], false);
        cell.load(async { Err(AppError::Unauthenticated) }).await;
        let state = cell.get();
        assert_eq!(state.data, vec![7]);
        assert_eq!(state.error.as_deref(), Some("Not authenticated"));
    }

    #[tokio::test]
    async fn unmount_drops_late_response() {
        let cell = Arc::new(LoadCell::new(0u32, false));
        let gate = Arc::new(Notify::new());

        let task = {
            let cell = cell.clone();
            let gate = gate.clone();
            tokio::spawn(async move {
                cell.load(async move {
                    gate.notified().await;
                    Ok(42)
                })
                .await
            })
        };

        tokio::task::yield_now().await;
        cell.unmount();
        gate.notify_one();

        assert!(!task.await.unwrap());
        assert_eq!(cell.get().data, 0);
    }
}
