use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::{debug, warn};

use crate::api::ApiError;

/// Shared flag saying whether the screen that started some work is still
/// mounted. Background continuations check it before delivering results.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn revoke(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchState<T> {
    Idle,
    Loading,
    Ready(T),
    Failed(ApiError),
}

/// One background load owned by a screen.
///
/// Starting a new load or cancelling revokes the previous load's liveness,
/// so a late result can never overwrite newer state.
pub struct Fetch<T> {
    state: FetchState<T>,
    rx: Option<oneshot::Receiver<Result<T, ApiError>>>,
    liveness: Liveness,
}

impl<T: Send + 'static> Fetch<T> {
    pub fn new() -> Self {
        Self {
            state: FetchState::Idle,
            rx: None,
            liveness: Liveness::new(),
        }
    }

    /// Spawn `work` on the runtime; its result lands on a later `poll`.
    pub fn start<F>(&mut self, work: F)
    where
        F: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        self.liveness.revoke();
        let liveness = Liveness::new();
        self.liveness = liveness.clone();

        let (tx, rx) = oneshot::channel();
        self.rx = Some(rx);
        self.state = FetchState::Loading;

        tokio::spawn(async move {
            let result = work.await;
            if !liveness.is_alive() {
                debug!("Discarding result for a screen that is no longer mounted");
                return;
            }
            let _ = tx.send(result);
        });
    }

    /// Apply a finished result. Returns true when the state changed.
    pub fn poll(&mut self) -> bool {
        let Some(rx) = self.rx.as_mut() else {
            return false;
        };
        match rx.try_recv() {
            Ok(result) => {
                self.rx = None;
                self.state = match result {
                    Ok(data) => FetchState::Ready(data),
                    Err(e) => FetchState::Failed(e),
                };
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Closed) => {
                // The task died (panic or runtime shutdown) without answering
                warn!("Background load ended without a result");
                self.rx = None;
                self.state = FetchState::Failed(ApiError::InvalidResponse(
                    "background load ended without a result".to_string(),
                ));
                true
            }
        }
    }

    /// Stop waiting for the current load; its result will be dropped.
    pub fn cancel(&mut self) {
        self.liveness.revoke();
        self.rx = None;
        if matches!(self.state, FetchState::Loading) {
            self.state = FetchState::Idle;
        }
    }

    /// Forget any result and go back to idle.
    pub fn reset(&mut self) {
        self.cancel();
        self.state = FetchState::Idle;
    }
}

impl<T> Fetch<T> {
    pub fn state(&self) -> &FetchState<T> {
        &self.state
    }

    pub fn data(&self) -> Option<&T> {
        match self.state {
            FetchState::Ready(ref data) => Some(data),
            _ => None,
        }
    }

    pub fn data_mut(&mut self) -> Option<&mut T> {
        match self.state {
            FetchState::Ready(ref mut data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self.state {
            FetchState::Failed(ref e) => Some(e),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, FetchState::Loading)
    }
}

impl<T: Send + 'static> Default for Fetch<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Fetch<T> {
    fn drop(&mut self) {
        self.liveness.revoke();
    }
}
