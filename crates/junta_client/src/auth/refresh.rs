use std::sync::{Arc, Mutex};

use log::{info, warn};
use reqwest_middleware::ClientWithMiddleware;
use tokio::sync::oneshot;

use crate::auth::session::{RefreshRequest, TokenPairResponse};
use crate::auth::token_store::TokenStore;
use crate::error::RefreshError;

/// What a refresh episode resolves to: the fresh access token, or the
/// failure delivered to every queued request.
pub(crate) type RefreshOutcome = Result<String, RefreshError>;

/// Refresh protocol state. `Refreshing` holds the waiter channels in
/// registration order; they are drained exactly once per episode.
enum RefreshState {
    Idle,
    Refreshing {
        waiters: Vec<oneshot::Sender<RefreshOutcome>>,
    },
}

enum Ticket {
    /// The store already holds a token newer than the one that got the 401.
    AlreadyFresh(String),
    /// This caller performed the Idle -> Refreshing transition and must
    /// spawn the refresh task.
    Owner(oneshot::Receiver<RefreshOutcome>),
    /// A refresh is already in flight; wait for its outcome.
    Follower(oneshot::Receiver<RefreshOutcome>),
}

/// Coordinates at most one refresh call per failure episode.
///
/// Requests that hit a 401 call [`RefreshCoordinator::recover`]. The first
/// one becomes the owner and spawns the refresh on a detached task, so a
/// caller cancelling its own request cannot abort the shared refresh.
/// Everyone, owner included, subscribes to the outcome over a oneshot
/// channel. On failure the session store is cleared before release.
pub(crate) struct RefreshCoordinator {
    state: Mutex<RefreshState>,
    store: TokenStore,
    http: Arc<ClientWithMiddleware>,
    refresh_url: reqwest::Url,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator").finish_non_exhaustive()
    }
}

impl RefreshCoordinator {
    pub(crate) fn new(
        store: TokenStore,
        http: Arc<ClientWithMiddleware>,
        refresh_url: reqwest::Url,
    ) -> Arc<Self> {
        Arc::new(RefreshCoordinator {
            state: Mutex::new(RefreshState::Idle),
            store,
            http,
            refresh_url,
        })
    }

    /// Recover from a 401 observed while `stale` was attached.
    ///
    /// Resolves once the shared refresh settles: `Ok` carries the token to
    /// replay with, `Err` means the session is gone.
    pub(crate) async fn recover(self: Arc<Self>, stale: &str) -> RefreshOutcome {
        let receiver = match self.join(stale) {
            Ticket::AlreadyFresh(token) => return Ok(token),
            Ticket::Owner(receiver) => {
                let this = Arc::clone(&self);
                tokio::spawn(async move { this.run_refresh().await });
                receiver
            }
            Ticket::Follower(receiver) => receiver,
        };

        match receiver.await {
            Ok(outcome) => outcome,
            // Sender dropped without a verdict; the guard should make this
            // unreachable, but a queued request must never hang.
            Err(_) => Err(RefreshError::Aborted),
        }
    }

    /// Atomic check-and-set of the refresh state.
    ///
    /// The stale-token re-check happens under the same lock: a 401 that
    /// raced with an already-completed episode adopts the current token
    /// instead of starting a redundant refresh.
    fn join(&self, stale: &str) -> Ticket {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match &mut *state {
            RefreshState::Refreshing { waiters } => {
                let (sender, receiver) = oneshot::channel();
                waiters.push(sender);
                Ticket::Follower(receiver)
            }
            RefreshState::Idle => {
                if let Some(current) = self.store.access_token() {
                    if current != stale {
                        return Ticket::AlreadyFresh(current);
                    }
                }
                let (sender, receiver) = oneshot::channel();
                *state = RefreshState::Refreshing {
                    waiters: vec![sender],
                };
                Ticket::Owner(receiver)
            }
        }
    }

    async fn run_refresh(&self) {
        let guard = CompletionGuard {
            coordinator: self,
            done: false,
        };
        let outcome = self.call_refresh_endpoint().await;
        if outcome.is_err() {
            // Unrecoverable: downstream session-expiry handling is the
            // caller's job, the teardown is ours.
            self.store.clear();
        }
        guard.complete(outcome);
    }

    async fn call_refresh_endpoint(&self) -> RefreshOutcome {
        let refresh_token = self
            .store
            .refresh_token()
            .ok_or(RefreshError::MissingRefreshToken)?;

        info!("Refreshing session at {}", self.refresh_url);
        let response = self
            .http
            .post(self.refresh_url.clone())
            .json(&RefreshRequest {
                refresh_token: &refresh_token,
            })
            .send()
            .await
            .map_err(|e| RefreshError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Refresh endpoint rejected the session with status {status}");
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let pair = response
            .json::<TokenPairResponse>()
            .await
            .map_err(|e| RefreshError::Transport(e.to_string()))?;
        let session = pair.into_session();
        let access_token = session.access_token.clone();
        // Store before release so no waiter can observe the stale token.
        self.store.store(session);
        info!("Session refreshed, releasing queued requests");
        Ok(access_token)
    }

    /// Transition back to Idle and drain waiters in registration order.
    fn release(&self, outcome: RefreshOutcome) {
        let waiters = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            match std::mem::replace(&mut *state, RefreshState::Idle) {
                RefreshState::Refreshing { waiters } => waiters,
                RefreshState::Idle => Vec::new(),
            }
        };
        for waiter in waiters {
            // A closed channel means that caller cancelled while queued;
            // skip it without disturbing the rest.
            let _ = waiter.send(outcome.clone());
        }
    }
}

/// Releases every waiter with `Aborted` if the refresh task dies without
/// reporting, so no queued request is silently dropped.
struct CompletionGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    done: bool,
}

impl CompletionGuard<'_> {
    fn complete(mut self, outcome: RefreshOutcome) {
        self.done = true;
        self.coordinator.release(outcome);
    }
}

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.coordinator.release(Err(RefreshError::Aborted));
        }
    }
}
