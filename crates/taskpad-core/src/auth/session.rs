use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::ApiError;
use crate::feedback::{Feedback, Toast};
use crate::models::TokenStatus;

use super::codec;
use super::storage::KeyValueStore;

/// Storage key of the persisted credential
pub const CREDENTIAL_KEY: &str = "act";

/// How long the "session invalid" notice stays up
const TOKEN_FAILURE_TOAST_MS: u64 = 2000;

/// Checks a token with the backend during session restore.
pub trait TokenVerifier {
    fn verify(&self, token: &str) -> impl Future<Output = Result<TokenStatus, ApiError>> + Send;
}

/// Owner of the current bearer token.
///
/// The live value sits in a `watch` channel, so reading it, publishing it and
/// replaying it to new subscribers all go through the same place. Every write
/// persists before it publishes, under `writes`.
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    credential: watch::Sender<String>,
    /// Number of credential writes so far; the lock serializes them
    writes: Mutex<u64>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        let (credential, _) = watch::channel(String::new());
        Self {
            storage,
            credential,
            writes: Mutex::new(0),
        }
    }

    /// Restore a persisted credential, if any, and check it with the backend.
    ///
    /// Meant to be spawned at startup and not awaited: until it finishes the
    /// store reads as unauthenticated. Never fails; every problem ends with
    /// the store unauthenticated and the persisted entry gone. A login or
    /// logout that lands while the server is being asked wins over the
    /// verdict.
    pub async fn initialize<V>(&self, verifier: &V, feedback: &dyn Feedback)
    where
        V: TokenVerifier + ?Sized,
    {
        let generation = *self.lock_writes();

        let stored = match self.storage.get(CREDENTIAL_KEY) {
            Ok(Some(stored)) if !stored.is_empty() => stored,
            Ok(_) => {
                debug!("No persisted credential");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read persisted credential");
                return;
            }
        };

        let token = match codec::decode(&stored) {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Persisted credential is corrupt, discarding it");
                {
                    let writes = self.lock_writes();
                    if *writes == generation {
                        self.remove_persisted();
                    }
                }
                feedback.toast(
                    Toast::info(
                        "Session is invalid, please sign in again",
                        Duration::from_millis(TOKEN_FAILURE_TOAST_MS),
                    )
                    .with_title("Token Failure"),
                );
                return;
            }
        };

        let verdict = verifier.verify(&token).await;

        let mut writes = self.lock_writes();
        if *writes != generation {
            debug!("Credential changed while verifying, keeping the newer state");
            return;
        }

        match verdict {
            Ok(TokenStatus { status: true }) => {
                info!("Persisted credential verified");
                self.write_locked(&mut writes, token);
            }
            Ok(TokenStatus { status: false }) => {
                info!("Persisted credential rejected by server");
                self.write_locked(&mut writes, String::new());
            }
            Err(e) => {
                warn!(error = %e, "Failed to verify persisted credential");
                self.write_locked(&mut writes, String::new());
            }
        }
    }

    /// Replace the credential, persist it and publish it
    pub fn set_credential(&self, token: impl Into<String>) {
        let mut writes = self.lock_writes();
        self.write_locked(&mut writes, token.into());
    }

    /// Drop the credential, remove it from storage and publish the empty value
    pub fn clear_credential(&self) {
        let mut writes = self.lock_writes();
        self.write_locked(&mut writes, String::new());
    }

    /// Persist then publish. Callers hold the write lock.
    fn write_locked(&self, writes: &mut MutexGuard<'_, u64>, token: String) {
        **writes += 1;

        if token.is_empty() {
            self.remove_persisted();
            self.credential.send_replace(token);
            debug!("Credential cleared");
            return;
        }

        if let Err(e) = self.storage.set(CREDENTIAL_KEY, &codec::encode(&token)) {
            warn!(error = %e, "Failed to persist credential");
        }
        self.credential.send_replace(token);
        debug!("Credential updated");
    }

    /// The credential right now; empty when unauthenticated
    pub fn current_credential(&self) -> String {
        self.credential.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        !self.credential.borrow().is_empty()
    }

    /// Subscribe to credential changes.
    ///
    /// The receiver starts out marked as changed, so the first `changed()`
    /// resolves at once with the current value, then once per later update.
    pub fn observe_credential(&self) -> watch::Receiver<String> {
        let mut rx = self.credential.subscribe();
        rx.mark_changed();
        rx
    }

    fn lock_writes(&self) -> MutexGuard<'_, u64> {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove_persisted(&self) {
        if let Err(e) = self.storage.remove(CREDENTIAL_KEY) {
            warn!(error = %e, "Failed to remove persisted credential");
        }
    }
}
