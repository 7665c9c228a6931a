pub mod cookie;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::backend::BackendApi;
use crate::identity::{IdentityProvider, IdentityUser};
use crate::models::Profile;

pub use cookie::{SESSION_COOKIE, clear_session_cookie, read_cookie, session_cookie};

#[derive(Debug, Clone, Serialize)]
pub struct AuthSnapshot {
    pub user: Option<IdentityUser>,
    pub profile: Option<Profile>,
    pub loading: bool,
}

impl Default for AuthSnapshot {
    fn default() -> Self {
        Self {
            user: None,
            profile: None,
            loading: true,
        }
    }
}

/// Process-wide view of who is signed in and which profile belongs to them.
///
/// One task follows the identity provider's change stream; everything else
/// reads the mirrored state through [`snapshot`](Self::snapshot) or
/// [`subscribe`](Self::subscribe).
pub struct AuthContext {
    identity: Arc<dyn IdentityProvider>,
    backend: Arc<dyn BackendApi>,
    state: watch::Sender<AuthSnapshot>,
}

impl AuthContext {
    pub fn new(identity: Arc<dyn IdentityProvider>, backend: Arc<dyn BackendApi>) -> Self {
        let (state, _) = watch::channel(AuthSnapshot::default());
        Self {
            identity,
            backend,
            state,
        }
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.state.subscribe()
    }

    /// Waits for the first sign-in state to be resolved.
    pub async fn loaded(&self) -> AuthSnapshot {
        let mut rx = self.state.subscribe();
        match rx.wait_for(|s| !s.loading).await {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => self.snapshot(),
        }
    }

    /// Starts following the identity provider until `shutdown` is cancelled.
    pub fn spawn(self: &Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        let ctx = Arc::clone(self);
        tokio::spawn(async move { ctx.run(shutdown).await })
    }

    async fn run(&self, shutdown: CancellationToken) {
        let mut changes = self.identity.subscribe();
        let initial = changes.borrow_and_update().clone();
        self.apply(initial).await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("auth context stopped");
                    break;
                }
                changed = changes.changed() => {
                    if changed.is_err() {
                        debug!("identity provider dropped its change stream");
                        break;
                    }
                    let user = changes.borrow_and_update().clone();
                    self.apply(user).await;
                }
            }
        }
    }

    async fn apply(&self, user: Option<IdentityUser>) {
        let profile = match &user {
            Some(user) => self.lookup_profile(&user.uid).await,
            None => None,
        };
        self.state.send_replace(AuthSnapshot {
            user,
            profile,
            loading: false,
        });
    }

    /// Best effort: any failure leaves the profile unset.
    async fn lookup_profile(&self, uid: &str) -> Option<Profile> {
        match self.backend.list_profiles().await {
            Ok(profiles) => profiles.into_iter().find(|p| p.user_id == uid),
            Err(e) => {
                error!("Error fetching profile: {}", e);
                None
            }
        }
    }
}
