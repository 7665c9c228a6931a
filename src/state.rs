use std::sync::Arc;

use crate::auth::AuthContext;
use crate::backend::BackendApi;
use crate::config::GuardConfig;
use crate::identity::{IdentityProvider, TokenSource};

/// `identity` and `tokens` point at the same provider; the token view is
/// what backend-facing pages are handed.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn BackendApi>,
    pub identity: Arc<dyn IdentityProvider>,
    pub tokens: Arc<dyn TokenSource>,
    pub auth: Arc<AuthContext>,
    pub guard: GuardConfig,
}
