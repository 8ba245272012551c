use std::sync::Arc;

use mascot::auth::CredentialResolver;
use mascot::providers::configs::ProviderConfigs;
use mascot::store::MascotStore;

/// Shared application state. Everything here is read-only per request;
/// the gateway keeps no cross-request mutable state.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<CredentialResolver>,
    pub store: Arc<dyn MascotStore>,
    pub providers: ProviderConfigs,
}
