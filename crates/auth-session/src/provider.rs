//! Google session revocation.

use tracing::info;

/// Releases the Google session held by the identity provider SDK.
pub trait ProviderSignOut: Send + Sync {
    fn sign_out(&self);
}

/// Sign-out for hosts without a provider SDK session: only records the event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProviderSignOut;

impl ProviderSignOut for TracingProviderSignOut {
    fn sign_out(&self) {
        info!("Google provider session released");
    }
}
