//! Identity fetchers: exchange a credential for a normalized [`UserProfile`].
//!
//! Both fetchers are stateless. They never touch the session or the
//! credential store; the session manager decides what a failure means.

use crate::api::{ApiClient, GoogleProfileResponse, RequestConfig, UserResponse};
use crate::{FetchError, UserProfile};
use tracing::debug;

/// Fetch the first-party profile for `token` via `GET /user`.
pub async fn fetch_first_party_profile(
    api: &ApiClient,
    token: &str,
) -> Result<UserProfile, FetchError> {
    let response = api.current_user(&RequestConfig::with_bearer(token)).await?;
    let profile = UserProfile::try_from(response)?;
    debug!(user_id = %profile.id, "Fetched first-party profile");
    Ok(profile)
}

/// Fetch the Google profile for `access_token` through the backend bridge.
pub async fn fetch_provider_profile(
    api: &ApiClient,
    config: &RequestConfig,
    access_token: &str,
) -> Result<UserProfile, FetchError> {
    let response = api.exchange_google_token(config, access_token).await?;
    let profile = UserProfile::try_from(response)?;
    debug!(user_id = %profile.id, "Fetched Google profile");
    Ok(profile)
}

fn required(value: Option<String>, field: &str) -> Result<String, FetchError> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(FetchError::malformed(format!("missing {}", field))),
    }
}

impl TryFrom<UserResponse> for UserProfile {
    type Error = FetchError;

    fn try_from(response: UserResponse) -> Result<Self, Self::Error> {
        if response.id.is_empty() {
            return Err(FetchError::malformed("missing id"));
        }

        Ok(Self {
            id: response.id,
            name: response.name.unwrap_or_default(),
            email: required(response.email, "email")?,
            photo_url: response.photo.unwrap_or_default(),
        })
    }
}

impl TryFrom<GoogleProfileResponse> for UserProfile {
    type Error = FetchError;

    fn try_from(response: GoogleProfileResponse) -> Result<Self, Self::Error> {
        let email = response
            .email_addresses
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::malformed("empty emailAddresses"))?
            .value;
        let name = response
            .names
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::malformed("empty names"))?
            .display_name
            .ok_or_else(|| FetchError::malformed("missing names[0].displayName"))?;
        let photo_url = response
            .photos
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::malformed("empty photos"))?
            .url
            .ok_or_else(|| FetchError::malformed("missing photos[0].url"))?;

        Ok(Self {
            id: required(response.resource_name, "resourceName")?,
            name,
            email: required(email, "emailAddresses[0].value")?,
            photo_url,
        })
    }
}
