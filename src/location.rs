//! One-shot location fix contract.

use std::future::Future;

use thiserror::Error;

use crate::types::Coords;

/// Outcome of a foreground location permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    /// The user granted access.
    Granted,
    /// The user denied access.
    Denied,
    /// The user has not decided yet.
    Undetermined,
}

/// Reasons a fix could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// Permission was not granted.
    #[error("Permission to access location was denied.")]
    PermissionDenied,
    /// The platform failed to produce a position.
    #[error("Error fetching location: {0}")]
    Unavailable(String),
}

/// Device position source.
///
/// Both calls may wait on the platform for seconds; implementors can write
/// them as `async fn`.
pub trait LocationProvider {
    /// Requests foreground location permission.
    fn request_permission(&self) -> impl Future<Output = PermissionStatus> + Send;
    /// Fetches the current position once.
    fn current_position(&self) -> impl Future<Output = Result<Coords, LocationError>> + Send;
}

/// Requests permission, then fetches one fix. No retry, no caching.
pub async fn get_current_fix<P: LocationProvider + ?Sized>(
    provider: &P,
) -> Result<Coords, LocationError> {
    match provider.request_permission().await {
        PermissionStatus::Granted => {}
        status => {
            tracing::debug!(?status, "location permission not granted");
            return Err(LocationError::PermissionDenied);
        }
    }

    provider.current_position().await.inspect_err(|error| {
        tracing::warn!(%error, "location fix failed");
    })
}
