//! Internal error helpers for mapping reqwest errors to [`ProviderError`].

use std::time::Duration;

use marginalia_types::ProviderError;

/// Reported when reqwest times out without saying after how long.
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Map a [`reqwest::Error`] raised while opening a request.
///
/// Non-2xx statuses never reach this function: they travel with the response
/// body so the stream decoder can surface the API's own message.
pub(crate) fn map_reqwest_error(err: reqwest::Error, timeout: Option<Duration>) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
    } else if err.is_builder() {
        ProviderError::InvalidRequest(err.to_string())
    } else {
        ProviderError::RequestFailed(err.to_string())
    }
}
