//! Dispatch use case
//!
//! Sends one validated request through the `HttpClient` port and returns
//! the response record or the transport failure. Nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use vouch_domain::{request::RequestDescriptor, response::ResponseRecord};

use crate::ports::{CancellationReceiver, HttpClient};
use crate::{ApplicationError, ApplicationResult};

/// Timeout used when neither the dispatcher nor the descriptor sets one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Use case for dispatching request descriptors.
///
/// # Example
///
/// ```ignore
/// let dispatcher = Dispatcher::new(Arc::new(ReqwestHttpClient::new()?))
///     .with_timeout(Duration::from_secs(10));
///
/// let request = RequestDescriptor::builder()
///     .get("https://api.example.com/company")
///     .build()?;
/// let response = dispatcher.dispatch(&request).await?;
/// ```
pub struct Dispatcher<C: HttpClient> {
    client: Arc<C>,
    timeout: Duration,
}

impl<C: HttpClient> Dispatcher<C> {
    /// Creates a dispatcher using [`DEFAULT_TIMEOUT`].
    pub const fn new(client: Arc<C>) -> Self {
        Self {
            client,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the default timeout for requests without their own override.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Default timeout applied by this dispatcher.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Timeout that applies to `request`.
    #[must_use]
    pub fn effective_timeout(&self, request: &RequestDescriptor) -> Duration {
        request.timeout().unwrap_or(self.timeout)
    }

    /// Sends the request once.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Transport` when no response was obtained.
    pub async fn dispatch(&self, request: &RequestDescriptor) -> ApplicationResult<ResponseRecord> {
        let timeout = self.effective_timeout(request);
        tracing::debug!(
            request_id = %request.id(),
            method = %request.method(),
            url = %request.url(),
            timeout_ms = millis(timeout),
            "dispatching request"
        );

        match self.client.execute(request, timeout).await {
            Ok(response) => {
                tracing::info!(
                    request_id = %request.id(),
                    method = %request.method(),
                    url = %request.url(),
                    status = response.status,
                    elapsed_ms = millis(response.duration),
                    "response received"
                );
                Ok(response)
            }
            Err(e) => {
                tracing::warn!(
                    request_id = %request.id(),
                    method = %request.method(),
                    url = %request.url(),
                    error = %e,
                    "transport failure"
                );
                Err(e.into())
            }
        }
    }

    /// Sends the request once, giving up if `cancel` fires first.
    ///
    /// On cancellation the in-flight future is dropped, which releases the
    /// underlying connection; no partial response is returned.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Cancelled` or the dispatch error.
    pub async fn dispatch_with_cancellation(
        &self,
        request: &RequestDescriptor,
        mut cancel: CancellationReceiver,
    ) -> ApplicationResult<ResponseRecord> {
        tokio::select! {
            result = self.dispatch(request) => result,
            () = cancel.cancelled() => {
                tracing::info!(request_id = %request.id(), "dispatch cancelled");
                Err(ApplicationError::Cancelled)
            }
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl<C: HttpClient> Clone for Dispatcher<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            timeout: self.timeout,
        }
    }
}
