//! HTTP access to tile servers.

use futures::future::{BoxFuture, FutureExt};
use std::time::Duration;

use crate::error::{Error, FetchError};

/// Fixed per-request timeout used unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches the raw bytes of a tile.
///
/// Implemented by [`HttpTileClient`] for real downloads; tests substitute an
/// in-memory implementation.
pub trait TileClient: Send + Sync {
    /// Performs a GET request, failing on transport errors and on any
    /// non-success status code.
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, FetchError>>;
}

/// [`TileClient`] backed by `reqwest`.
#[derive(Clone, Debug)]
pub struct HttpTileClient {
    client: reqwest::Client,
}

impl HttpTileClient {
    /// Creates a client sending our user agent on every request.
    ///
    /// Pass the zero duration to disable the timeout.
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let mut builder = reqwest::Client::builder().user_agent(user_agent());
        if timeout > Duration::ZERO {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(Error::Client)?;

        Ok(Self { client })
    }
}

impl TileClient for HttpTileClient {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, FetchError>> {
        async move {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| FetchError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| FetchError::Transport(e.to_string()))?;

            Ok(body.to_vec())
        }
        .boxed()
    }
}

pub(crate) fn user_agent() -> String {
    format!(
        "{}/{} (+https://github.com/trigpointinguk/android)",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )
}
