//! HTTP command source adapter.
//!
//! Implements [`CommandSource`] on top of any [`HttpClient`]: builds the
//! endpoint path and bearer header, then hands status + body to
//! [`wire::decode_response`](crate::wire::decode_response).  The HTTP
//! stack itself belongs to the embedding app.

use log::debug;

use crate::app::commands::{Credential, DeviceId, FetchOutcome};
use crate::app::ports::CommandSource;
use crate::error::FetchError;
use crate::wire::{commands_path, decode_response};

/// A raw HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Minimal GET client supplied by the platform.
pub trait HttpClient {
    /// GET `path` with the given `Authorization` header value.
    /// Connection failures and timeouts map to the matching
    /// [`FetchError`] variants.
    async fn get(&self, path: &str, authorization: &str) -> Result<HttpResponse, FetchError>;
}

/// Pull-endpoint command source.
pub struct HttpCommandSource<H> {
    client: H,
}

impl<H: HttpClient> HttpCommandSource<H> {
    pub fn new(client: H) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &H {
        &self.client
    }
}

impl<H: HttpClient> CommandSource for HttpCommandSource<H> {
    async fn fetch_latest(
        &self,
        device: &DeviceId,
        credential: &Credential,
    ) -> Result<FetchOutcome, FetchError> {
        let path = commands_path(device);
        let response = self.client.get(&path, &credential.bearer()).await?;
        debug!("HTTP: GET {} -> {}", path, response.status);
        decode_response(response.status, &response.body)
    }
}
