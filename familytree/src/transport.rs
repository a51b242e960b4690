//! The seam between the client and the network.

use tracing::instrument;

/// Executes a single HTTP request and returns the complete response.
///
/// Implementations must not retry or follow redirects on their own; status
/// codes are reported to the caller as-is.
pub trait Transport: Send + Sync {
    fn execute(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> Result<http::Response<Vec<u8>>, TransportError>;
}

#[derive(thiserror::Error, Debug, miette::Diagnostic)]
pub enum TransportError {
    #[error("Failed to build HTTP client")]
    #[diagnostic(code(familytree::transport::build))]
    Build { source: reqwest::Error },

    #[error("Request to {uri} failed")]
    #[diagnostic(
        code(familytree::transport::request),
        help("check network connectivity and the configured base URI")
    )]
    Request { uri: String, source: reqwest::Error },

    #[error("Invalid HTTP message for {uri}")]
    #[diagnostic(code(familytree::transport::message))]
    Message { uri: String, source: http::Error },
}

/// Sends requests over the network with a blocking `reqwest` client.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(user_agent: &str) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|source| TransportError::Build { source })?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    #[instrument(skip_all, fields(method = %request.method(), uri = %request.uri()))]
    fn execute(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> Result<http::Response<Vec<u8>>, TransportError> {
        let uri = request.uri().to_string();
        let (parts, body) = request.into_parts();

        let response = self
            .client
            .request(parts.method, &uri)
            .headers(parts.headers)
            .body(body)
            .send()
            .map_err(|source| TransportError::Request { uri: uri.clone(), source })?;

        let mut builder = http::Response::builder()
            .status(response.status())
            .version(response.version());
        if let Some(headers) = builder.headers_mut() {
            headers.extend(response.headers().clone());
        }

        let body = response
            .bytes()
            .map_err(|source| TransportError::Request { uri: uri.clone(), source })?;

        builder
            .body(body.to_vec())
            .map_err(|source| TransportError::Message { uri, source })
    }
}
