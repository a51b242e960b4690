use std::fmt::Display;

use http::{Method, StatusCode};
use url::Url;

use crate::transport::TransportError;

/// How many bytes of a response body to include in diagnostics.
const BODY_EXCERPT_LEN: usize = 512;

#[derive(thiserror::Error, Debug, miette::Diagnostic)]
pub enum ClientError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Transport(#[from] TransportError),

    #[error("Invalid URI `{uri}`")]
    #[diagnostic(code(familytree::invalid_uri))]
    InvalidUri {
        uri: String,
        source: url::ParseError,
    },

    #[error("URI {uri} cannot be used as a resource reference")]
    #[diagnostic(code(familytree::reference))]
    Reference {
        uri: Url,
        source: http::uri::InvalidUri,
    },

    #[error("Failed to encode request body for {uri}")]
    #[diagnostic(code(familytree::encode))]
    Encode {
        uri: Url,
        source: serde_json::Error,
    },

    #[error("Failed to decode response body from {uri}")]
    #[diagnostic(
        code(familytree::decode),
        help("the server did not return a FamilySearch JSON document")
    )]
    Decode {
        uri: Url,
        source: serde_json::Error,
    },

    #[error("No `{rel}` link available from {uri}")]
    #[diagnostic(
        code(familytree::missing_link),
        help("links are only present on states read from the server; try calling `get()` first")
    )]
    MissingLink { rel: String, uri: Url },

    #[error("No entity present in response from {uri}")]
    #[diagnostic(code(familytree::missing_entity))]
    MissingEntity { uri: Url },

    #[error("Expected {expected}, got {}", .detail.status)]
    #[diagnostic(code(familytree::unexpected_status), help("{detail}"))]
    UnexpectedStatus {
        expected: StatusCode,
        detail: Box<ResponseDetail>,
    },

    #[error("Expected a successful status, got {}", .detail.status)]
    #[diagnostic(code(familytree::unsuccessful), help("{detail}"))]
    Unsuccessful { detail: Box<ResponseDetail> },

    #[error("Authentication failed")]
    #[diagnostic(code(familytree::authentication), help("{detail}"))]
    Authentication { detail: Box<ResponseDetail> },

    #[error("Access token is not a valid header value")]
    #[diagnostic(code(familytree::invalid_access_token))]
    InvalidAccessToken,

    #[error("No credentials configured")]
    #[diagnostic(
        code(familytree::no_credentials),
        help("set FAMILYSEARCH_USERNAME, FAMILYSEARCH_PASSWORD, and FAMILYSEARCH_CLIENT_ID")
    )]
    NoCredentials,
}

/// A summary of one HTTP exchange, for use in failure messages.
#[derive(Clone, Debug)]
pub struct ResponseDetail {
    pub method: Method,
    pub uri: Url,
    pub status: StatusCode,
    pub warnings: Vec<String>,
    pub body_excerpt: String,
}

impl ResponseDetail {
    pub(crate) fn new(
        method: Method,
        uri: Url,
        status: StatusCode,
        headers: &http::HeaderMap,
        body: &[u8],
    ) -> Self {
        let warnings = headers
            .get_all(http::header::WARNING)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();

        let body = String::from_utf8_lossy(body);
        let body_excerpt = match body.char_indices().nth(BODY_EXCERPT_LEN) {
            Some((ix, _)) => format!("{}…", &body[..ix]),
            None => body.into_owned(),
        };

        Self { method, uri, status, warnings, body_excerpt }
    }
}

impl Display for ResponseDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} returned {}", self.method, self.uri, self.status)?;
        for warning in &self.warnings {
            write!(f, "\nWarning: {warning}")?;
        }

        if !self.body_excerpt.is_empty() {
            write!(f, "\n{}", self.body_excerpt)?;
        }

        Ok(())
    }
}
