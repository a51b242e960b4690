use std::sync::Arc;

use gedcomx::{json::fs::FamilySearchPlatform, FS_JSON_MEDIA_TYPE};
use http::{header, HeaderValue, Method};
use tracing::instrument;
use url::Url;

use crate::{
    config::ClientConfig,
    transport::{HttpTransport, Transport, TransportError},
    ClientError,
};

const FORM_MEDIA_TYPE: &str = "application/x-www-form-urlencoded";

/// A handle for talking to the Family Tree API.
///
/// Cloning is cheap; clones share the same transport. Authenticating
/// produces a new `Client` rather than changing this one.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    config: Arc<ClientConfig>,
    access_token: Option<Arc<str>>,
}

/// The request half of an exchange, kept for diagnostics.
#[derive(Clone, Debug)]
pub(crate) struct RequestLine {
    pub method: Method,
    pub uri: Url,
}

impl Client {
    pub fn new(transport: impl Transport + 'static, config: ClientConfig) -> Self {
        Self {
            transport: Arc::new(transport),
            config: Arc::new(config),
            access_token: None,
        }
    }

    /// Creates a client that talks to the network.
    pub fn http(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(&config.user_agent)?;
        Ok(Self::new(transport, config))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn with_access_token(&self, access_token: impl Into<Arc<str>>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            ..self.clone()
        }
    }

    /// Resolves a possibly-relative reference against `base`.
    pub(crate) fn resolve(base: &Url, href: &str) -> Result<Url, ClientError> {
        base.join(href).map_err(|source| ClientError::InvalidUri {
            uri: href.to_string(),
            source,
        })
    }

    #[instrument(skip_all, fields(%method, %uri))]
    pub(crate) fn send(
        &self,
        method: Method,
        uri: &Url,
        body: Option<&FamilySearchPlatform>,
    ) -> Result<(RequestLine, http::Response<Vec<u8>>), ClientError> {
        let body = match body {
            Some(doc) => serde_json::to_vec(doc).map_err(|source| ClientError::Encode {
                uri: uri.clone(),
                source,
            })?,
            None => Vec::new(),
        };

        let content_type = (!body.is_empty()).then_some(FS_JSON_MEDIA_TYPE);
        self.execute(method, uri, content_type, body)
    }

    #[instrument(skip_all, fields(%uri))]
    pub(crate) fn send_form(
        &self,
        uri: &Url,
        fields: &[(&str, &str)],
    ) -> Result<(RequestLine, http::Response<Vec<u8>>), ClientError> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish()
            .into_bytes();

        self.execute(Method::POST, uri, Some(FORM_MEDIA_TYPE), body)
    }

    fn execute(
        &self,
        method: Method,
        uri: &Url,
        content_type: Option<&'static str>,
        body: Vec<u8>,
    ) -> Result<(RequestLine, http::Response<Vec<u8>>), ClientError> {
        let mut builder = http::Request::builder()
            .method(method.clone())
            .uri(uri.as_str())
            .header(header::ACCEPT, FS_JSON_MEDIA_TYPE)
            .header(header::USER_AGENT, &self.config.user_agent);

        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }

        if let Some(token) = &self.access_token {
            let value = HeaderValue::try_from(format!("Bearer {token}"))
                .map_err(|_| ClientError::InvalidAccessToken)?;
            builder = builder.header(header::AUTHORIZATION, value);
        }

        let request = builder
            .body(body)
            .map_err(|source| TransportError::Message { uri: uri.to_string(), source })?;

        let response = self.transport.execute(request)?;
        tracing::debug!(status = %response.status(), "response received");

        Ok((RequestLine { method, uri: uri.clone() }, response))
    }
}
