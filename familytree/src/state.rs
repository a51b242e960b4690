//! Immutable snapshots of remote resources.

use std::{collections::BTreeMap, marker::PhantomData};

use gedcomx::json::{
    fs::FamilySearchPlatform,
    v1::{Fact, Links},
};
use http::{HeaderMap, Method, StatusCode};
use url::Url;

use crate::{
    client::{Client, RequestLine},
    ClientError, ResponseDetail,
};

/// The link relation by which a fact can be deleted.
pub const CONCLUSION_REL: &str = "conclusion";

/// Selects which resource a [`State`] describes, and so which
/// operations it offers.
pub trait Kind {
    /// Human-readable name, used in logs.
    const NAME: &'static str;

    /// The links embedded in the primary resource of a document.
    fn embedded_links(doc: &FamilySearchPlatform) -> Option<&Links>;
}

/// The result of one request against a remote resource.
///
/// A `State` is a snapshot: operations on it perform a round trip and
/// return a new `State`, leaving the receiver untouched. A state is stale
/// after any mutating call; use [`State::get`] to observe the result.
pub struct State<K> {
    pub(crate) client: Client,
    request: RequestLine,
    self_uri: Url,
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    entity: Option<FamilySearchPlatform>,
    links: BTreeMap<String, Url>,
    _kind: PhantomData<fn() -> K>,
}

impl<K> Clone for State<K> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            request: self.request.clone(),
            self_uri: self.self_uri.clone(),
            status: self.status,
            headers: self.headers.clone(),
            body: self.body.clone(),
            entity: self.entity.clone(),
            links: self.links.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: Kind> std::fmt::Debug for State<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State")
            .field("kind", &K::NAME)
            .field("request", &format_args!("{} {}", self.request.method, self.request.uri))
            .field("status", &self.status)
            .field("self_uri", &self.self_uri.as_str())
            .field("entity", &self.entity)
            .finish_non_exhaustive()
    }
}

impl<K: Kind> State<K> {
    /// Builds a state from a completed exchange.
    ///
    /// The entity is only decoded for successful responses with a body;
    /// in particular it is always `None` for `404 Not Found` and `410 Gone`.
    pub(crate) fn from_response(
        client: Client,
        request: RequestLine,
        response: http::Response<Vec<u8>>,
        self_uri: Url,
    ) -> Result<Self, ClientError> {
        let (parts, body) = response.into_parts();

        let entity = if parts.status.is_success() && !body.is_empty() {
            let doc: FamilySearchPlatform =
                serde_json::from_slice(&body).map_err(|source| ClientError::Decode {
                    uri: request.uri.clone(),
                    source,
                })?;
            Some(doc)
        } else {
            None
        };

        let mut links = BTreeMap::new();
        if let Some(embedded) = entity.as_ref().and_then(K::embedded_links) {
            for (rel, link) in embedded {
                if let Some(href) = &link.href {
                    links.insert(rel.clone(), Client::resolve(&self_uri, &href.to_string())?);
                }
            }
        }

        for value in parts.headers.get_all(http::header::LINK) {
            let Ok(value) = value.to_str() else {
                continue;
            };

            for (rel, href) in parse_link_header(value) {
                links.insert(rel.to_string(), Client::resolve(&self_uri, href)?);
            }
        }

        tracing::debug!(kind = K::NAME, status = %parts.status, uri = %self_uri, "new state");

        Ok(Self {
            client,
            request,
            self_uri,
            status: parts.status,
            headers: parts.headers,
            body,
            entity,
            links,
            _kind: PhantomData,
        })
    }

    /// Performs a request and wraps the response as a state of kind `K2`.
    pub(crate) fn transition<K2: Kind>(
        &self,
        method: Method,
        uri: &Url,
        body: Option<&FamilySearchPlatform>,
        self_uri: Url,
    ) -> Result<State<K2>, ClientError> {
        let (request, response) = self.client.send(method, uri, body)?;
        State::from_response(self.client.clone(), request, response, self_uri)
    }

    /// Like [`State::transition`], but the new state describes the same resource.
    pub(crate) fn follow(
        &self,
        method: Method,
        uri: &Url,
        body: Option<&FamilySearchPlatform>,
    ) -> Result<Self, ClientError> {
        self.transition(method, uri, body, self.self_uri.clone())
    }

    /// The URI of the resource this state describes; for a newly-created
    /// resource this is its `Location`.
    pub fn self_uri(&self) -> &Url {
        &self.self_uri
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn entity(&self) -> Option<&FamilySearchPlatform> {
        self.entity.as_ref()
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn links(&self) -> &BTreeMap<String, Url> {
        &self.links
    }

    pub fn link(&self, rel: &str) -> Option<&Url> {
        self.links.get(rel)
    }

    pub(crate) fn require_link(&self, rel: &str) -> Result<&Url, ClientError> {
        self.link(rel).ok_or_else(|| ClientError::MissingLink {
            rel: rel.to_string(),
            uri: self.self_uri.clone(),
        })
    }

    pub(crate) fn request_method(&self) -> &Method {
        &self.request.method
    }

    /// Whether `self_uri` names a different resource than the one the
    /// request was sent to, as after a successful creation.
    pub(crate) fn is_redirected(&self) -> bool {
        self.self_uri != self.request.uri
    }

    /// The value of the `X-ENTITY-ID` header, sent in reply to creation requests.
    pub fn entity_id(&self) -> Option<&str> {
        self.headers.get("x-entity-id").and_then(|v| v.to_str().ok())
    }

    pub fn is_gone(&self) -> bool {
        self.status == StatusCode::GONE
    }

    pub fn response_detail(&self) -> ResponseDetail {
        ResponseDetail::new(
            self.request.method.clone(),
            self.request.uri.clone(),
            self.status,
            &self.headers,
            &self.body,
        )
    }

    /// Checks the response status, producing a diagnostic that includes the
    /// HTTP response detail if it does not match.
    pub fn expect_status(self, expected: StatusCode) -> Result<Self, ClientError> {
        if self.status == expected {
            Ok(self)
        } else {
            let detail = self.response_detail();
            tracing::warn!(kind = K::NAME, %expected, actual = %self.status, "unexpected status");
            Err(ClientError::UnexpectedStatus { expected, detail: Box::new(detail) })
        }
    }

    /// Checks that the response status is a success (2xx).
    pub fn ensure_success(self) -> Result<Self, ClientError> {
        if self.status.is_success() {
            Ok(self)
        } else {
            let detail = self.response_detail();
            tracing::warn!(kind = K::NAME, actual = %self.status, "unsuccessful status");
            Err(ClientError::Unsuccessful { detail: Box::new(detail) })
        }
    }

    /// Deletes a fact through its `conclusion` link.
    pub(crate) fn delete_conclusion(&self, fact: &Fact) -> Result<Self, ClientError> {
        let href = fact
            .links
            .get(CONCLUSION_REL)
            .and_then(|link| link.href.as_ref())
            .ok_or_else(|| ClientError::MissingLink {
                rel: CONCLUSION_REL.to_string(),
                uri: self.self_uri.clone(),
            })?;

        let uri = Client::resolve(&self.self_uri, &href.to_string())?;
        self.follow(Method::DELETE, &uri, None)
    }

    /// Reads the resource again.
    pub fn get(&self) -> Result<Self, ClientError> {
        self.follow(Method::GET, &self.self_uri, None)
    }

    /// Deletes the resource; it may later be restored.
    pub fn delete(&self) -> Result<Self, ClientError> {
        self.follow(Method::DELETE, &self.self_uri, None)
    }

    /// Restores a deleted resource.
    ///
    /// Uses the `restore` link if the server provided one (as it does with
    /// `410 Gone`), otherwise the conventional `{self}/restore` address.
    pub fn restore(&self) -> Result<Self, ClientError> {
        let uri = match self.link("restore") {
            Some(uri) => uri.clone(),
            None => child_uri(&self.self_uri, "restore")?,
        };

        self.follow(Method::POST, &uri, None)
    }
}

/// Appends a path segment to a resource URI.
pub(crate) fn child_uri(base: &Url, segment: &str) -> Result<Url, ClientError> {
    let mut uri = base.clone();
    uri.path_segments_mut()
        .map_err(|()| ClientError::InvalidUri {
            uri: base.to_string(),
            source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
        })?
        .pop_if_empty()
        .push(segment);
    Ok(uri)
}

/// Parses an RFC 8288 `Link` header into `(rel, href)` pairs.
///
/// Entries without a `rel` parameter are skipped. A `rel` containing
/// several space-separated relation types yields one pair for each.
pub(crate) fn parse_link_header(value: &str) -> Vec<(&str, &str)> {
    let mut result = Vec::new();
    for entry in split_unquoted(value, ',') {
        let Some(rest) = entry.trim().strip_prefix('<') else {
            continue;
        };

        let Some((href, params)) = rest.split_once('>') else {
            continue;
        };

        for param in split_unquoted(params, ';') {
            let Some((name, value)) = param.split_once('=') else {
                continue;
            };

            if name.trim().eq_ignore_ascii_case("rel") {
                for rel in value.trim().trim_matches('"').split_whitespace() {
                    result.push((rel, href.trim()));
                }
            }
        }
    }

    result
}

/// Splits on `sep`, ignoring separators inside quotes or angle brackets.
fn split_unquoted(value: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut in_angles = false;
    let mut start = 0;

    for (ix, c) in value.char_indices() {
        match c {
            '"' if !in_angles => in_quotes = !in_quotes,
            '<' if !in_quotes => in_angles = true,
            '>' if !in_quotes => in_angles = false,
            c if c == sep && !in_quotes && !in_angles => {
                parts.push(&value[start..ix]);
                start = ix + c.len_utf8();
            }
            _ => {}
        }
    }

    parts.push(&value[start..]);
    parts
}
