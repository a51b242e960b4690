use gedcomx::{json::fs::FamilySearchPlatform, FS_JSON_MEDIA_TYPE};
use http::{header, StatusCode};
use url::Url;

/// A response from the in-memory tree, before it is rendered to HTTP.
#[derive(Debug)]
pub(crate) enum Reply {
    Ok(FamilySearchPlatform),
    Json(StatusCode, serde_json::Value),
    Created { path: String, id: String },
    NoContent,
    /// The resource was deleted; `restore` is the path that restores it.
    Gone { restore: String },
    NotFound,
    BadRequest(String),
    Unauthorized,
    MethodNotAllowed,
}

impl Reply {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Reply::BadRequest(message.into())
    }

    pub(crate) fn status(&self) -> StatusCode {
        match self {
            Reply::Ok(_) => StatusCode::OK,
            Reply::Json(status, _) => *status,
            Reply::Created { .. } => StatusCode::CREATED,
            Reply::NoContent => StatusCode::NO_CONTENT,
            Reply::Gone { .. } => StatusCode::GONE,
            Reply::NotFound => StatusCode::NOT_FOUND,
            Reply::BadRequest(_) => StatusCode::BAD_REQUEST,
            Reply::Unauthorized => StatusCode::UNAUTHORIZED,
            Reply::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    pub(crate) fn into_response(self, base: &Url) -> Result<http::Response<Vec<u8>>, http::Error> {
        let builder = http::Response::builder().status(self.status());
        let absolute = |path: &str| base.join(path).map(String::from).unwrap_or_else(|_| path.to_string());

        match self {
            Reply::Ok(doc) => match serde_json::to_vec(&doc) {
                Ok(body) => builder.header(header::CONTENT_TYPE, FS_JSON_MEDIA_TYPE).body(body),
                Err(err) => http::Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .body(err.to_string().into_bytes()),
            },
            Reply::Json(_, value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(value.to_string().into_bytes()),
            Reply::Created { path, id } => builder
                .header(header::LOCATION, absolute(&path))
                .header("X-ENTITY-ID", id)
                .body(Vec::new()),
            Reply::Gone { restore } => builder
                .header(header::LINK, format!("<{}>; rel=\"restore\"", absolute(&restore)))
                .body(Vec::new()),
            Reply::BadRequest(message) => builder
                .header(header::WARNING, format!("299 - \"{message}\""))
                .body(Vec::new()),
            Reply::NoContent | Reply::NotFound | Reply::Unauthorized | Reply::MethodNotAllowed => {
                builder.body(Vec::new())
            }
        }
    }
}
