use url::Url;

use crate::ClientError;

pub const DEFAULT_BASE_URI: &str = "https://integration.familysearch.org";
pub const DEFAULT_COLLECTION_PATH: &str = "/platform/collections/tree";

const ENV_BASE_URI: &str = "FAMILYSEARCH_BASE_URI";
const ENV_USERNAME: &str = "FAMILYSEARCH_USERNAME";
const ENV_PASSWORD: &str = "FAMILYSEARCH_PASSWORD";
const ENV_CLIENT_ID: &str = "FAMILYSEARCH_CLIENT_ID";

/// OAuth2 password-grant credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub client_id: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("client_id", &self.client_id)
            .finish()
    }
}

#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub(crate) base_uri: Url,
    pub(crate) collection_path: String,
    pub(crate) user_agent: String,
    pub(crate) credentials: Option<Credentials>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_uri: Url::parse(DEFAULT_BASE_URI).expect("default base URI is valid"),
            collection_path: DEFAULT_COLLECTION_PATH.to_string(),
            user_agent: concat!("familytree/", env!("CARGO_PKG_VERSION")).to_string(),
            credentials: None,
        }
    }
}

impl ClientConfig {
    /// Builds a configuration from `FAMILYSEARCH_*` environment variables.
    ///
    /// Credentials are only set if all of the username, password,
    /// and client ID are present.
    pub fn from_env() -> Result<Self, ClientError> {
        let mut config = Self::default();
        if let Ok(base) = std::env::var(ENV_BASE_URI) {
            config = config.base_uri(&base)?;
        }

        let username = std::env::var(ENV_USERNAME).ok();
        let password = std::env::var(ENV_PASSWORD).ok();
        let client_id = std::env::var(ENV_CLIENT_ID).ok();
        if let (Some(username), Some(password), Some(client_id)) = (username, password, client_id) {
            config = config.credentials(Credentials { username, password, client_id });
        }

        Ok(config)
    }

    /// Set the root of the API (scheme and host).
    pub fn base_uri(self, base_uri: &str) -> Result<Self, ClientError> {
        let base_uri = Url::parse(base_uri).map_err(|source| ClientError::InvalidUri {
            uri: base_uri.to_string(),
            source,
        })?;

        Ok(Self { base_uri, ..self })
    }

    /// Set the path of the Family Tree collection, relative to the base URI.
    pub fn collection_path(self, collection_path: impl Into<String>) -> Self {
        Self { collection_path: collection_path.into(), ..self }
    }

    pub fn user_agent(self, user_agent: impl Into<String>) -> Self {
        Self { user_agent: user_agent.into(), ..self }
    }

    pub fn credentials(self, credentials: impl Into<Option<Credentials>>) -> Self {
        Self { credentials: credentials.into(), ..self }
    }

    pub fn get_credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn collection_uri(&self) -> Result<Url, ClientError> {
        self.base_uri
            .join(&self.collection_path)
            .map_err(|source| ClientError::InvalidUri {
                uri: self.collection_path.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn collection_uri_joins_base() -> miette::Result<()> {
        let config = ClientConfig::default().base_uri("http://localhost:8080/")?;
        assert_eq!(
            config.collection_uri()?.as_str(),
            "http://localhost:8080/platform/collections/tree"
        );
        Ok(())
    }

    #[test]
    fn rejects_relative_base() {
        let result = ClientConfig::default().base_uri("not a url");
        assert!(matches!(result, Err(ClientError::InvalidUri { .. })));
    }

    #[test]
    fn credentials_are_redacted() {
        let creds = Credentials {
            username: "tum000205905".to_string(),
            password: "hunter2".to_string(),
            client_id: "ABCD".to_string(),
        };

        let debug = format!("{creds:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("tum000205905"));
    }
}
