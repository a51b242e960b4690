//! An in-memory Family Tree server.
//!
//! [`FakeFamilyTree`] implements [`Transport`], so a [`Client`] built on it
//! behaves like one talking to the real API: it authenticates, creates
//! persons and relationships, and soft-deletes and restores them. It is
//! used for offline testing and by `fstree --offline`.

use std::sync::{Arc, Mutex, PoisonError};

use gedcomx::json::fs::{FamilySearchPlatform, ParentRole};
use matchit::Router;
use url::Url;

use crate::{
    client::Client,
    config::{ClientConfig, Credentials},
    transport::{Transport, TransportError},
};

mod reply;
mod tree;

use reply::Reply;
use tree::{Tree, COLLECTION_PATH, FAMILIES_PATH, PERSONS_PATH, RELATIONSHIPS_PATH, TOKEN_PATH};

pub const BASE_URI: &str = "https://fake.familysearch.test";
pub const USERNAME: &str = "fake-user";
pub const PASSWORD: &str = "fake-password";
pub const CLIENT_ID: &str = "FAKE-CLIENT-ID";

#[derive(Copy, Clone, Debug)]
enum Route {
    Token,
    Collection,
    Persons,
    Person,
    PersonRestore,
    Relationships,
    Relationship,
    RelationshipRestore,
    RelationshipConclusion,
    Families,
    Family,
    FamilyRestore,
    FamilyConclusion,
    FamilyParent(ParentRole),
}

impl Route {
    fn requires_auth(self) -> bool {
        !matches!(self, Route::Token | Route::Collection)
    }
}

fn router() -> Router<Route> {
    let routes = [
        (TOKEN_PATH.to_string(), Route::Token),
        (COLLECTION_PATH.to_string(), Route::Collection),
        (PERSONS_PATH.to_string(), Route::Persons),
        (format!("{PERSONS_PATH}/{{id}}"), Route::Person),
        (format!("{PERSONS_PATH}/{{id}}/restore"), Route::PersonRestore),
        (RELATIONSHIPS_PATH.to_string(), Route::Relationships),
        (format!("{RELATIONSHIPS_PATH}/{{id}}"), Route::Relationship),
        (format!("{RELATIONSHIPS_PATH}/{{id}}/restore"), Route::RelationshipRestore),
        (format!("{RELATIONSHIPS_PATH}/{{id}}/conclusions/{{fact}}"), Route::RelationshipConclusion),
        (FAMILIES_PATH.to_string(), Route::Families),
        (format!("{FAMILIES_PATH}/{{id}}"), Route::Family),
        (format!("{FAMILIES_PATH}/{{id}}/restore"), Route::FamilyRestore),
        (format!("{FAMILIES_PATH}/{{id}}/conclusions/{{fact}}"), Route::FamilyConclusion),
        (format!("{FAMILIES_PATH}/{{id}}/father"), Route::FamilyParent(ParentRole::Father)),
        (format!("{FAMILIES_PATH}/{{id}}/mother"), Route::FamilyParent(ParentRole::Mother)),
    ];

    let mut router = Router::new();
    for (path, route) in routes {
        router.insert(path, route).expect("fake routes do not conflict");
    }

    router
}

/// A Family Tree held in memory. Clones share the same tree.
#[derive(Clone)]
pub struct FakeFamilyTree {
    base: Url,
    router: Arc<Router<Route>>,
    tree: Arc<Mutex<Tree>>,
}

impl Default for FakeFamilyTree {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeFamilyTree {
    pub fn new() -> Self {
        let base = Url::parse(BASE_URI).expect("fake base URI is valid");
        Self {
            tree: Arc::new(Mutex::new(Tree::new(base.clone(), Self::credentials()))),
            router: Arc::new(router()),
            base,
        }
    }

    /// The only credentials the fake accepts.
    pub fn credentials() -> Credentials {
        Credentials {
            username: USERNAME.to_string(),
            password: PASSWORD.to_string(),
            client_id: CLIENT_ID.to_string(),
        }
    }

    /// A configuration pointing at this tree, with valid credentials.
    pub fn config(&self) -> ClientConfig {
        ClientConfig { base_uri: self.base.clone(), ..ClientConfig::default() }
            .credentials(Self::credentials())
    }

    /// A client backed by this tree.
    pub fn client(&self) -> Client {
        Client::new(self.clone(), self.config())
    }

    fn dispatch(&self, method: &http::Method, path: &str, headers: &http::HeaderMap, body: &[u8]) -> Reply {
        let Ok(matched) = self.router.at(path) else {
            return Reply::NotFound;
        };

        let route = *matched.value;
        let id = matched.params.get("id").unwrap_or_default();
        let fact = matched.params.get("fact").unwrap_or_default();

        let mut tree = self.tree.lock().unwrap_or_else(PoisonError::into_inner);
        if route.requires_auth() && !tree.is_authorized(headers) {
            return Reply::Unauthorized;
        }

        let doc = || {
            serde_json::from_slice::<FamilySearchPlatform>(body)
                .map_err(|err| Reply::bad_request(format!("invalid request body: {err}")))
        };

        let result = match (route, method.as_str()) {
            (Route::Token, "POST") => Ok(tree.token(body)),
            (Route::Collection, "GET") => Ok(tree.collection()),

            (Route::Persons, "POST") => doc().map(|doc| tree.create_person(doc)),
            (Route::Person, "GET") => Ok(tree.read_person(id)),
            (Route::Person, "DELETE") => Ok(tree.delete_person(id)),
            (Route::PersonRestore, "POST") => Ok(tree.restore_person(id)),

            (Route::Relationships, "POST") => doc().map(|doc| tree.create_couple(doc)),
            (Route::Relationship, "GET") => Ok(tree.read_couple(id)),
            (Route::Relationship, "POST") => doc().map(|doc| tree.update_couple(id, doc)),
            (Route::Relationship, "DELETE") => Ok(tree.delete_couple(id)),
            (Route::RelationshipRestore, "POST") => Ok(tree.restore_couple(id)),
            (Route::RelationshipConclusion, "DELETE") => Ok(tree.delete_couple_fact(id, fact)),

            (Route::Families, "POST") => doc().map(|doc| tree.create_family(doc)),
            (Route::Family, "GET") => Ok(tree.read_family(id)),
            (Route::Family, "POST") => doc().map(|doc| tree.update_family(id, doc)),
            (Route::Family, "DELETE") => Ok(tree.delete_family(id)),
            (Route::FamilyRestore, "POST") => Ok(tree.restore_family(id)),
            (Route::FamilyConclusion, "DELETE") => Ok(tree.delete_family_fact(id, fact)),
            (Route::FamilyParent(role), "DELETE") => Ok(tree.delete_parent(id, role)),

            _ => Ok(Reply::MethodNotAllowed),
        };

        result.unwrap_or_else(|reply| reply)
    }
}

impl Transport for FakeFamilyTree {
    fn execute(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> Result<http::Response<Vec<u8>>, TransportError> {
        let (parts, body) = request.into_parts();
        let path = parts.uri.path();

        let reply = self.dispatch(&parts.method, path, &parts.headers, &body);
        tracing::debug!(method = %parts.method, path, status = %reply.status(), "fake tree handled request");

        reply
            .into_response(&self.base)
            .map_err(|source| TransportError::Message { uri: parts.uri.to_string(), source })
    }
}
