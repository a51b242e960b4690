//! The Family Tree collection: the entry point for authentication and for
//! creating persons and relationships.

use gedcomx::json::{
    fs::{ChildAndParentsRelationship, FamilySearchPlatform},
    v1::{Links, Person, Relationship},
};
use http::{header, Method, StatusCode};
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use crate::{
    child_and_parents::ChildAndParentsRelationshipState,
    client::Client,
    config::Credentials,
    person::PersonState,
    relationship::RelationshipState,
    state::{child_uri, Kind, State},
    ClientError, ResponseDetail,
};

pub const PERSONS_REL: &str = "persons";
pub const RELATIONSHIPS_REL: &str = "relationships";
pub const CHILD_AND_PARENTS_RELATIONSHIPS_REL: &str = "child-and-parents-relationships";
pub const TOKEN_REL: &str = "http://oauth.net/core/2.0/endpoint/token";

pub enum CollectionKind {}

impl Kind for CollectionKind {
    const NAME: &'static str = "collection";

    fn embedded_links(doc: &FamilySearchPlatform) -> Option<&Links> {
        doc.collection().map(|c| &c.links).or(Some(&doc.links))
    }
}

pub type CollectionState = State<CollectionKind>;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl CollectionState {
    /// Reads the Family Tree collection named by the client's configuration.
    #[instrument(skip_all)]
    pub fn read(client: Client) -> Result<Self, ClientError> {
        let uri = client.config().collection_uri()?;
        let (request, response) = client.send(Method::GET, &uri, None)?;
        State::from_response(client, request, response, uri)
    }

    /// Authenticates with the credentials from the client's configuration.
    pub fn authenticate(&self) -> Result<Self, ClientError> {
        let credentials = self
            .client
            .config()
            .get_credentials()
            .ok_or(ClientError::NoCredentials)?
            .clone();

        self.authenticate_via_oauth2_password(&credentials)
    }

    /// Performs an OAuth2 password grant against the collection's token
    /// endpoint, then re-reads the collection as the authenticated user.
    #[instrument(skip_all, fields(username = %credentials.username))]
    pub fn authenticate_via_oauth2_password(
        &self,
        credentials: &Credentials,
    ) -> Result<Self, ClientError> {
        let token_uri = self.require_link(TOKEN_REL)?.clone();
        let (request, response) = self.client.send_form(
            &token_uri,
            &[
                ("grant_type", "password"),
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
                ("client_id", credentials.client_id.as_str()),
            ],
        )?;

        let (parts, body) = response.into_parts();
        let detail = || {
            Box::new(ResponseDetail::new(
                request.method.clone(),
                request.uri.clone(),
                parts.status,
                &parts.headers,
                &body,
            ))
        };

        if parts.status != StatusCode::OK {
            return Err(ClientError::Authentication { detail: detail() });
        }

        let token: TokenResponse = serde_json::from_slice(&body)
            .map_err(|_| ClientError::Authentication { detail: detail() })?;

        tracing::info!("authenticated");
        self.authenticate_with_access_token(&token.access_token)
    }

    /// Uses an existing access token, re-reading the collection with it.
    pub fn authenticate_with_access_token(&self, access_token: &str) -> Result<Self, ClientError> {
        let client = self.client.with_access_token(access_token);
        let uri = self.self_uri().clone();
        let (request, response) = client.send(Method::GET, &uri, None)?;
        State::from_response(client, request, response, uri)
    }

    /// POSTs a document to a collection link; the new state describes the
    /// created resource (its `Location`).
    fn create<K: Kind>(
        &self,
        rel: &str,
        doc: &FamilySearchPlatform,
    ) -> Result<State<K>, ClientError> {
        let uri = self.require_link(rel)?.clone();
        let (request, response) = self.client.send(Method::POST, &uri, Some(doc))?;

        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(|location| Client::resolve(&uri, location))
            .transpose()?;

        let self_uri = location.unwrap_or_else(|| uri.clone());
        State::from_response(self.client.clone(), request, response, self_uri)
    }

    fn member_uri(&self, rel: &str, id: &str) -> Result<Url, ClientError> {
        child_uri(self.require_link(rel)?, id)
    }

    pub fn add_person(&self, person: &Person) -> Result<PersonState, ClientError> {
        self.create(PERSONS_REL, &FamilySearchPlatform::from(person.clone()))
    }

    pub fn read_person(&self, id: &str) -> Result<PersonState, ClientError> {
        let uri = self.member_uri(PERSONS_REL, id)?;
        self.transition(Method::GET, &uri, None, uri.clone())
    }

    /// Creates a couple relationship between two persons.
    pub fn add_spouse_relationship(
        &self,
        person1: &PersonState,
        person2: &PersonState,
    ) -> Result<RelationshipState, ClientError> {
        let relationship = Relationship::couple(person1.reference()?, person2.reference()?);
        self.create(RELATIONSHIPS_REL, &FamilySearchPlatform::from(relationship))
    }

    pub fn read_relationship(&self, id: &str) -> Result<RelationshipState, ClientError> {
        let uri = self.member_uri(RELATIONSHIPS_REL, id)?;
        self.transition(Method::GET, &uri, None, uri.clone())
    }

    /// Creates a child-and-parents relationship. At least one parent
    /// must be given for the server to accept it.
    pub fn add_child_and_parents_relationship(
        &self,
        child: &PersonState,
        father: Option<&PersonState>,
        mother: Option<&PersonState>,
    ) -> Result<ChildAndParentsRelationshipState, ClientError> {
        let relationship = ChildAndParentsRelationship::new(
            child.reference()?,
            father.map(PersonState::reference).transpose()?,
            mother.map(PersonState::reference).transpose()?,
        );

        self.create(
            CHILD_AND_PARENTS_RELATIONSHIPS_REL,
            &FamilySearchPlatform::from(relationship),
        )
    }

    pub fn read_child_and_parents_relationship(
        &self,
        id: &str,
    ) -> Result<ChildAndParentsRelationshipState, ClientError> {
        let uri = self.member_uri(CHILD_AND_PARENTS_RELATIONSHIPS_REL, id)?;
        self.transition(Method::GET, &uri, None, uri.clone())
    }
}
