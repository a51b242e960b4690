use gedcomx::json::{
    fs::FamilySearchPlatform,
    v1::{Links, Person, ResourceReference},
};
use http::Method;

use crate::{
    state::{Kind, State},
    ClientError,
};

pub enum PersonKind {}

impl Kind for PersonKind {
    const NAME: &'static str = "person";

    fn embedded_links(doc: &FamilySearchPlatform) -> Option<&Links> {
        doc.person().map(|p| &p.links)
    }
}

pub type PersonState = State<PersonKind>;

impl PersonState {
    pub fn person(&self) -> Option<&Person> {
        self.entity().and_then(FamilySearchPlatform::person)
    }

    /// The person's ID: from the entity if it has been read, otherwise
    /// from the creation response or the last segment of the URI. A failed
    /// request has no ID.
    pub fn person_id(&self) -> Option<String> {
        if let Some(id) = self.person().and_then(|p| p.id.clone()) {
            return Some(id);
        }

        if !self.status().is_success() {
            return None;
        }

        if let Some(id) = self.entity_id() {
            return Some(id.to_string());
        }

        // a creation response without a `Location` still names the collection
        if *self.request_method() == Method::POST && !self.is_redirected() {
            return None;
        }

        self.self_uri()
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(str::to_string)
    }

    /// A reference to this person, for use in relationships.
    pub fn reference(&self) -> Result<ResourceReference, ClientError> {
        let id = self
            .person_id()
            .ok_or_else(|| ClientError::MissingEntity { uri: self.self_uri().clone() })?;

        let resource = self
            .self_uri()
            .as_str()
            .parse::<http::Uri>()
            .map_err(|source| ClientError::Reference { uri: self.self_uri().clone(), source })?;

        Ok(ResourceReference::new(resource, id))
    }
}
