use gedcomx::json::{
    fs::FamilySearchPlatform,
    v1::{Fact, Links, Relationship, RelationshipType},
};
use http::Method;

use crate::{
    state::{Kind, State},
    ClientError,
};

pub enum CoupleKind {}

impl Kind for CoupleKind {
    const NAME: &'static str = "couple relationship";

    fn embedded_links(doc: &FamilySearchPlatform) -> Option<&Links> {
        doc.relationship().map(|r| &r.links)
    }
}

/// A couple relationship between two persons.
pub type RelationshipState = State<CoupleKind>;

impl RelationshipState {
    pub fn relationship(&self) -> Option<&Relationship> {
        self.entity().and_then(FamilySearchPlatform::relationship)
    }

    fn post_facts(&self, fact: Fact) -> Result<Self, ClientError> {
        let relationship = Relationship {
            id: self.relationship().and_then(|r| r.id.clone()),
            kind: RelationshipType::Couple,
            person1: None,
            person2: None,
            facts: vec![fact],
            links: Links::new(),
        };

        let doc = FamilySearchPlatform::from(relationship);
        self.follow(Method::POST, self.self_uri(), Some(&doc))
    }

    /// Adds a fact; it must not already have an ID.
    pub fn add_fact(&self, fact: Fact) -> Result<Self, ClientError> {
        self.post_facts(Fact { id: None, ..fact })
    }

    /// Replaces the fact with the same ID.
    pub fn update_fact(&self, fact: Fact) -> Result<Self, ClientError> {
        self.post_facts(fact)
    }

    pub fn delete_fact(&self, fact: &Fact) -> Result<Self, ClientError> {
        self.delete_conclusion(fact)
    }
}
