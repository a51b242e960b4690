//! Child-and-parents relationships, a FamilySearch extension that relates
//! a child to up to two parents, with facts about each parent's role.

use gedcomx::json::{
    fs::{ChildAndParentsRelationship, FamilySearchPlatform, ParentRole},
    v1::{Fact, Links},
};
use http::Method;

use crate::{
    person::PersonState,
    state::{Kind, State},
    ClientError,
};

pub enum ChildAndParentsKind {}

impl Kind for ChildAndParentsKind {
    const NAME: &'static str = "child-and-parents relationship";

    fn embedded_links(doc: &FamilySearchPlatform) -> Option<&Links> {
        doc.child_and_parents_relationship().map(|r| &r.links)
    }
}

pub type ChildAndParentsRelationshipState = State<ChildAndParentsKind>;

impl ChildAndParentsRelationshipState {
    pub fn relationship(&self) -> Option<&ChildAndParentsRelationship> {
        self.entity()
            .and_then(FamilySearchPlatform::child_and_parents_relationship)
    }

    /// POSTs a partial relationship to this resource; the server merges it.
    fn post(&self, mut update: ChildAndParentsRelationship) -> Result<Self, ClientError> {
        update.id = self.relationship().and_then(|r| r.id.clone());
        let doc = FamilySearchPlatform::from(update);
        self.follow(Method::POST, self.self_uri(), Some(&doc))
    }

    fn post_fact(&self, role: ParentRole, fact: Fact) -> Result<Self, ClientError> {
        let mut update = ChildAndParentsRelationship::default();
        update.facts_mut(role).push(fact);
        self.post(update)
    }

    pub fn add_father_fact(&self, fact: Fact) -> Result<Self, ClientError> {
        self.post_fact(ParentRole::Father, Fact { id: None, ..fact })
    }

    pub fn add_mother_fact(&self, fact: Fact) -> Result<Self, ClientError> {
        self.post_fact(ParentRole::Mother, Fact { id: None, ..fact })
    }

    /// Replaces the father fact with the same ID.
    pub fn update_father_fact(&self, fact: Fact) -> Result<Self, ClientError> {
        self.post_fact(ParentRole::Father, fact)
    }

    /// Replaces the mother fact with the same ID.
    pub fn update_mother_fact(&self, fact: Fact) -> Result<Self, ClientError> {
        self.post_fact(ParentRole::Mother, fact)
    }

    /// Deletes a father or mother fact. The fact must have been read from
    /// the server, since it is deleted through its `conclusion` link.
    pub fn delete_fact(&self, fact: &Fact) -> Result<Self, ClientError> {
        self.delete_conclusion(fact)
    }

    fn update_parent(&self, role: ParentRole, parent: &PersonState) -> Result<Self, ClientError> {
        let mut update = ChildAndParentsRelationship::default();
        *update.parent_mut(role) = Some(parent.reference()?);
        self.post(update)
    }

    pub fn update_father_with_person_state(&self, father: &PersonState) -> Result<Self, ClientError> {
        self.update_parent(ParentRole::Father, father)
    }

    pub fn update_mother_with_person_state(&self, mother: &PersonState) -> Result<Self, ClientError> {
        self.update_parent(ParentRole::Mother, mother)
    }

    /// Removes a parent from the relationship through its role link.
    pub fn delete_parent(&self, role: ParentRole) -> Result<Self, ClientError> {
        let uri = self.require_link(role.link_rel())?.clone();
        self.follow(Method::DELETE, &uri, None)
    }

    pub fn delete_father(&self) -> Result<Self, ClientError> {
        self.delete_parent(ParentRole::Father)
    }

    pub fn delete_mother(&self) -> Result<Self, ClientError> {
        self.delete_parent(ParentRole::Mother)
    }
}
