#![allow(dead_code)]

use std::{cell::RefCell, sync::Once};

use familytree::{
    builders::{FactBuilder, PersonBuilder},
    fake::FakeFamilyTree,
    state::Kind,
    ChildAndParentsRelationshipState, Client, ClientConfig, ClientError, CollectionState,
    PersonState, State,
};
use gedcomx::json::v1::{DateInfo, GenderType, ResourceReference};
use http::StatusCode;

static INIT: Once = Once::new();
pub fn ensure_hook() {
    INIT.call_once(|| {
        miette::set_hook(Box::new(|_diag| {
            Box::new(
                miette::MietteHandlerOpts::new()
                    .terminal_links(false)
                    .unicode(true)
                    .color(false)
                    .width(132)
                    .build(),
            )
        }))
        .unwrap();
    });
}

type Cleanup = Box<dyn FnOnce() -> Result<(), ClientError>>;

/// An authenticated collection, plus the resources created through it.
/// Created resources are deleted when the fixture is dropped.
pub struct Fixture {
    collection: CollectionState,
    cleanup: RefCell<Vec<Cleanup>>,
}

impl Fixture {
    pub fn connect(client: Client) -> miette::Result<Self> {
        ensure_hook();
        let collection = CollectionState::read(client)?
            .expect_status(StatusCode::OK)?
            .authenticate()?
            .expect_status(StatusCode::OK)?;

        Ok(Self { collection, cleanup: RefCell::new(Vec::new()) })
    }

    /// A fixture backed by a fresh in-memory tree.
    pub fn offline() -> miette::Result<Self> {
        Self::connect(FakeFamilyTree::new().client())
    }

    /// A fixture backed by the live API, if credentials are configured.
    pub fn live() -> miette::Result<Option<Self>> {
        let config = ClientConfig::from_env()?;
        if config.get_credentials().is_none() {
            return Ok(None);
        }

        Self::connect(Client::http(config)?).map(Some)
    }

    pub fn collection(&self) -> &CollectionState {
        &self.collection
    }

    pub fn queue_for_delete<K: Kind + 'static>(&self, state: &State<K>) {
        let state = state.clone();
        self.cleanup
            .borrow_mut()
            .push(Box::new(move || state.delete().map(|_| ())));
    }

    pub fn create_person(&self, gender: GenderType) -> miette::Result<PersonState> {
        let person = self
            .collection
            .add_person(&PersonBuilder::new(gender).build())?
            .expect_status(StatusCode::CREATED)?;

        self.queue_for_delete(&person);
        Ok(person)
    }

    /// Creates a father, mother, and child, and a relationship between them.
    pub fn create_relationship(&self) -> miette::Result<ChildAndParentsRelationshipState> {
        let father = self.create_person(GenderType::Male)?;
        let mother = self.create_person(GenderType::Female)?;
        let child = self.create_person(GenderType::Male)?;

        let relationship = self
            .collection
            .add_child_and_parents_relationship(&child, Some(&father), Some(&mother))?
            .expect_status(StatusCode::CREATED)?;

        self.queue_for_delete(&relationship);
        Ok(relationship)
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        for cleanup in self.cleanup.take().into_iter().rev() {
            if let Err(err) = cleanup() {
                eprintln!("cleanup failed: {err}");
            }
        }
    }
}

fn resource_id(reference: Option<&ResourceReference>) -> Option<&str> {
    reference.and_then(|r| r.resource_id.as_deref())
}

// Scenarios shared by the offline and live suites.

pub fn create_child_and_parents_relationship(fx: &Fixture) -> miette::Result<()> {
    let relation = fx.create_relationship()?;

    let relation = relation.get()?.expect_status(StatusCode::OK)?;
    assert!(relation.entity().is_some(), "Relationship entity is null.");

    let relationship = relation.relationship().expect("Relationship object missing.");
    assert!(relationship.father.is_some(), "Father reference is missing.");
    assert!(relationship.mother.is_some(), "Mother reference is missing.");
    assert!(relationship.child.is_some(), "Child reference is missing.");
    Ok(())
}

pub fn create_child_and_parents_relationship_conclusion(fx: &Fixture) -> miette::Result<()> {
    let relation = fx.create_relationship()?;

    let fact_state = relation
        .add_father_fact(FactBuilder::adoptive_parent())?
        .expect_status(StatusCode::NO_CONTENT)?;

    let fact_state = fact_state.get()?.expect_status(StatusCode::OK)?;
    assert!(fact_state.entity().is_some(), "FactState entity is null");

    let relationship = fact_state.relationship().expect("Relationship object missing.");
    assert!(!relationship.father_facts.is_empty(), "FatherFacts missing from relationship.");
    Ok(())
}

pub fn create_couple_relationship(fx: &Fixture) -> miette::Result<()> {
    let husband = fx.create_person(GenderType::Male)?;
    let wife = fx.create_person(GenderType::Female)?;

    let relation = fx
        .collection()
        .add_spouse_relationship(&husband, &wife)?
        .expect_status(StatusCode::CREATED)?;
    fx.queue_for_delete(&relation);

    let relation = relation.get()?.expect_status(StatusCode::OK)?;
    assert!(relation.entity().is_some(), "Relationship entity is null.");

    let relationship = relation.relationship().expect("Relationship object missing.");
    assert_eq!(
        resource_id(relationship.person1.as_ref()),
        husband.person_id().as_deref()
    );
    assert_eq!(
        resource_id(relationship.person2.as_ref()),
        wife.person_id().as_deref()
    );
    Ok(())
}

pub fn read_child_and_parents_relationship(fx: &Fixture) -> miette::Result<()> {
    let relation = fx.create_relationship()?;

    let relation = relation.get()?.expect_status(StatusCode::OK)?;
    assert!(relation.entity().is_some(), "Relationship entity is null.");

    let relationship = relation.relationship().expect("Relationship object is null.");
    assert!(resource_id(relationship.father.as_ref()).is_some(), "Father object is null.");
    assert!(resource_id(relationship.mother.as_ref()).is_some(), "Mother object is null.");
    assert!(resource_id(relationship.child.as_ref()).is_some(), "Child object is null.");
    Ok(())
}

pub fn update_child_and_parents_relationship(fx: &Fixture) -> miette::Result<()> {
    let relation = fx.create_relationship()?;
    let relation = relation.get()?.expect_status(StatusCode::OK)?;

    let mother = fx.create_person(GenderType::Female)?;
    let mother = mother.get()?.expect_status(StatusCode::OK)?;

    relation
        .update_mother_with_person_state(&mother)?
        .expect_status(StatusCode::NO_CONTENT)?;

    let relation = relation.get()?.expect_status(StatusCode::OK)?;
    assert!(relation.entity().is_some(), "Relationship entity is null.");

    let relationship = relation.relationship().expect("Relationship object missing.");
    assert_eq!(
        resource_id(relationship.mother.as_ref()),
        mother.person().and_then(|p| p.id.as_deref()),
        "Mother ids do not match"
    );
    Ok(())
}

pub fn update_child_and_parents_relationship_conclusion(fx: &Fixture) -> miette::Result<()> {
    let relation = fx.create_relationship()?;

    let relation = relation
        .add_father_fact(FactBuilder::adoptive_parent())?
        .expect_status(StatusCode::NO_CONTENT)?;

    let relation = relation.get()?.expect_status(StatusCode::OK)?;
    let mut fact = relation
        .relationship()
        .and_then(|r| r.father_facts.first())
        .cloned()
        .expect("FatherFacts missing from relationship.");
    fact.date = Some(DateInfo::original("January 1, 1901"));

    let fact_state = relation
        .update_father_fact(fact)?
        .expect_status(StatusCode::NO_CONTENT)?;

    let fact_state = fact_state.get()?.expect_status(StatusCode::OK)?;
    assert!(fact_state.entity().is_some(), "FactState entity is null.");

    let facts = &fact_state.relationship().expect("Relationship object missing.").father_facts;
    assert_eq!(
        facts[0].date.as_ref().and_then(|d| d.original.as_deref()),
        Some("January 1, 1901"),
        "Updated value does not match."
    );
    Ok(())
}

pub fn delete_and_restore_child_and_parents_relationship(fx: &Fixture) -> miette::Result<()> {
    let relation = fx.create_relationship()?;

    let deleted = relation.delete()?.expect_status(StatusCode::NO_CONTENT)?;
    let missing = deleted.get()?.expect_status(StatusCode::GONE)?;
    assert!(missing.entity().is_none(), "Gone relationship has an entity.");

    missing.restore()?.expect_status(StatusCode::NO_CONTENT)?;
    Ok(())
}

pub fn delete_child_and_parents_relationship_conclusion(fx: &Fixture) -> miette::Result<()> {
    let relation = fx.create_relationship()?;

    let relation = relation
        .add_father_fact(FactBuilder::adoptive_parent())?
        .expect_status(StatusCode::NO_CONTENT)?;

    let relation = relation.get()?.expect_status(StatusCode::OK)?;
    assert!(relation.entity().is_some(), "Relationship entity is null.");

    let facts = &relation.relationship().expect("Relationship object missing.").father_facts;
    assert!(!facts.is_empty(), "FatherFacts are empty.");

    relation
        .delete_fact(&facts[0])?
        .expect_status(StatusCode::NO_CONTENT)?;

    let fact_state = relation.get()?.expect_status(StatusCode::OK)?;
    assert!(fact_state.entity().is_some(), "Relationship entity is null.");

    let relationship = fact_state.relationship().expect("Relationship object missing.");
    assert!(relationship.father_facts.is_empty(), "FatherFacts are not empty.");
    Ok(())
}

pub fn delete_parent_from_relationship(fx: &Fixture) -> miette::Result<()> {
    let relation = fx.create_relationship()?;
    let relation = relation.get()?.expect_status(StatusCode::OK)?;

    relation.delete_father()?.expect_status(StatusCode::NO_CONTENT)?;

    let relation = relation.get()?.expect_status(StatusCode::OK)?;
    assert!(relation.entity().is_some(), "Relationship entity is null.");

    let relationship = relation.relationship().expect("Relationship object missing.");
    assert!(relationship.father.is_none(), "Father should have been deleted");
    Ok(())
}
