//! FamilySearch Family Tree extensions to GEDCOM X.

use serde::{Deserialize, Serialize};

use super::{
    null_as_default,
    v1::{Collection, Fact, Links, Person, Relationship, ResourceReference},
};

/// The relationship between a child and up to two parents.
///
/// A fact list that is missing, `null`, or `[]` on the wire is always
/// decoded as an empty `Vec`, and an empty list is never serialized.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChildAndParentsRelationship {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father: Option<ResourceReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mother: Option<ResourceReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child: Option<ResourceReference>,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub father_facts: Vec<Fact>,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub mother_facts: Vec<Fact>,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Links::is_empty")]
    pub links: Links,
}

/// Which parent role a fact or reference belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParentRole {
    Father,
    Mother,
}

impl ParentRole {
    /// The link relation used to address this role on a relationship.
    pub fn link_rel(self) -> &'static str {
        match self {
            ParentRole::Father => "father-role",
            ParentRole::Mother => "mother-role",
        }
    }
}

impl ChildAndParentsRelationship {
    pub fn new(
        child: ResourceReference,
        father: Option<ResourceReference>,
        mother: Option<ResourceReference>,
    ) -> Self {
        Self { child: Some(child), father, mother, ..Self::default() }
    }

    pub fn parent(&self, role: ParentRole) -> Option<&ResourceReference> {
        match role {
            ParentRole::Father => self.father.as_ref(),
            ParentRole::Mother => self.mother.as_ref(),
        }
    }

    pub fn parent_mut(&mut self, role: ParentRole) -> &mut Option<ResourceReference> {
        match role {
            ParentRole::Father => &mut self.father,
            ParentRole::Mother => &mut self.mother,
        }
    }

    pub fn facts(&self, role: ParentRole) -> &[Fact] {
        match role {
            ParentRole::Father => &self.father_facts,
            ParentRole::Mother => &self.mother_facts,
        }
    }

    pub fn facts_mut(&mut self, role: ParentRole) -> &mut Vec<Fact> {
        match role {
            ParentRole::Father => &mut self.father_facts,
            ParentRole::Mother => &mut self.mother_facts,
        }
    }
}

/// The document envelope used for every FamilySearch request and response body.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FamilySearchPlatform {
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub persons: Vec<Person>,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<Relationship>,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub child_and_parents_relationships: Vec<ChildAndParentsRelationship>,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub collections: Vec<Collection>,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Links::is_empty")]
    pub links: Links,
}

impl FamilySearchPlatform {
    pub fn person(&self) -> Option<&Person> {
        self.persons.first()
    }

    pub fn relationship(&self) -> Option<&Relationship> {
        self.relationships.first()
    }

    pub fn child_and_parents_relationship(&self) -> Option<&ChildAndParentsRelationship> {
        self.child_and_parents_relationships.first()
    }

    pub fn collection(&self) -> Option<&Collection> {
        self.collections.first()
    }
}

impl From<Person> for FamilySearchPlatform {
    fn from(person: Person) -> Self {
        Self { persons: vec![person], ..Self::default() }
    }
}

impl From<Relationship> for FamilySearchPlatform {
    fn from(relationship: Relationship) -> Self {
        Self { relationships: vec![relationship], ..Self::default() }
    }
}

impl From<ChildAndParentsRelationship> for FamilySearchPlatform {
    fn from(relationship: ChildAndParentsRelationship) -> Self {
        Self { child_and_parents_relationships: vec![relationship], ..Self::default() }
    }
}

impl From<Collection> for FamilySearchPlatform {
    fn from(collection: Collection) -> Self {
        Self { collections: vec![collection], ..Self::default() }
    }
}

#[cfg(test)]
mod test {
    use miette::IntoDiagnostic;

    use super::*;
    use crate::json::v1::{DateInfo, FactType};

    #[test]
    fn serializes_child_and_parents_document() -> miette::Result<()> {
        let father = ResourceReference::new(
            "https://example.org/platform/tree/persons/F-1".parse().into_diagnostic()?,
            "F-1",
        );
        let child = ResourceReference::new(
            "https://example.org/platform/tree/persons/C-1".parse().into_diagnostic()?,
            "C-1",
        );

        let mut relationship = ChildAndParentsRelationship::new(child, Some(father), None);
        let mut fact = Fact::new(FactType::AdoptiveParent);
        fact.date = Some(DateInfo::original("January 1, 1901"));
        relationship.father_facts.push(fact);

        let doc = FamilySearchPlatform::from(relationship);
        insta::assert_snapshot!(serde_json::to_string_pretty(&doc).into_diagnostic()?, @r#"
        {
          "childAndParentsRelationships": [
            {
              "father": {
                "resource": "https://example.org/platform/tree/persons/F-1",
                "resourceId": "F-1"
              },
              "child": {
                "resource": "https://example.org/platform/tree/persons/C-1",
                "resourceId": "C-1"
              },
              "fatherFacts": [
                {
                  "type": "http://gedcomx.org/AdoptiveParent",
                  "date": {
                    "original": "January 1, 1901"
                  }
                }
              ]
            }
          ]
        }
        "#);
        Ok(())
    }

    #[test]
    fn missing_and_null_facts_are_empty() -> miette::Result<()> {
        let doc: FamilySearchPlatform = serde_json::from_str(
            r#"{
                "childAndParentsRelationships": [
                    {
                        "id": "R-1",
                        "father": null,
                        "child": { "resourceId": "C-1" },
                        "fatherFacts": null
                    }
                ]
            }"#,
        )
        .into_diagnostic()?;

        let rel = doc.child_and_parents_relationship().unwrap();
        assert_eq!(rel.id.as_deref(), Some("R-1"));
        assert_eq!(rel.parent(ParentRole::Father), None);
        assert_eq!(rel.mother, None);
        assert_eq!(rel.child.as_ref().and_then(|c| c.resource_id.as_deref()), Some("C-1"));
        assert!(rel.facts(ParentRole::Father).is_empty());
        assert!(rel.facts(ParentRole::Mother).is_empty());
        assert!(doc.persons.is_empty());
        Ok(())
    }

    #[test]
    fn empty_document_serializes_to_empty_object() -> miette::Result<()> {
        let json = serde_json::to_string(&FamilySearchPlatform::default()).into_diagnostic()?;
        assert_eq!(json, "{}");
        Ok(())
    }
}
