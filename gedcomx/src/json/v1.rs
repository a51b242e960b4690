use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::null_as_default;

/// Hypermedia links, keyed by relation name.
pub type Links = BTreeMap<String, Link>;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Link {
    #[serde(
        default,
        with = "http_serde::option::uri",
        skip_serializing_if = "Option::is_none"
    )]
    pub href: Option<http::Uri>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

impl Link {
    pub fn to(href: http::Uri) -> Self {
        Self { href: Some(href), template: None }
    }
}

/// A pointer to another resource. It identifies but does not own the
/// referenced entity.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceReference {
    #[serde(
        default,
        with = "http_serde::option::uri",
        skip_serializing_if = "Option::is_none"
    )]
    pub resource: Option<http::Uri>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
}

impl ResourceReference {
    pub fn new(resource: http::Uri, resource_id: impl Into<String>) -> Self {
        Self {
            resource: Some(resource),
            resource_id: Some(resource_id.into()),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind}: `{value}`")]
pub struct UnknownTermError {
    kind: &'static str,
    value: String,
}

/// Declares an enum of GEDCOM X controlled-vocabulary terms, which are
/// serialized as their URI.
macro_rules! uri_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $($variant:ident => $uri:literal),+ $(,)?
        }
        $(other => $other:ident)?
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            $(
                /// A term not known to this library, kept verbatim.
                $other(String),
            )?
        }

        impl $name {
            pub fn as_uri(&self) -> &str {
                match self {
                    $(Self::$variant => $uri,)+
                    $(Self::$other(uri) => uri.as_str(),)?
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownTermError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($uri => Ok(Self::$variant),)+
                    $(other => Ok(Self::$other(other.to_string())),)?
                    #[allow(unreachable_patterns)]
                    _ => Err(UnknownTermError { kind: $kind, value: value.to_string() }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_uri())
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(self.as_uri())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                struct V;
                impl<'de> serde::de::Visitor<'de> for V {
                    type Value = $name;

                    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                        write!(formatter, "a GEDCOM X {} URI", $kind)
                    }

                    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
                    where
                        E: serde::de::Error,
                    {
                        value.parse().map_err(E::custom)
                    }
                }

                deserializer.deserialize_str(V)
            }
        }
    };
}

uri_enum! {
    GenderType ("gender type") {
        Male => "http://gedcomx.org/Male",
        Female => "http://gedcomx.org/Female",
        Unknown => "http://gedcomx.org/Unknown",
    }
}

uri_enum! {
    RelationshipType ("relationship type") {
        Couple => "http://gedcomx.org/Couple",
        ParentChild => "http://gedcomx.org/ParentChild",
    }
}

uri_enum! {
    FactType ("fact type") {
        AdoptiveParent => "http://gedcomx.org/AdoptiveParent",
        BiologicalParent => "http://gedcomx.org/BiologicalParent",
        FosterParent => "http://gedcomx.org/FosterParent",
        GuardianParent => "http://gedcomx.org/GuardianParent",
        StepParent => "http://gedcomx.org/StepParent",
        Marriage => "http://gedcomx.org/Marriage",
        Divorce => "http://gedcomx.org/Divorce",
        Birth => "http://gedcomx.org/Birth",
        Death => "http://gedcomx.org/Death",
    }
    other => Other
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Gender {
    #[serde(rename = "type")]
    pub kind: GenderType,
}

/// A date as entered by the user; `formal` is kept as an unparsed
/// GEDCOM X formal date string.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct DateInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formal: Option<String>,
}

impl DateInfo {
    pub fn original(original: impl Into<String>) -> Self {
        Self { original: Some(original.into()), formal: None }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Fact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type")]
    pub kind: FactType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Links::is_empty")]
    pub links: Links,
}

impl Fact {
    pub fn new(kind: FactType) -> Self {
        Self { id: None, kind, date: None, value: None, links: Links::new() }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NameForm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Name {
    #[serde(
        rename = "type",
        default,
        with = "http_serde::option::uri",
        skip_serializing_if = "Option::is_none"
    )]
    pub type_uri: Option<http::Uri>,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub name_forms: Vec<NameForm>,
}

impl Name {
    pub fn full_text(&self) -> Option<&str> {
        self.name_forms.iter().find_map(|f| f.full_text.as_deref())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Person {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub living: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<Name>,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub facts: Vec<Fact>,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Links::is_empty")]
    pub links: Links,
}

/// A couple (or parent-child) relationship between two persons.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Relationship {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type")]
    pub kind: RelationshipType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person1: Option<ResourceReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person2: Option<ResourceReference>,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub facts: Vec<Fact>,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Links::is_empty")]
    pub links: Links,
}

impl Relationship {
    pub fn couple(person1: ResourceReference, person2: ResourceReference) -> Self {
        Self {
            id: None,
            kind: RelationshipType::Couple,
            person1: Some(person1),
            person2: Some(person2),
            facts: Vec::new(),
            links: Links::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Collection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Links::is_empty")]
    pub links: Links,
}

#[cfg(test)]
mod test {
    use miette::IntoDiagnostic;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("http://gedcomx.org/AdoptiveParent", FactType::AdoptiveParent)]
    #[case("http://gedcomx.org/Marriage", FactType::Marriage)]
    #[case(
        "data:,Custom%20Fact",
        FactType::Other("data:,Custom%20Fact".to_string())
    )]
    fn fact_type_uris(#[case] uri: &str, #[case] expected: FactType) -> miette::Result<()> {
        let parsed: FactType = serde_json::from_value(serde_json::json!(uri)).into_diagnostic()?;
        assert_eq!(parsed, expected);
        assert_eq!(parsed.as_uri(), uri);
        Ok(())
    }

    #[test]
    fn unknown_gender_is_rejected() {
        let result = serde_json::from_str::<Gender>(r#"{"type": "http://example.com/Other"}"#);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown gender type"), "{err}");
    }

    #[test]
    fn fact_with_date_round_trips() -> miette::Result<()> {
        let mut fact = Fact::new(FactType::AdoptiveParent);
        fact.date = Some(DateInfo::original("January 1, 1901"));

        insta::assert_snapshot!(serde_json::to_string_pretty(&fact).into_diagnostic()?, @r#"
        {
          "type": "http://gedcomx.org/AdoptiveParent",
          "date": {
            "original": "January 1, 1901"
          }
        }
        "#);

        let json = serde_json::to_string(&fact).into_diagnostic()?;
        let back: Fact = serde_json::from_str(&json).into_diagnostic()?;
        assert_eq!(back, fact);
        Ok(())
    }

    #[test]
    fn person_with_null_lists() -> miette::Result<()> {
        let person: Person = serde_json::from_str(
            r#"{
                "id": "KWQS-BBQ",
                "gender": { "type": "http://gedcomx.org/Female" },
                "names": null,
                "facts": null,
                "links": { "person": { "href": "https://example.org/platform/tree/persons/KWQS-BBQ" } }
            }"#,
        )
        .into_diagnostic()?;

        assert_eq!(person.id.as_deref(), Some("KWQS-BBQ"));
        assert_eq!(person.gender.map(|g| g.kind), Some(GenderType::Female));
        assert!(person.names.is_empty());
        assert!(person.facts.is_empty());
        assert_eq!(
            person.links["person"].href.as_ref().map(|h| h.path()),
            Some("/platform/tree/persons/KWQS-BBQ")
        );
        Ok(())
    }
}
