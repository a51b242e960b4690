//! Builders for minimal valid entities.

use gedcomx::json::v1::{DateInfo, Fact, FactType, Gender, GenderType, Name, NameForm, Person};

pub struct PersonBuilder {
    gender: GenderType,
    name: String,
    living: bool,
}

impl PersonBuilder {
    pub fn new(gender: GenderType) -> Self {
        let name = match gender {
            GenderType::Male => "John Smith",
            GenderType::Female => "Jane Smith",
            GenderType::Unknown => "Alex Smith",
        };

        Self { gender, name: name.to_string(), living: false }
    }

    pub fn male() -> Self {
        Self::new(GenderType::Male)
    }

    pub fn female() -> Self {
        Self::new(GenderType::Female)
    }

    pub fn name(self, full_text: impl Into<String>) -> Self {
        Self { name: full_text.into(), ..self }
    }

    pub fn living(self, living: bool) -> Self {
        Self { living, ..self }
    }

    pub fn build(self) -> Person {
        Person {
            living: Some(self.living),
            gender: Some(Gender { kind: self.gender }),
            names: vec![Name {
                type_uri: Some(http::Uri::from_static("http://gedcomx.org/BirthName")),
                name_forms: vec![NameForm { full_text: Some(self.name) }],
            }],
            ..Person::default()
        }
    }
}

pub struct FactBuilder {
    fact: Fact,
}

impl FactBuilder {
    pub fn new(kind: FactType) -> Self {
        Self { fact: Fact::new(kind) }
    }

    /// An undated adoptive-parent fact, as attached to a parent role.
    pub fn adoptive_parent() -> Fact {
        Self::new(FactType::AdoptiveParent).build()
    }

    pub fn date(mut self, original: impl Into<String>) -> Self {
        self.fact.date = Some(DateInfo::original(original));
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.fact.value = Some(value.into());
        self
    }

    pub fn build(self) -> Fact {
        self.fact
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn built_person_has_gender_and_name() {
        let person = PersonBuilder::female().name("Mary Jones").build();
        assert_eq!(person.gender.map(|g| g.kind), Some(GenderType::Female));
        assert_eq!(person.names.len(), 1);
        assert_eq!(person.names[0].full_text(), Some("Mary Jones"));
        assert_eq!(person.id, None);
    }

    #[test]
    fn adoptive_parent_fact_is_undated() {
        let fact = FactBuilder::adoptive_parent();
        assert_eq!(fact.kind, FactType::AdoptiveParent);
        assert_eq!(fact.date, None);
        assert_eq!(fact.id, None);
    }

    #[test]
    fn living_person() {
        assert_eq!(PersonBuilder::male().build().living, Some(false));

        let person = PersonBuilder::male().living(true).build();
        assert_eq!(person.living, Some(true));
    }

    #[test]
    fn fact_with_date_and_value() {
        let fact = FactBuilder::new(FactType::Marriage)
            .date("June 3, 1920")
            .value("St. Mary's")
            .build();

        assert_eq!(fact.date, Some(DateInfo::original("June 3, 1920")));
        assert_eq!(fact.value.as_deref(), Some("St. Mary's"));
    }
}
