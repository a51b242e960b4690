use std::collections::{BTreeMap, BTreeSet};

use gedcomx::json::{
    fs::{ChildAndParentsRelationship, FamilySearchPlatform, ParentRole},
    v1::{Collection, Fact, Link, Links, Person, Relationship, RelationshipType, ResourceReference},
};
use http::StatusCode;
use url::Url;

use super::reply::Reply;
use crate::{
    collection::{CHILD_AND_PARENTS_RELATIONSHIPS_REL, PERSONS_REL, RELATIONSHIPS_REL, TOKEN_REL},
    config::Credentials,
    state::CONCLUSION_REL,
};

pub(crate) const TOKEN_PATH: &str = "/cis-web/oauth2/v3/token";
pub(crate) const COLLECTION_PATH: &str = "/platform/collections/tree";
pub(crate) const PERSONS_PATH: &str = "/platform/tree/persons";
pub(crate) const RELATIONSHIPS_PATH: &str = "/platform/tree/relationships";
pub(crate) const FAMILIES_PATH: &str = "/platform/tree/child-and-parents-relationships";

struct Record<T> {
    value: T,
    deleted: bool,
}

impl<T> Record<T> {
    fn new(value: T) -> Self {
        Self { value, deleted: false }
    }
}

type Records<T> = BTreeMap<String, Record<T>>;

#[derive(Default)]
struct Ids {
    next: u64,
}

impl Ids {
    fn next(&mut self, prefix: &str) -> String {
        self.next += 1;
        format!("{prefix}{:04}", self.next)
    }
}

/// The in-memory contents of the tree.
pub(crate) struct Tree {
    base: Url,
    credentials: Credentials,
    tokens: BTreeSet<String>,
    ids: Ids,
    persons: Records<Person>,
    couples: Records<Relationship>,
    families: Records<ChildAndParentsRelationship>,
}

fn gone(path: &str, id: &str) -> Reply {
    Reply::Gone { restore: format!("{path}/{id}/restore") }
}

/// Finds a live record, or the reply explaining why there is none.
fn live<'r, T>(records: &'r mut Records<T>, id: &str, path: &str) -> Result<&'r mut T, Reply> {
    match records.get_mut(id) {
        None => Err(Reply::NotFound),
        Some(record) if record.deleted => Err(gone(path, id)),
        Some(record) => Ok(&mut record.value),
    }
}

fn soft_delete<T>(records: &mut Records<T>, id: &str, path: &str) -> Reply {
    match records.get_mut(id) {
        None => Reply::NotFound,
        Some(record) if record.deleted => gone(path, id),
        Some(record) => {
            record.deleted = true;
            Reply::NoContent
        }
    }
}

/// Restoring a resource that is not deleted is accepted.
fn restore<T>(records: &mut Records<T>, id: &str) -> Reply {
    match records.get_mut(id) {
        None => Reply::NotFound,
        Some(record) => {
            record.deleted = false;
            Reply::NoContent
        }
    }
}

/// Fails if any incoming fact names an ID that is not among `facts`.
fn check_fact_ids(facts: &[Fact], incoming: &[Fact]) -> Result<(), Reply> {
    let unknown = incoming
        .iter()
        .filter_map(|fact| fact.id.as_deref())
        .find(|id| !facts.iter().any(|f| f.id.as_deref() == Some(*id)));

    match unknown {
        Some(id) => Err(Reply::bad_request(format!("no fact with ID {id}"))),
        None => Ok(()),
    }
}

/// Adds facts without an ID and replaces facts that have one. Nothing is
/// changed if any ID is unknown.
fn upsert_facts(facts: &mut Vec<Fact>, incoming: Vec<Fact>, ids: &mut Ids) -> Result<(), Reply> {
    check_fact_ids(facts, &incoming)?;

    for mut fact in incoming {
        fact.links.clear();
        match fact.id.clone() {
            Some(id) => {
                if let Some(existing) = facts.iter_mut().find(|f| f.id.as_deref() == Some(id.as_str())) {
                    *existing = fact;
                }
            }
            None => {
                fact.id = Some(ids.next("C."));
                facts.push(fact);
            }
        }
    }

    Ok(())
}

fn unwrap_reply(result: Result<Reply, Reply>) -> Reply {
    result.unwrap_or_else(|reply| reply)
}

impl Tree {
    pub(crate) fn new(base: Url, credentials: Credentials) -> Self {
        Self {
            base,
            credentials,
            tokens: BTreeSet::new(),
            ids: Ids::default(),
            persons: Records::new(),
            couples: Records::new(),
            families: Records::new(),
        }
    }

    fn link(&self, path: &str) -> Link {
        let href = self
            .base
            .join(path)
            .ok()
            .and_then(|uri| uri.as_str().parse::<http::Uri>().ok());
        Link { href, template: None }
    }

    fn person_reference(&self, id: &str) -> ResourceReference {
        ResourceReference {
            resource: self.link(&format!("{PERSONS_PATH}/{id}")).href,
            resource_id: Some(id.to_string()),
        }
    }

    pub(crate) fn is_authorized(&self, headers: &http::HeaderMap) -> bool {
        headers
            .get(http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| self.tokens.contains(token))
    }

    pub(crate) fn token(&mut self, body: &[u8]) -> Reply {
        let form: BTreeMap<_, _> = url::form_urlencoded::parse(body).into_owned().collect();
        let field = |name: &str| form.get(name).map(String::as_str);

        let valid = field("grant_type") == Some("password")
            && field("username") == Some(self.credentials.username.as_str())
            && field("password") == Some(self.credentials.password.as_str())
            && field("client_id") == Some(self.credentials.client_id.as_str());

        if !valid {
            return Reply::Json(
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": "invalid_grant" }),
            );
        }

        let token = self.ids.next("fake-token-");
        self.tokens.insert(token.clone());
        Reply::Json(
            StatusCode::OK,
            serde_json::json!({ "access_token": token, "token_type": "bearer" }),
        )
    }

    pub(crate) fn collection(&self) -> Reply {
        let links = Links::from([
            (PERSONS_REL.to_string(), self.link(PERSONS_PATH)),
            (RELATIONSHIPS_REL.to_string(), self.link(RELATIONSHIPS_PATH)),
            (CHILD_AND_PARENTS_RELATIONSHIPS_REL.to_string(), self.link(FAMILIES_PATH)),
            (TOKEN_REL.to_string(), self.link(TOKEN_PATH)),
            ("self".to_string(), self.link(COLLECTION_PATH)),
        ]);

        Reply::Ok(FamilySearchPlatform::from(Collection {
            id: Some("FSFT".to_string()),
            title: Some("Family Tree".to_string()),
            links,
        }))
    }

    /// Checks that a reference names a live person, and returns it in
    /// canonical form.
    fn resolve_person(&self, reference: &ResourceReference) -> Result<ResourceReference, Reply> {
        let id = reference.resource_id.clone().or_else(|| {
            let resource = reference.resource.as_ref()?;
            resource.path().rsplit('/').find(|s| !s.is_empty()).map(str::to_string)
        });

        let Some(id) = id else {
            return Err(Reply::bad_request("person reference has no ID"));
        };

        match self.persons.get(&id) {
            Some(record) if !record.deleted => Ok(self.person_reference(&id)),
            _ => Err(Reply::bad_request(format!("no person with ID {id}"))),
        }
    }

    fn resolve_optional(
        &self,
        reference: Option<&ResourceReference>,
    ) -> Result<Option<ResourceReference>, Reply> {
        reference.map(|r| self.resolve_person(r)).transpose()
    }

    // persons

    pub(crate) fn create_person(&mut self, doc: FamilySearchPlatform) -> Reply {
        let Some(mut person) = doc.persons.into_iter().next() else {
            return Reply::bad_request("no person in request");
        };

        if person.gender.is_none() || person.names.is_empty() {
            return Reply::bad_request("a person requires a gender and a name");
        }

        let id = self.ids.next("P-");
        person.id = Some(id.clone());
        person.links.clear();
        self.persons.insert(id.clone(), Record::new(person));

        Reply::Created { path: format!("{PERSONS_PATH}/{id}"), id }
    }

    pub(crate) fn read_person(&mut self, id: &str) -> Reply {
        let person = match live(&mut self.persons, id, PERSONS_PATH) {
            Ok(person) => person.clone(),
            Err(reply) => return reply,
        };

        let path = format!("{PERSONS_PATH}/{id}");
        let links = Links::from([
            ("self".to_string(), self.link(&path)),
            ("person".to_string(), self.link(&path)),
        ]);

        Reply::Ok(FamilySearchPlatform::from(Person { links, ..person }))
    }

    pub(crate) fn delete_person(&mut self, id: &str) -> Reply {
        soft_delete(&mut self.persons, id, PERSONS_PATH)
    }

    pub(crate) fn restore_person(&mut self, id: &str) -> Reply {
        restore(&mut self.persons, id)
    }

    // couple relationships

    pub(crate) fn create_couple(&mut self, doc: FamilySearchPlatform) -> Reply {
        unwrap_reply(self.try_create_couple(doc))
    }

    fn try_create_couple(&mut self, doc: FamilySearchPlatform) -> Result<Reply, Reply> {
        let mut relationship = doc
            .relationships
            .into_iter()
            .next()
            .ok_or_else(|| Reply::bad_request("no relationship in request"))?;

        if relationship.kind != RelationshipType::Couple {
            return Err(Reply::bad_request("only couple relationships can be created"));
        }

        let (Some(person1), Some(person2)) = (&relationship.person1, &relationship.person2) else {
            return Err(Reply::bad_request("a couple relationship requires two persons"));
        };

        let person1 = self.resolve_person(person1)?;
        let person2 = self.resolve_person(person2)?;

        let id = self.ids.next("R-");
        let facts = std::mem::take(&mut relationship.facts);
        let mut stored = Relationship {
            id: Some(id.clone()),
            person1: Some(person1),
            person2: Some(person2),
            links: Links::new(),
            ..relationship
        };
        upsert_facts(&mut stored.facts, facts, &mut self.ids)?;

        self.couples.insert(id.clone(), Record::new(stored));
        Ok(Reply::Created { path: format!("{RELATIONSHIPS_PATH}/{id}"), id })
    }

    pub(crate) fn read_couple(&mut self, id: &str) -> Reply {
        let relationship = match live(&mut self.couples, id, RELATIONSHIPS_PATH) {
            Ok(relationship) => relationship.clone(),
            Err(reply) => return reply,
        };

        let path = format!("{RELATIONSHIPS_PATH}/{id}");
        let facts = self.link_facts(&path, relationship.facts);
        let links = Links::from([
            ("self".to_string(), self.link(&path)),
            ("relationship".to_string(), self.link(&path)),
        ]);

        Reply::Ok(FamilySearchPlatform::from(Relationship { facts, links, ..relationship }))
    }

    pub(crate) fn update_couple(&mut self, id: &str, doc: FamilySearchPlatform) -> Reply {
        let Some(update) = doc.relationships.into_iter().next() else {
            return Reply::bad_request("no relationship in request");
        };

        let relationship = match live(&mut self.couples, id, RELATIONSHIPS_PATH) {
            Ok(relationship) => relationship,
            Err(reply) => return reply,
        };

        match upsert_facts(&mut relationship.facts, update.facts, &mut self.ids) {
            Ok(()) => Reply::NoContent,
            Err(reply) => reply,
        }
    }

    pub(crate) fn delete_couple(&mut self, id: &str) -> Reply {
        soft_delete(&mut self.couples, id, RELATIONSHIPS_PATH)
    }

    pub(crate) fn restore_couple(&mut self, id: &str) -> Reply {
        restore(&mut self.couples, id)
    }

    pub(crate) fn delete_couple_fact(&mut self, id: &str, fact_id: &str) -> Reply {
        match live(&mut self.couples, id, RELATIONSHIPS_PATH) {
            Ok(relationship) => remove_fact(&mut relationship.facts, fact_id),
            Err(reply) => reply,
        }
    }

    // child-and-parents relationships

    pub(crate) fn create_family(&mut self, doc: FamilySearchPlatform) -> Reply {
        unwrap_reply(self.try_create_family(doc))
    }

    fn try_create_family(&mut self, doc: FamilySearchPlatform) -> Result<Reply, Reply> {
        let relationship = doc
            .child_and_parents_relationships
            .into_iter()
            .next()
            .ok_or_else(|| Reply::bad_request("no child-and-parents relationship in request"))?;

        let Some(child) = &relationship.child else {
            return Err(Reply::bad_request("a child-and-parents relationship requires a child"));
        };

        if relationship.father.is_none() && relationship.mother.is_none() {
            return Err(Reply::bad_request(
                "a child-and-parents relationship requires at least one parent",
            ));
        }

        let child = self.resolve_person(child)?;
        let father = self.resolve_optional(relationship.father.as_ref())?;
        let mother = self.resolve_optional(relationship.mother.as_ref())?;

        let id = self.ids.next("CAPR-");
        let mut stored = ChildAndParentsRelationship {
            id: Some(id.clone()),
            father,
            mother,
            child: Some(child),
            ..ChildAndParentsRelationship::default()
        };
        upsert_facts(&mut stored.father_facts, relationship.father_facts, &mut self.ids)?;
        upsert_facts(&mut stored.mother_facts, relationship.mother_facts, &mut self.ids)?;

        self.families.insert(id.clone(), Record::new(stored));
        Ok(Reply::Created { path: format!("{FAMILIES_PATH}/{id}"), id })
    }

    pub(crate) fn read_family(&mut self, id: &str) -> Reply {
        let relationship = match live(&mut self.families, id, FAMILIES_PATH) {
            Ok(relationship) => relationship.clone(),
            Err(reply) => return reply,
        };

        let path = format!("{FAMILIES_PATH}/{id}");
        let mut links = Links::from([
            ("self".to_string(), self.link(&path)),
            ("relationship".to_string(), self.link(&path)),
        ]);

        for role in [ParentRole::Father, ParentRole::Mother] {
            if relationship.parent(role).is_some() {
                links.insert(role.link_rel().to_string(), self.link(&role_path(&path, role)));
            }
        }

        let father_facts = self.link_facts(&path, relationship.father_facts);
        let mother_facts = self.link_facts(&path, relationship.mother_facts);

        Reply::Ok(FamilySearchPlatform::from(ChildAndParentsRelationship {
            father_facts,
            mother_facts,
            links,
            ..relationship
        }))
    }

    pub(crate) fn update_family(&mut self, id: &str, doc: FamilySearchPlatform) -> Reply {
        unwrap_reply(self.try_update_family(id, doc))
    }

    fn try_update_family(&mut self, id: &str, doc: FamilySearchPlatform) -> Result<Reply, Reply> {
        let update = doc
            .child_and_parents_relationships
            .into_iter()
            .next()
            .ok_or_else(|| Reply::bad_request("no child-and-parents relationship in request"))?;

        let father = self.resolve_optional(update.father.as_ref())?;
        let mother = self.resolve_optional(update.mother.as_ref())?;

        let relationship = live(&mut self.families, id, FAMILIES_PATH)?;
        check_fact_ids(&relationship.father_facts, &update.father_facts)?;
        check_fact_ids(&relationship.mother_facts, &update.mother_facts)?;

        if father.is_some() {
            relationship.father = father;
        }

        if mother.is_some() {
            relationship.mother = mother;
        }

        upsert_facts(&mut relationship.father_facts, update.father_facts, &mut self.ids)?;
        upsert_facts(&mut relationship.mother_facts, update.mother_facts, &mut self.ids)?;
        Ok(Reply::NoContent)
    }

    /// Removes a parent, along with the facts about that parent's role.
    /// The last remaining parent cannot be removed.
    pub(crate) fn delete_parent(&mut self, id: &str, role: ParentRole) -> Reply {
        let relationship = match live(&mut self.families, id, FAMILIES_PATH) {
            Ok(relationship) => relationship,
            Err(reply) => return reply,
        };

        if relationship.parent(role).is_none() {
            return Reply::NotFound;
        }

        let other = match role {
            ParentRole::Father => ParentRole::Mother,
            ParentRole::Mother => ParentRole::Father,
        };

        if relationship.parent(other).is_none() {
            return Reply::bad_request("a child-and-parents relationship requires at least one parent");
        }

        *relationship.parent_mut(role) = None;
        relationship.facts_mut(role).clear();
        Reply::NoContent
    }

    pub(crate) fn delete_family(&mut self, id: &str) -> Reply {
        soft_delete(&mut self.families, id, FAMILIES_PATH)
    }

    pub(crate) fn restore_family(&mut self, id: &str) -> Reply {
        restore(&mut self.families, id)
    }

    pub(crate) fn delete_family_fact(&mut self, id: &str, fact_id: &str) -> Reply {
        let relationship = match live(&mut self.families, id, FAMILIES_PATH) {
            Ok(relationship) => relationship,
            Err(reply) => return reply,
        };

        match remove_fact(&mut relationship.father_facts, fact_id) {
            Reply::NotFound => remove_fact(&mut relationship.mother_facts, fact_id),
            reply => reply,
        }
    }

    /// Gives each fact a `conclusion` link under the given resource.
    fn link_facts(&self, path: &str, facts: Vec<Fact>) -> Vec<Fact> {
        facts
            .into_iter()
            .map(|mut fact| {
                if let Some(id) = &fact.id {
                    let link = self.link(&format!("{path}/conclusions/{id}"));
                    fact.links.insert(CONCLUSION_REL.to_string(), link);
                }
                fact
            })
            .collect()
    }
}

fn role_path(path: &str, role: ParentRole) -> String {
    match role {
        ParentRole::Father => format!("{path}/father"),
        ParentRole::Mother => format!("{path}/mother"),
    }
}

fn remove_fact(facts: &mut Vec<Fact>, fact_id: &str) -> Reply {
    match facts.iter().position(|f| f.id.as_deref() == Some(fact_id)) {
        Some(ix) => {
            facts.remove(ix);
            Reply::NoContent
        }
        None => Reply::NotFound,
    }
}
