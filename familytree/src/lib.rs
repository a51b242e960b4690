//! A client for the FamilySearch Family Tree API.
//!
//! Every operation performs one request and returns a new [`State`]: an
//! immutable snapshot of the response status, the decoded entity (if any),
//! and the links available from it. Non-success statuses are not errors;
//! they are reported in the returned state so that callers can inspect them.
//!
//! ```no_run
//! use familytree::{builders::PersonBuilder, CollectionState, Client, ClientConfig};
//!
//! # fn main() -> Result<(), familytree::ClientError> {
//! let client = Client::http(ClientConfig::from_env()?)?;
//! let collection = CollectionState::read(client)?.authenticate()?;
//!
//! let father = collection.add_person(&PersonBuilder::male().build())?;
//! let child = collection.add_person(&PersonBuilder::female().build())?;
//! let relationship = collection.add_child_and_parents_relationship(&child, Some(&father), None)?;
//!
//! let relationship = relationship.get()?.expect_status(http::StatusCode::OK)?;
//! # Ok(())
//! # }
//! ```

pub mod builders;
pub mod child_and_parents;
pub mod client;
pub mod collection;
pub mod config;
mod error;
pub mod fake;
pub mod person;
pub mod relationship;
pub mod state;
pub mod transport;

pub use child_and_parents::ChildAndParentsRelationshipState;
pub use client::Client;
pub use collection::CollectionState;
pub use config::{ClientConfig, Credentials};
pub use error::{ClientError, ResponseDetail};
pub use person::PersonState;
pub use relationship::RelationshipState;
pub use state::State;
