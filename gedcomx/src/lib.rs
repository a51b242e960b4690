//! Types for the GEDCOM X JSON serialization format, plus the FamilySearch
//! Family Tree extensions used by the `familytree` client.

pub mod json;

/// Media type of FamilySearch platform documents (GEDCOM X plus extensions).
pub const FS_JSON_MEDIA_TYPE: &str = "application/x-fs-v1+json";
