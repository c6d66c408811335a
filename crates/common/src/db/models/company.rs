//! Company submissions as returned by the registry, and the profile split from them

use super::document::{to_document, Document};
use super::filings::PendingFilings;
use super::identifier::Cik;
use crate::errors::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field that holds the filing history inside a submissions document
pub const FILINGS_FIELD: &str = "filings";

/// One registry submissions document.
///
/// Only `filings` is required; everything else is kept as profile data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySubmission {
    pub filings: Map<String, Value>,

    #[serde(flatten)]
    pub profile: CompanyProfile,
}

impl CompanySubmission {
    /// Separate static profile facts from the dynamic filing history.
    pub fn split(self) -> (CompanyProfile, PendingFilings) {
        (self.profile, PendingFilings::new(self.filings))
    }
}

/// Static facts about a filing entity (everything except `filings`).
///
/// Fields are kept exactly as received, whatever their JSON type; the
/// accessors read the few the reports rely on.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyProfile {
    fields: Map<String, Value>,
}

impl CompanyProfile {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn name(&self) -> Option<&str> {
        self.get("name").and_then(Value::as_str)
    }

    /// Standard Industrial Classification code, as the registry sent it
    pub fn sic(&self) -> Option<&Value> {
        self.get("sic")
    }

    pub fn sic_description(&self) -> Option<&Value> {
        self.get("sicDescription")
    }

    /// Natural identifier used to join against the accounting dataset
    pub fn cik(&self) -> Option<Cik> {
        self.get("cik").and_then(Cik::from_json)
    }

    pub fn into_document(self) -> Result<Document> {
        to_document(&self)
    }
}
