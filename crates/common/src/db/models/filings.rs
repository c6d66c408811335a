//! Filing history split from a submissions document

use super::document::{to_document, Document, DocumentId};
use crate::errors::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reference from a filing history to its owning company profile
pub const COMPANY_ID_FIELD: &str = "companyId";

/// Path to the filing-date sequence inside a filing history
pub const FILING_DATES_PATH: &str = "recent.filingDate";

/// Filing history that has not been linked to a persisted profile yet.
///
/// It cannot be written to the store until [`PendingFilings::attach`] has
/// produced a [`FilingHistory`].
#[derive(Debug, Clone, PartialEq)]
pub struct PendingFilings(Map<String, Value>);

impl PendingFilings {
    pub fn new(mut body: Map<String, Value>) -> Self {
        body.remove(COMPANY_ID_FIELD);
        Self(body)
    }

    pub fn body(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Link to the generated key of the profile this history was split from.
    pub fn attach(self, company_id: DocumentId) -> FilingHistory {
        FilingHistory {
            company_id,
            body: self.0,
        }
    }
}

/// Filing history ready to persist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilingHistory {
    #[serde(rename = "companyId")]
    pub company_id: DocumentId,

    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl FilingHistory {
    pub fn into_document(self) -> Result<Document> {
        to_document(&self)
    }
}
