//! Document models
//!
//! Registry records are schemaless JSON; these types pull out the few
//! fields FilingForge relies on and carry the rest through untouched.

mod company;
mod document;
mod filings;
mod identifier;

pub use company::{CompanyProfile, CompanySubmission, FILINGS_FIELD};

pub use document::{to_document, Document, DocumentId, StoredDocument, ID_FIELD};

pub use filings::{FilingHistory, PendingFilings, COMPANY_ID_FIELD, FILING_DATES_PATH};

pub use identifier::{Cik, CIK_WIDTH};
