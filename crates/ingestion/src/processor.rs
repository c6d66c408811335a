//! Ingestion processor
//!
//! Core logic for one identifier: fetch the submissions document, split it
//! into profile and filing history, and persist both with the history
//! pointing at the profile's generated key. The driver walks identifiers
//! strictly in order and stops at the first fatal outcome.

use crate::errors::IngestionError;
use filingforge_common::db::models::{Cik, DocumentId};
use filingforge_common::db::{Collection, DocumentStore, StoreSession};
use filingforge_common::metrics;
use filingforge_common::AppError;
use filingforge_common::registry::{Fetched, RecordFetcher};
use futures::stream::{self, Stream, StreamExt};
use std::time::Instant;
use tracing::{error, info, instrument};

/// Terminal state of one identifier
#[derive(Debug)]
pub enum Outcome {
    /// The registry has no record; the run continues
    Skipped { cik: Cik },
    /// Profile and filing history were both written
    Persisted {
        cik: Cik,
        company_id: DocumentId,
        filings_id: DocumentId,
    },
    /// Fatal; the run stops here
    Aborted { cik: Cik, error: IngestionError },
}

impl Outcome {
    fn label(&self) -> &'static str {
        match self {
            Outcome::Skipped { .. } => "skipped",
            Outcome::Persisted { .. } => "persisted",
            Outcome::Aborted { .. } => "aborted",
        }
    }
}

/// Counts for a completed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestionSummary {
    pub persisted: usize,
    pub skipped: usize,
}

impl IngestionSummary {
    pub fn completed(&self) -> usize {
        self.persisted + self.skipped
    }
}

/// Ingestion processor
pub struct IngestionProcessor<F> {
    fetcher: F,
}

impl<F: RecordFetcher> IngestionProcessor<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    /// Process one identifier to a terminal outcome
    #[instrument(skip_all, fields(cik = %cik.padded()))]
    pub async fn process<S: DocumentStore>(&self, store: &S, cik: Cik) -> Outcome {
        let outcome = match self.try_process(store, cik).await {
            Ok(outcome) => outcome,
            Err(error) => Outcome::Aborted { cik, error },
        };
        metrics::record_identifier(outcome.label());
        outcome
    }

    async fn try_process<S: DocumentStore>(&self, store: &S, cik: Cik) -> Result<Outcome, IngestionError> {
        let started = Instant::now();
        let fetched = self
            .fetcher
            .fetch(cik)
            .await
            .map_err(|source| IngestionError::Fetch { cik, source })?;
        metrics::record_fetch(started.elapsed().as_secs_f64());

        let submission = match fetched {
            Fetched::Found(submission) => *submission,
            Fetched::NotFound { url } => {
                info!(%url, "No data found for CIK. Skipping...");
                return Ok(Outcome::Skipped { cik });
            }
        };

        let storage = |source: AppError| IngestionError::Storage { cik, source };

        let (profile, filings) = submission.split();

        let company_id = store
            .insert(Collection::Companies, profile.into_document().map_err(storage)?)
            .await
            .map_err(storage)?;
        metrics::record_insert(Collection::Companies.table_name());

        let history = filings.attach(company_id);
        let filings_id = store
            .insert(Collection::Filings, history.into_document().map_err(storage)?)
            .await
            .map_err(storage)?;
        metrics::record_insert(Collection::Filings.table_name());

        info!(%company_id, "Company facts and filings inserted successfully");

        Ok(Outcome::Persisted {
            cik,
            company_id,
            filings_id,
        })
    }

    /// Lazy, strictly sequential stream of outcomes.
    ///
    /// The next identifier is not fetched until the previous outcome has
    /// been pulled from the stream.
    pub fn outcomes<'a, S: DocumentStore>(
        &'a self,
        store: &'a S,
        identifiers: Vec<Cik>,
    ) -> impl Stream<Item = Outcome> + 'a {
        stream::iter(identifiers).then(move |cik| self.process(store, cik))
    }

    /// Drive the outcome stream, halting on the first abort
    pub async fn run<S: DocumentStore>(
        &self,
        store: &S,
        identifiers: Vec<Cik>,
    ) -> Result<IngestionSummary, IngestionError> {
        let total = identifiers.len();
        let outcomes = self.outcomes(store, identifiers);
        futures::pin_mut!(outcomes);

        let mut summary = IngestionSummary::default();

        while let Some(outcome) = outcomes.next().await {
            match outcome {
                Outcome::Skipped { .. } => summary.skipped += 1,
                Outcome::Persisted { .. } => summary.persisted += 1,
                Outcome::Aborted { cik, error } => {
                    error!(
                        cik = %cik.padded(),
                        error = %error,
                        code = ?error.error_code(),
                        completed = summary.completed(),
                        remaining = total - summary.completed() - 1,
                        "Ingestion aborted"
                    );
                    return Err(IngestionError::Aborted {
                        cik,
                        completed: summary.completed(),
                        source: Box::new(error),
                    });
                }
            }
        }

        info!(
            processed = summary.completed(),
            persisted = summary.persisted,
            skipped = summary.skipped,
            "Ingestion complete"
        );
        Ok(summary)
    }
}

/// Run one ingestion invocation over its own store handle.
///
/// The handle is closed before returning, whatever the outcome.
pub async fn run_ingestion<S, F>(
    store: S,
    fetcher: F,
    identifiers: Vec<Cik>,
) -> Result<IngestionSummary, IngestionError>
where
    S: DocumentStore,
    F: RecordFetcher,
{
    let session = StoreSession::open(store);
    let processor = IngestionProcessor::new(fetcher);
    let result = processor.run(&*session, identifiers).await;
    session.release_with(result).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use filingforge_common::db::models::{CompanySubmission, COMPANY_ID_FIELD, ID_FIELD};
    use filingforge_common::InMemoryStore;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    enum Scripted {
        Found(serde_json::Value),
        NotFound,
        Fail,
    }

    /// Fetcher answering from a script and recording every call
    #[derive(Default)]
    struct ScriptedFetcher {
        script: HashMap<Cik, Scripted>,
        calls: Mutex<Vec<Cik>>,
    }

    impl ScriptedFetcher {
        fn with(mut self, cik: u64, response: Scripted) -> Self {
            self.script.insert(Cik::new(cik), response);
            self
        }

        fn calls(&self) -> Vec<Cik> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RecordFetcher for ScriptedFetcher {
        async fn fetch(&self, cik: Cik) -> filingforge_common::Result<Fetched> {
            self.calls.lock().unwrap().push(cik);
            match self.script.get(&cik).cloned().unwrap_or(Scripted::NotFound) {
                Scripted::Found(value) => {
                    let submission: CompanySubmission = serde_json::from_value(value)?;
                    Ok(Fetched::Found(Box::new(submission)))
                }
                Scripted::NotFound => Ok(Fetched::NotFound {
                    url: format!("test://CIK{}.json", cik.padded()),
                }),
                Scripted::Fail => Err(AppError::UpstreamStatus {
                    status: 500,
                    url: format!("test://CIK{}.json", cik.padded()),
                }),
            }
        }
    }

    fn submission(name: &str, sic: &str) -> Scripted {
        Scripted::Found(json!({
            "cik": "1",
            "name": name,
            "sic": sic,
            "sicDescription": "Mining",
            "filings": {"recent": {"filingDate": ["2024-03-02"], "form": ["8-K"]}}
        }))
    }

    fn ciks(values: &[u64]) -> Vec<Cik> {
        values.iter().copied().map(Cik::new).collect()
    }

    #[tokio::test]
    async fn test_all_not_found_succeeds_with_nothing_persisted() {
        let store = InMemoryStore::new();
        let fetcher = ScriptedFetcher::default()
            .with(1, Scripted::NotFound)
            .with(2, Scripted::NotFound);

        let summary = run_ingestion(store.clone(), fetcher, ciks(&[1, 2])).await.unwrap();

        assert_eq!(summary, IngestionSummary { persisted: 0, skipped: 2 });
        assert_eq!(store.count(Collection::Companies), 0);
        assert_eq!(store.count(Collection::Filings), 0);
        assert_eq!(store.insert_attempts(), 0);
        assert!(store.is_closed());
    }

    #[tokio::test]
    async fn test_fatal_error_halts_before_later_identifiers() {
        let store = InMemoryStore::new();
        let fetcher = Arc::new(
            ScriptedFetcher::default()
                .with(1, submission("First", "1000"))
                .with(2, Scripted::Fail)
                .with(3, submission("Third", "1000")),
        );

        let err = run_ingestion(store.clone(), fetcher.clone(), ciks(&[1, 2, 3]))
            .await
            .unwrap_err();

        match &err {
            IngestionError::Aborted { cik, completed, source } => {
                assert_eq!(*cik, Cik::new(2));
                assert_eq!(*completed, 1);
                assert!(matches!(**source, IngestionError::Fetch { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.cik(), Some(Cik::new(2)));
        assert_eq!(err.error_code(), Some(4001));

        // identifier 3 was never fetched and nothing was written for it
        assert_eq!(fetcher.calls(), ciks(&[1, 2]));
        assert_eq!(store.insert_attempts(), 2);
        assert_eq!(store.count(Collection::Companies), 1);
        assert!(store.is_closed());
    }

    #[tokio::test]
    async fn test_storage_failure_is_fatal() {
        let store = InMemoryStore::new();
        store.fail_inserts_into(Collection::Filings);
        let fetcher = Arc::new(
            ScriptedFetcher::default()
                .with(1, submission("First", "1000"))
                .with(2, submission("Second", "2000")),
        );

        let err = run_ingestion(store.clone(), fetcher.clone(), ciks(&[1, 2]))
            .await
            .unwrap_err();

        match err {
            IngestionError::Aborted { source, .. } => {
                assert!(matches!(*source, IngestionError::Storage { .. }))
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(fetcher.calls(), ciks(&[1]));
        assert!(store.is_closed());
    }

    #[tokio::test]
    async fn test_malformed_document_is_fatal() {
        let store = InMemoryStore::new();
        // no `filings` field
        let fetcher = ScriptedFetcher::default()
            .with(1, Scripted::Found(json!({"name": "Broken"})))
            .with(2, submission("Second", "2000"));

        let err = run_ingestion(store.clone(), fetcher, ciks(&[1, 2])).await.unwrap_err();

        assert_eq!(err.cik(), Some(Cik::new(1)));
        assert_eq!(store.insert_attempts(), 0);
    }

    #[tokio::test]
    async fn test_filings_reference_generated_company_key() {
        let store = InMemoryStore::new();
        let fetcher = ScriptedFetcher::default().with(7, submission("Seven", "1000"));

        let summary = run_ingestion(store.clone(), fetcher, ciks(&[7])).await.unwrap();
        assert_eq!(summary.persisted, 1);

        let companies = store.documents(Collection::Companies);
        let filings = store.documents(Collection::Filings);
        assert_eq!(companies.len(), 1);
        assert_eq!(filings.len(), 1);

        let company = &companies[0];
        let filing = &filings[0];
        assert_eq!(filing.document[COMPANY_ID_FIELD], json!(company.id.to_string()));
        assert!(!company.document.contains_key("filings"));
        assert!(!company.document.contains_key(ID_FIELD));
        assert_eq!(filing.document["recent"]["form"], json!(["8-K"]));
    }

    #[tokio::test]
    async fn test_outcome_stream_reports_each_state() {
        let store = InMemoryStore::new();
        let processor = IngestionProcessor::new(
            ScriptedFetcher::default()
                .with(1, Scripted::NotFound)
                .with(2, submission("Two", "2000"))
                .with(3, Scripted::Fail),
        );

        let outcomes: Vec<Outcome> = processor
            .outcomes(&store, ciks(&[1, 2, 3]))
            .collect()
            .await;

        assert!(matches!(outcomes[0], Outcome::Skipped { .. }));
        match &outcomes[1] {
            Outcome::Persisted { company_id, filings_id, .. } => assert_ne!(company_id, filings_id),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(matches!(outcomes[2], Outcome::Aborted { .. }));
    }

    #[tokio::test]
    async fn test_rerun_duplicates_records() {
        // No dedup key: running the same identifiers twice stores everything twice.
        let store = InMemoryStore::new();
        let fetcher = Arc::new(ScriptedFetcher::default().with(5, submission("Five", "1000")));

        run_ingestion(store.clone(), fetcher.clone(), ciks(&[5])).await.unwrap();
        store.reopen();
        run_ingestion(store.clone(), fetcher.clone(), ciks(&[5])).await.unwrap();

        let companies = store.documents(Collection::Companies);
        assert_eq!(companies.len(), 2);
        assert_ne!(companies[0].id, companies[1].id);
        assert_eq!(companies[0].document, companies[1].document);
        assert_eq!(store.count(Collection::Filings), 2);
    }
}
