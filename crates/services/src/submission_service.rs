//! # SubmissionService
//!
//! Orchestrates a check-in: recognize text, extract the nickname, reject
//! duplicates against the log as it is now, append.

use bytes::Bytes;
use chrono::Local;
use domains::{
    extract_nickname, ExtractionFailure, OcrProvider, Submission, SubmissionStore, SubmitOutcome,
    TIME_FORMAT,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::error::ServiceError;

pub struct SubmissionService {
    store: Arc<dyn SubmissionStore>,
    ocr: Arc<dyn OcrProvider>,
    ocr_timeout: Duration,
    /// Serializes every store mutation, so two racing submits cannot both
    /// pass the duplicate check.
    write_lock: Mutex<()>,
}

impl SubmissionService {
    pub fn new(
        store: Arc<dyn SubmissionStore>,
        ocr: Arc<dyn OcrProvider>,
        ocr_timeout: Duration,
    ) -> Self {
        Self {
            store,
            ocr,
            ocr_timeout,
            write_lock: Mutex::new(()),
        }
    }

    /// Runs OCR on an uploaded image, then [`Self::submit`]s the text.
    /// Provider failures and timeouts become extraction failures.
    #[instrument(skip(self, image), fields(image_len = image.len()))]
    pub async fn submit_image(&self, image: Bytes, ip: &str) -> Result<SubmitOutcome, ServiceError> {
        let detected = match tokio::time::timeout(self.ocr_timeout, self.ocr.detect_text(image)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(error = %e, "OCR provider failed");
                return Ok(SubmitOutcome::ExtractionFailed(ExtractionFailure::ProviderError));
            }
            Err(_) => {
                warn!(timeout = ?self.ocr_timeout, "OCR provider timed out");
                return Ok(SubmitOutcome::ExtractionFailed(ExtractionFailure::Timeout));
            }
        };

        match detected {
            Some(text) if !text.trim().is_empty() => self.submit(&text, ip).await,
            _ => Ok(SubmitOutcome::ExtractionFailed(ExtractionFailure::NoText)),
        }
    }

    /// Extract → load → duplicate check → stamp → append.
    #[instrument(skip(self, ocr_text))]
    pub async fn submit(&self, ocr_text: &str, ip: &str) -> Result<SubmitOutcome, ServiceError> {
        let nickname = extract_nickname(ocr_text);
        if nickname.is_empty() {
            info!("no nickname candidate in recognized text");
            return Ok(SubmitOutcome::ExtractionFailed(ExtractionFailure::NoNickname));
        }

        let _guard = self.write_lock.lock().await;

        let current = self.store.load_all().await?;
        if let Some(existing) = current.find_conflict(&nickname, ip) {
            info!(%nickname, existing = %existing.name, "duplicate submission");
            return Ok(SubmitOutcome::Duplicate {
                existing: existing.clone(),
                nickname,
            });
        }

        let submission = Submission::new(nickname, Local::now().format(TIME_FORMAT).to_string(), ip);
        self.store.append(&submission).await?;

        info!(nickname = %submission.name, "submission accepted");
        Ok(SubmitOutcome::Accepted(submission))
    }

    pub async fn list(&self) -> Result<Vec<Submission>, ServiceError> {
        Ok(self.store.load_all().await?.into_records())
    }

    pub async fn delete_by_name(&self, name: &str) -> Result<(), ServiceError> {
        let _guard = self.write_lock.lock().await;
        self.store.delete_by_name(name).await?;
        info!(name, "submission deleted");
        Ok(())
    }

    pub async fn export(&self) -> Result<Option<Bytes>, ServiceError> {
        Ok(self.store.export_raw().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDateTime;
    use domains::{MockOcrProvider, MockSubmissionStore, OcrError, StoreError, SubmissionSet};
    use mockall::predicate::eq;
    use tokio_test::{assert_err, assert_ok};

    fn service(store: MockSubmissionStore, ocr: MockOcrProvider) -> SubmissionService {
        SubmissionService::new(Arc::new(store), Arc::new(ocr), Duration::from_secs(5))
    }

    fn existing_alice() -> SubmissionSet {
        std::iter::once(Submission::new("alice1", "2024-01-01 10:00:00", "9.9.9.9")).collect()
    }

    #[tokio::test]
    async fn accepts_new_nickname_with_server_timestamp() {
        let mut store = MockSubmissionStore::new();
        store.expect_load_all().times(1).returning(|| Ok(SubmissionSet::new()));
        store
            .expect_append()
            .withf(|s: &Submission| s.name == "bob2" && s.ip == "5.6.7.8")
            .times(1)
            .returning(|_| Ok(()));

        let outcome = service(store, MockOcrProvider::new())
            .submit("WELCOME TO THE EVENT\nbob2\n", "5.6.7.8")
            .await
            .unwrap();

        let SubmitOutcome::Accepted(accepted) = outcome else {
            panic!("expected an accepted submission");
        };
        assert_eq!(accepted.name, "bob2");
        assert!(NaiveDateTime::parse_from_str(&accepted.time, TIME_FORMAT).is_ok());
    }

    #[tokio::test]
    async fn existing_nickname_is_a_duplicate_without_write() {
        let mut store = MockSubmissionStore::new();
        store.expect_load_all().returning(|| Ok(existing_alice()));
        store.expect_append().never();

        let outcome = service(store, MockOcrProvider::new())
            .submit("alice1", "1.2.3.4")
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SubmitOutcome::Duplicate {
                nickname: "alice1".into(),
                existing: Submission::new("alice1", "2024-01-01 10:00:00", "9.9.9.9"),
            }
        );
    }

    #[tokio::test]
    async fn existing_address_is_a_duplicate_regardless_of_nickname() {
        let mut store = MockSubmissionStore::new();
        store.expect_load_all().returning(|| Ok(existing_alice()));
        store.expect_append().never();

        let outcome = service(store, MockOcrProvider::new())
            .submit("carol7", "9.9.9.9")
            .await
            .unwrap();

        match outcome {
            SubmitOutcome::Duplicate { nickname, existing } => {
                assert_eq!(nickname, "carol7");
                assert_eq!(existing.name, "alice1");
            }
            other => panic!("expected Duplicate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn no_candidate_fails_before_touching_the_store() {
        let mut store = MockSubmissionStore::new();
        store.expect_load_all().never();
        store.expect_append().never();

        let outcome = service(store, MockOcrProvider::new())
            .submit("?? !!\nx", "1.2.3.4")
            .await
            .unwrap();
        assert_eq!(outcome, SubmitOutcome::ExtractionFailed(ExtractionFailure::NoNickname));
    }

    #[tokio::test]
    async fn storage_failures_propagate() {
        let mut store = MockSubmissionStore::new();
        store.expect_load_all().returning(|| {
            Err(StoreError::Io(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied")))
        });

        let result = service(store, MockOcrProvider::new()).submit("bob2", "1.2.3.4").await;
        let err = assert_err!(result);
        assert!(matches!(err, ServiceError::Storage(StoreError::Io(_))));
    }

    #[tokio::test]
    async fn submit_image_feeds_recognized_text_to_submit() {
        let mut ocr = MockOcrProvider::new();
        ocr.expect_detect_text()
            .with(eq(Bytes::from_static(b"img")))
            .returning(|_| Ok(Some("LOGIN\n영희99\nOK".to_string())));
        let mut store = MockSubmissionStore::new();
        store.expect_load_all().returning(|| Ok(SubmissionSet::new()));
        store.expect_append().returning(|_| Ok(()));

        let outcome = service(store, ocr)
            .submit_image(Bytes::from_static(b"img"), "1.2.3.4")
            .await
            .unwrap();
        assert_eq!(outcome.label(), "accepted");
    }

    #[tokio::test]
    async fn empty_detection_is_no_text() {
        let mut ocr = MockOcrProvider::new();
        ocr.expect_detect_text().returning(|_| Ok(None));

        let outcome = service(MockSubmissionStore::new(), ocr)
            .submit_image(Bytes::new(), "1.2.3.4")
            .await
            .unwrap();
        assert_eq!(outcome, SubmitOutcome::ExtractionFailed(ExtractionFailure::NoText));
    }

    #[tokio::test]
    async fn provider_error_is_an_extraction_failure() {
        let mut ocr = MockOcrProvider::new();
        ocr.expect_detect_text()
            .returning(|_| Err(OcrError::Provider("quota exceeded".into())));

        let outcome = service(MockSubmissionStore::new(), ocr)
            .submit_image(Bytes::new(), "1.2.3.4")
            .await
            .unwrap();
        assert_eq!(outcome, SubmitOutcome::ExtractionFailed(ExtractionFailure::ProviderError));
    }

    struct StalledOcr;

    #[async_trait]
    impl OcrProvider for StalledOcr {
        async fn detect_text(&self, _image: Bytes) -> Result<Option<String>, OcrError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Some("never".into()))
        }
    }

    #[tokio::test]
    async fn slow_provider_times_out_as_extraction_failure() {
        let svc = SubmissionService::new(
            Arc::new(MockSubmissionStore::new()),
            Arc::new(StalledOcr),
            Duration::from_millis(20),
        );
        let outcome = svc.submit_image(Bytes::new(), "1.2.3.4").await.unwrap();
        assert_eq!(outcome, SubmitOutcome::ExtractionFailed(ExtractionFailure::Timeout));
    }

    #[tokio::test]
    async fn read_side_delegates_to_the_store() {
        let mut store = MockSubmissionStore::new();
        store.expect_load_all().returning(|| Ok(existing_alice()));
        store
            .expect_delete_by_name()
            .withf(|name: &str| name == "alice1")
            .times(1)
            .returning(|_| Ok(()));
        store
            .expect_export_raw()
            .returning(|| Ok(Some(Bytes::from_static(b"alice1,2024-01-01 10:00:00,9.9.9.9\n"))));

        let svc = service(store, MockOcrProvider::new());
        assert_eq!(svc.list().await.unwrap().len(), 1);
        assert_ok!(svc.delete_by_name("alice1").await);
        assert!(svc.export().await.unwrap().unwrap().starts_with(b"alice1,"));
    }
}
