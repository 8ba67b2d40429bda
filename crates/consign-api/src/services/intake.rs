//! Intake pipeline: validate a submission, file the primary image, notify the brokerage.

use std::path::PathBuf;
use std::sync::Arc;

use consign_core::validation::{
    file_extension, primary_image_filename, sanitize_artist_name, validate_submission,
};
use consign_core::{
    Config, FileUpload, IdentifierGenerator, IntakeError, NotificationEmail, Submission,
    TrackingId, UploadError, UploadStatus,
};
use consign_storage::UploadStore;

use crate::services::email::Notifier;

/// Whether the brokerage notification went out.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationStatus {
    Sent,
    /// Delivery failed; the submission is still accepted.
    Failed(String),
}

#[derive(Debug)]
pub enum IntakeOutcome {
    Accepted {
        tracking_id: TrackingId,
        stored_path: PathBuf,
        notification: NotificationStatus,
    },
    Rejected {
        tracking_id: TrackingId,
        errors: Vec<IntakeError>,
    },
}

#[derive(Clone)]
pub struct IntakeService {
    config: Arc<Config>,
    store: Arc<dyn UploadStore>,
    notifier: Arc<dyn Notifier>,
    ids: Arc<dyn IdentifierGenerator>,
}

impl IntakeService {
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn UploadStore>,
        notifier: Arc<dyn Notifier>,
        ids: Arc<dyn IdentifierGenerator>,
    ) -> Self {
        Self {
            config,
            store,
            notifier,
            ids,
        }
    }

    /// Run one submission through the pipeline.
    ///
    /// Field errors are collected together. The image is only looked at once the
    /// fields are clean, and the notification only goes out once the image is stored.
    #[tracing::instrument(
        skip(self, submission, upload),
        fields(tracking_id = tracing::field::Empty, operation = "intake")
    )]
    pub async fn handle(
        &self,
        submission: &Submission,
        upload: Option<&FileUpload>,
    ) -> IntakeOutcome {
        let settings = &self.config.intake;
        let tracking_id = self.ids.generate();
        tracing::Span::current().record("tracking_id", tracking_id.as_str());

        if let Err(e) = self.store.ensure_ready().await {
            tracing::warn!(
                error = %e,
                upload_dir = %self.store.root().display(),
                "Upload directory could not be prepared"
            );
        }

        let errors: Vec<IntakeError> = validate_submission(submission, settings.minimum_price)
            .into_iter()
            .map(IntakeError::from)
            .collect();
        if !errors.is_empty() {
            tracing::debug!(error_count = errors.len(), "Submission failed validation");
            return IntakeOutcome::Rejected {
                tracking_id,
                errors,
            };
        }

        let stored_path = match self
            .store_primary_image(&tracking_id, submission, upload)
            .await
        {
            Ok(path) => path,
            Err(e) => {
                tracing::debug!(error = %e, "Primary image rejected");
                return IntakeOutcome::Rejected {
                    tracking_id,
                    errors: vec![e.into()],
                };
            }
        };

        let email = NotificationEmail::compose(
            settings,
            &tracking_id,
            submission,
            &stored_path.display().to_string(),
        );

        let notification = match self
            .notifier
            .send(
                &email.recipient,
                &email.subject,
                &email.body,
                email.reply_to.as_deref(),
            )
            .await
        {
            Ok(()) => NotificationStatus::Sent,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    tracking_id = %tracking_id,
                    stored_path = %stored_path.display(),
                    "Notification delivery failed"
                );
                NotificationStatus::Failed(e.to_string())
            }
        };

        tracing::info!(
            stored_path = %stored_path.display(),
            notified = notification == NotificationStatus::Sent,
            "Submission accepted"
        );

        IntakeOutcome::Accepted {
            tracking_id,
            stored_path,
            notification,
        }
    }

    async fn store_primary_image(
        &self,
        tracking_id: &TrackingId,
        submission: &Submission,
        upload: Option<&FileUpload>,
    ) -> Result<PathBuf, UploadError> {
        let upload = match upload {
            None => return Err(UploadError::Missing),
            Some(u) if u.status == UploadStatus::NoFile => return Err(UploadError::Missing),
            Some(u) if !u.status.is_ok() => return Err(UploadError::Transport(u.status)),
            Some(u) => u,
        };

        let filename = primary_image_filename(
            tracking_id.as_str(),
            &sanitize_artist_name(submission.artist_name()),
            file_extension(&upload.original_name),
        );

        self.store
            .store(&upload.temp_path, &filename)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    temp_path = %upload.temp_path.display(),
                    filename = %filename,
                    "Failed to move primary image"
                );
                UploadError::MoveFailed
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::email::DeliveryError;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use consign_core::IntakeSettings;
    use consign_storage::LocalUploadStore;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct FixedIds(TrackingId);

    impl IdentifierGenerator for FixedIds {
        fn generate(&self) -> TrackingId {
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct FakeNotifier {
        sent: Mutex<Vec<NotificationEmail>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for FakeNotifier {
        async fn send(
            &self,
            recipient: &str,
            subject: &str,
            body: &str,
            reply_to: Option<&str>,
        ) -> Result<(), DeliveryError> {
            if self.fail {
                return Err(DeliveryError::MissingHost);
            }
            self.sent.lock().unwrap().push(NotificationEmail {
                recipient: recipient.to_string(),
                reply_to: reply_to.map(str::to_string),
                subject: subject.to_string(),
                body: body.to_string(),
            });
            Ok(())
        }
    }

    struct Fixture {
        service: IntakeService,
        notifier: Arc<FakeNotifier>,
        upload_dir: PathBuf,
        spool: TempDir,
        _root: TempDir,
    }

    fn fixture(fail_delivery: bool) -> Fixture {
        let root = tempfile::tempdir().unwrap();
        let upload_dir = root.path().join("secure_uploads");
        let mut settings = IntakeSettings::new("brokerage@example.com", "webmaster@example.com");
        settings.upload_dir = upload_dir.clone();
        let config = Arc::new(Config::new(settings));

        let notifier = Arc::new(FakeNotifier {
            fail: fail_delivery,
            ..FakeNotifier::default()
        });
        let id = TrackingId::at("OPC", Utc.timestamp_opt(1_700_012_345, 0).unwrap());
        let service = IntakeService::new(
            config.clone(),
            Arc::new(LocalUploadStore::from_settings(&config.intake)),
            notifier.clone(),
            Arc::new(FixedIds(id)),
        );

        Fixture {
            service,
            notifier,
            upload_dir,
            spool: tempfile::tempdir().unwrap(),
            _root: root,
        }
    }

    fn valid_submission() -> Submission {
        Submission::new()
            .with("artworkTitle", "Blue Hour")
            .with("artistName", "Jane O'Brien!")
            .with("email", "jane@example.com")
            .with("desiredPrice", "15000")
            .with("mediumMaterials", "Oil on linen")
            .with("currentLocation", "Lisbon")
            .with("agreement", "on")
    }

    fn spooled_upload(fixture: &Fixture, name: &str) -> FileUpload {
        let path = fixture.spool.path().join("php-upload");
        std::fs::write(&path, b"png bytes").unwrap();
        FileUpload::new(path, name, 9)
    }

    fn stored_files(dir: &std::path::Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn accepted_submission_stores_file_and_notifies() {
        let fixture = fixture(false);
        let upload = spooled_upload(&fixture, "art.PNG");

        let outcome = fixture
            .service
            .handle(&valid_submission(), Some(&upload))
            .await;

        match outcome {
            IntakeOutcome::Accepted {
                tracking_id,
                stored_path,
                notification,
            } => {
                assert_eq!(tracking_id.as_str(), "OPC-20231115-12345");
                assert_eq!(
                    stored_path,
                    fixture
                        .upload_dir
                        .join("OPC-20231115-12345_Jane_OBrien_PRIMARY.PNG")
                );
                assert_eq!(notification, NotificationStatus::Sent);
            }
            other => panic!("expected acceptance, got {:?}", other),
        }

        assert_eq!(
            stored_files(&fixture.upload_dir),
            vec!["OPC-20231115-12345_Jane_OBrien_PRIMARY.PNG".to_string()]
        );
        let sent = fixture.notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].subject.contains("OPC-20231115-12345"));
        assert!(sent[0]
            .body
            .contains("OPC-20231115-12345_Jane_OBrien_PRIMARY.PNG"));
    }

    #[tokio::test]
    async fn field_errors_skip_file_handling() {
        let fixture = fixture(false);
        let upload = spooled_upload(&fixture, "art.png");
        let mut submission = valid_submission();
        submission.remove("artworkTitle");
        submission.insert("desiredPrice", "9999.99");

        let outcome = fixture.service.handle(&submission, Some(&upload)).await;

        let IntakeOutcome::Rejected { errors, .. } = outcome else {
            panic!("expected rejection");
        };
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            messages,
            vec![
                "ArtworkTitle is required.".to_string(),
                "Desired Selling Price must be at least $10,000".to_string(),
            ]
        );
        assert!(upload.temp_path.exists());
        assert!(stored_files(&fixture.upload_dir).is_empty());
        assert!(fixture.notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upload_directory_is_created_even_when_rejected() {
        let fixture = fixture(false);
        fixture.service.handle(&Submission::new(), None).await;
        assert!(fixture.upload_dir.is_dir());
    }

    #[tokio::test]
    async fn missing_upload_is_reported() {
        let fixture = fixture(false);
        let outcome = fixture.service.handle(&valid_submission(), None).await;

        let IntakeOutcome::Rejected { errors, .. } = outcome else {
            panic!("expected rejection");
        };
        assert_eq!(errors, vec![IntakeError::Upload(UploadError::Missing)]);
        assert!(fixture.notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_file_field_counts_as_missing() {
        let fixture = fixture(false);
        let upload = FileUpload::failed("", UploadStatus::NoFile);
        let outcome = fixture
            .service
            .handle(&valid_submission(), Some(&upload))
            .await;

        let IntakeOutcome::Rejected { errors, .. } = outcome else {
            panic!("expected rejection");
        };
        assert_eq!(errors, vec![IntakeError::Upload(UploadError::Missing)]);
    }

    #[tokio::test]
    async fn transport_failure_is_reported_with_reason() {
        let fixture = fixture(false);
        let upload = FileUpload::failed("art.png", UploadStatus::TooLarge);
        let outcome = fixture
            .service
            .handle(&valid_submission(), Some(&upload))
            .await;

        let IntakeOutcome::Rejected { errors, .. } = outcome else {
            panic!("expected rejection");
        };
        assert_eq!(
            errors,
            vec![IntakeError::Upload(UploadError::Transport(
                UploadStatus::TooLarge
            ))]
        );
    }

    #[tokio::test]
    async fn vanished_temp_file_is_a_move_failure() {
        let fixture = fixture(false);
        let upload = FileUpload::new(fixture.spool.path().join("gone"), "art.png", 9);
        let outcome = fixture
            .service
            .handle(&valid_submission(), Some(&upload))
            .await;

        let IntakeOutcome::Rejected { errors, .. } = outcome else {
            panic!("expected rejection");
        };
        assert_eq!(errors, vec![IntakeError::Upload(UploadError::MoveFailed)]);
        assert!(fixture.notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delivery_failure_still_accepts() {
        let fixture = fixture(true);
        let upload = spooled_upload(&fixture, "art.jpg");

        let outcome = fixture
            .service
            .handle(&valid_submission(), Some(&upload))
            .await;

        let IntakeOutcome::Accepted { notification, .. } = outcome else {
            panic!("expected acceptance");
        };
        assert!(matches!(notification, NotificationStatus::Failed(_)));
        assert_eq!(stored_files(&fixture.upload_dir).len(), 1);
    }
}
