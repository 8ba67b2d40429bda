//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p consign-api --test intake_test`.

#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use chrono::{TimeZone, Utc};
use consign_api::setup::routes::build_router;
use consign_api::{AppState, DeliveryError, Notifier};
use consign_core::{Config, IdentifierGenerator, IntakeSettings, NotificationEmail, TrackingId};
use consign_storage::LocalUploadStore;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Identifier every submission in the test app receives.
pub const TRACKING_ID: &str = "OPC-20231115-12345";

pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nnot really an image";

/// Hands out the same identifier every time.
pub struct FixedIdentifierGenerator(pub TrackingId);

impl IdentifierGenerator for FixedIdentifierGenerator {
    fn generate(&self) -> TrackingId {
        self.0.clone()
    }
}

/// Captures notifications instead of delivering them.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<NotificationEmail>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<NotificationEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
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

/// Test application: server, captured notifications, and owned directories.
pub struct TestApp {
    pub server: TestServer,
    pub notifier: Arc<RecordingNotifier>,
    pub upload_dir: PathBuf,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Names of the files currently in the upload directory.
    pub fn stored_files(&self) -> Vec<String> {
        stored_files(&self.upload_dir)
    }
}

fn stored_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with(RecordingNotifier::default())
}

pub fn setup_test_app_with(notifier: RecordingNotifier) -> TestApp {
    setup_test_app_configured(notifier, |_| {})
}

/// Setup test app with isolated upload and spool directories. `configure` may
/// adjust the configuration before the router is built.
pub fn setup_test_app_configured(
    notifier: RecordingNotifier,
    configure: impl FnOnce(&mut Config),
) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let upload_dir = temp_dir.path().join("secure_uploads");
    let spool_dir = temp_dir.path().join("spool");
    std::fs::create_dir(&spool_dir).expect("Failed to create spool directory");

    let mut settings = IntakeSettings::new("brokerage@example.com", "webmaster@example.com");
    settings.upload_dir = upload_dir.clone();
    let mut config = Config::new(settings);
    config.base.temp_dir = spool_dir;
    configure(&mut config);

    let notifier = Arc::new(notifier);
    let tracking_id = TrackingId::at("OPC", Utc.timestamp_opt(1_700_012_345, 0).unwrap());
    let state = AppState::new(
        config.clone(),
        Arc::new(LocalUploadStore::from_settings(&config.intake)),
        notifier.clone(),
        Arc::new(FixedIdentifierGenerator(tracking_id)),
    );

    let app = build_router(Arc::new(state));
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        notifier,
        upload_dir,
        _temp_dir: temp_dir,
    }
}

/// The text fields of a submission that passes validation.
pub fn valid_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("artworkTitle", "Blue Hour"),
        ("artistName", "Jane O'Brien!"),
        ("email", "jane@example.com"),
        ("desiredPrice", "15000"),
        ("mediumMaterials", "Oil on linen"),
        ("currentLocation", "Lisbon"),
        ("agreement", "on"),
        ("coaStatus", "Available"),
        ("consignorName", "Sam Lee"),
        ("discretionaryNotes", "Private collection since 1998."),
    ]
}

/// Build a form from text fields, optionally with a primary image.
pub fn form(fields: &[(&str, &str)], image: Option<(&str, &'static [u8])>) -> MultipartForm {
    let mut form = MultipartForm::new();
    for (name, value) in fields {
        form = form.add_text(name.to_string(), value.to_string());
    }
    if let Some((file_name, data)) = image {
        let part = Part::bytes(bytes::Bytes::from_static(data))
            .file_name(file_name.to_string())
            .mime_type("image/png");
        form = form.add_part("primaryImage", part);
    }
    form
}

/// `valid_fields` with one field replaced, or removed when `value` is `None`.
pub fn fields_with(
    name: &'static str,
    value: Option<&'static str>,
) -> Vec<(&'static str, &'static str)> {
    let mut fields: Vec<_> = valid_fields()
        .into_iter()
        .filter(|(n, _)| *n != name)
        .collect();
    if let Some(value) = value {
        fields.push((name, value));
    }
    fields
}
