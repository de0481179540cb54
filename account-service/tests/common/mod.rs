use std::sync::Arc;
use std::sync::Mutex;

use account_service::domain::principal::service::AuthService;
use account_service::inbound::http::router::create_router;
use account_service::outbound::documents::FsDocumentStore;
use account_service::outbound::roster::FileEnrollmentDirectory;
use account_service::principal::errors::NotificationError;
use account_service::principal::errors::RepositoryError;
use account_service::principal::models::Principal;
use account_service::principal::models::Role;
use account_service::principal::ports::Notification;
use account_service::principal::ports::NotificationKind;
use account_service::principal::ports::Notifier;
use account_service::principal::ports::PrincipalRepository;
use async_trait::async_trait;
use auth::OtpGenerator;
use auth::TokenService;

pub const JWT_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

const ROSTER: &str = r#"[
    {"enrollment": "S100", "name": "Asha Kumari Rao"},
    {"enrollment": "S101", "name": "Ravi Verma"}
]"#;

/// In-memory principal stores, one vector per process. Enforces the same
/// per-store uniqueness the SQL unique indexes do.
#[derive(Default)]
pub struct InMemoryPrincipalRepository {
    records: Mutex<Vec<Principal>>,
}

#[async_trait]
impl PrincipalRepository for InMemoryPrincipalRepository {
    async fn create(&self, principal: Principal) -> Result<Principal, RepositoryError> {
        let mut records = self.records.lock().unwrap();

        let same_store = records.iter().filter(|p| p.role() == principal.role());
        for existing in same_store {
            if existing.email.as_str() == principal.email.as_str() {
                return Err(RepositoryError::DuplicateEmail);
            }
            if existing.external_id.as_str() == principal.external_id.as_str() {
                return Err(RepositoryError::DuplicateExternalId);
            }
        }

        records.push(principal.clone());
        Ok(principal)
    }

    async fn find_by_email(
        &self,
        role: Role,
        email: &str,
    ) -> Result<Option<Principal>, RepositoryError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .find(|p| p.role() == role && p.email.as_str() == email)
            .cloned())
    }

    async fn find_by_external_id(
        &self,
        role: Role,
        external_id: &str,
    ) -> Result<Option<Principal>, RepositoryError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .find(|p| p.role() == role && p.external_id.as_str() == external_id)
            .cloned())
    }

    async fn find_by_reset_digest(
        &self,
        role: Role,
        digest: &str,
    ) -> Result<Option<Principal>, RepositoryError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .find(|p| {
                p.role() == role
                    && p.reset
                        .as_ref()
                        .is_some_and(|reset| reset.token_digest == digest)
            })
            .cloned())
    }

    async fn update(&self, principal: &Principal) -> Result<(), RepositoryError> {
        let mut records = self.records.lock().unwrap();
        let slot = records
            .iter_mut()
            .find(|p| p.id == principal.id)
            .ok_or_else(|| RepositoryError::Database("No record to update".to_string()))?;
        *slot = principal.clone();
        Ok(())
    }
}

/// Notifier that records every message instead of delivering it, so tests
/// can read back OTP codes and reset URLs.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn last_otp_for(&self, email: &str) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        sent.iter().rev().find_map(|note| match &note.kind {
            NotificationKind::OtpCode { code } if note.recipient == email => Some(code.clone()),
            _ => None,
        })
    }

    pub fn last_reset_url_for(&self, email: &str) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        sent.iter().rev().find_map(|note| match &note.kind {
            NotificationKind::PasswordReset { reset_url } if note.recipient == email => {
                Some(reset_url.clone())
            }
            _ => None,
        })
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, note: Notification) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push(note);
        Ok(())
    }
}

/// Test application running the real router on a random port, with
/// in-memory ports behind the domain service.
pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub notifier: Arc<RecordingNotifier>,
    pub tokens: Arc<TokenService>,
    _documents_dir: tempfile::TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_otp_window(60).await
    }

    /// Spawn with a custom OTP validity window; a non-positive window makes
    /// every issued code already expired, for exercising the expiry paths.
    pub async fn spawn_with_otp_window(window_seconds: i64) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let repository = Arc::new(InMemoryPrincipalRepository::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let directory =
            Arc::new(FileEnrollmentDirectory::from_json(ROSTER).expect("Roster parse failed"));
        let tokens = Arc::new(TokenService::new(JWT_SECRET));

        let documents_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let documents = Arc::new(FsDocumentStore::new(
            documents_dir.path(),
            format!("{}/notes", address),
        ));

        let auth_service = Arc::new(AuthService::new(
            Arc::clone(&repository),
            Arc::clone(&notifier),
            directory,
            Arc::clone(&tokens),
            OtpGenerator::new(chrono::Duration::seconds(window_seconds)),
            "http://localhost:5173".to_string(),
        ));

        let router = create_router(auth_service, documents, Arc::clone(&tokens));
        tokio::spawn(async move { axum::serve(listener, router).await });

        let api_client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to build client");

        Self {
            address,
            api_client,
            notifier,
            tokens,
            _documents_dir: documents_dir,
        }
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }
}
