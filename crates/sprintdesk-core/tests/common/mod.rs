//! Fakes shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Semaphore;

use sprintdesk_core::api::{ApiError, AuthApi, ProjectApi};
use sprintdesk_core::auth::{CredentialStore, LoginResponse, ManualClock, SessionContext};
use sprintdesk_core::config::Config;
use sprintdesk_core::models::{
    Member, Message, Project, ProjectMembership, RegisterRequest, Sprint, Task,
};
use sprintdesk_core::router::{Navigator, Router};
use sprintdesk_core::screens::ScreenContext;

/// Token endpoints with scripted answers and call counters.
pub struct FakeAuth {
    login_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    login_response: Mutex<Result<LoginResponse, ApiError>>,
    refresh_response: Mutex<Result<LoginResponse, ApiError>>,
    /// When present, every refresh waits for a permit before answering.
    gate: Option<Semaphore>,
    /// Makes the next refresh panic instead of answering
    panic_next_refresh: AtomicBool,
}

impl FakeAuth {
    pub fn new() -> Self {
        Self {
            login_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            login_response: Mutex::new(Ok(LoginResponse::new("a1", 3600, "r1", 86400))),
            refresh_response: Mutex::new(Ok(LoginResponse::new("a2", 3600, "r2", 86400))),
            gate: None,
            panic_next_refresh: AtomicBool::new(false),
        }
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new()
        }
    }

    pub fn release(&self) {
        if let Some(ref gate) = self.gate {
            gate.add_permits(1);
        }
    }

    pub fn set_login(&self, response: Result<LoginResponse, ApiError>) {
        *self.login_response.lock().unwrap() = response;
    }

    pub fn set_refresh(&self, response: Result<LoginResponse, ApiError>) {
        *self.refresh_response.lock().unwrap() = response;
    }

    pub fn panic_on_next_refresh(&self) {
        self.panic_next_refresh.store(true, Ordering::SeqCst);
    }

    pub fn login_count(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthApi for FakeAuth {
    async fn login(&self, _: &str, _: &str) -> Result<LoginResponse, ApiError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.login_response.lock().unwrap().clone()
    }

    async fn refresh(&self, _: &str) -> Result<LoginResponse, ApiError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(ref gate) = self.gate {
            let permit = gate.acquire().await.expect("gate open");
            permit.forget();
        }
        if self.panic_next_refresh.swap(false, Ordering::SeqCst) {
            panic!("refresh backend crashed");
        }
        self.refresh_response.lock().unwrap().clone()
    }

    async fn register(&self, _: &RegisterRequest) -> Result<Message, ApiError> {
        Ok(Message {
            message: "registered".to_string(),
        })
    }
}

/// Project endpoints that record every token they are called with.
#[derive(Default)]
pub struct FakeProjects {
    tokens: Mutex<Vec<String>>,
    /// Tokens the backend answers `Unauthorized` to
    rejected: Mutex<Vec<String>>,
}

impl FakeProjects {
    pub fn reject(&self, token: &str) {
        self.rejected.lock().unwrap().push(token.to_string());
    }

    pub fn calls(&self) -> usize {
        self.tokens.lock().unwrap().len()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }

    fn check(&self, token: &str) -> Result<(), ApiError> {
        self.tokens.lock().unwrap().push(token.to_string());
        if self.rejected.lock().unwrap().iter().any(|t| t == token) {
            Err(ApiError::Unauthorized)
        } else {
            Ok(())
        }
    }
}

pub fn project(id: i64) -> Project {
    Project {
        id,
        name: format!("Project {}", id),
        description: String::new(),
        tag: None,
    }
}

#[async_trait]
impl ProjectApi for FakeProjects {
    async fn get_projects(&self, token: &str) -> Result<Vec<Project>, ApiError> {
        self.check(token)?;
        Ok(vec![project(7)])
    }

    async fn get_project(&self, token: &str, project_id: i64) -> Result<Project, ApiError> {
        self.check(token)?;
        Ok(project(project_id))
    }

    async fn get_tasks(&self, token: &str, _: i64) -> Result<Vec<Task>, ApiError> {
        self.check(token)?;
        Ok(Vec::new())
    }

    async fn get_sprints(&self, token: &str, _: i64) -> Result<Vec<Sprint>, ApiError> {
        self.check(token)?;
        Ok(Vec::new())
    }

    async fn get_sprint(&self, token: &str, sprint_id: i64) -> Result<Sprint, ApiError> {
        self.check(token)?;
        Ok(Sprint {
            id: sprint_id,
            name: format!("Sprint {}", sprint_id),
            start_date: None,
            end_date: None,
            tasks: Vec::new(),
        })
    }

    async fn add_task_to_sprint(&self, token: &str, _: i64, _: i64) -> Result<Task, ApiError> {
        self.check(token)?;
        Err(ApiError::NotFound("task".into()))
    }

    async fn managed_projects(&self, token: &str) -> Result<Vec<ProjectMembership>, ApiError> {
        self.check(token)?;
        Ok(Vec::new())
    }

    async fn project_members(&self, token: &str, _: i64) -> Result<Vec<Member>, ApiError> {
        self.check(token)?;
        Ok(Vec::new())
    }

    async fn decide_membership(&self, token: &str, _: i64, _: bool) -> Result<Message, ApiError> {
        self.check(token)?;
        Ok(Message {
            message: "ok".to_string(),
        })
    }

    async fn leave_project(&self, token: &str, _: i64) -> Result<Message, ApiError> {
        self.check(token)?;
        Ok(Message {
            message: "ok".to_string(),
        })
    }
}

/// A session over fakes and a manual clock starting at `start`.
pub struct Harness {
    pub start: DateTime<Utc>,
    pub clock: Arc<ManualClock>,
    pub store: Arc<CredentialStore>,
    pub auth: Arc<FakeAuth>,
    pub projects: Arc<FakeProjects>,
    pub session: SessionContext,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_auth(FakeAuth::new())
    }

    pub fn with_auth(auth: FakeAuth) -> Self {
        Self::with_store(auth, CredentialStore::in_memory())
    }

    pub fn with_store(auth: FakeAuth, store: CredentialStore) -> Self {
        let start = Utc::now();
        let clock = Arc::new(ManualClock::new(start));
        let store = Arc::new(store);
        let auth = Arc::new(auth);
        let session = SessionContext::new(store.clone(), auth.clone(), clock.clone());
        Self {
            start,
            clock,
            store,
            auth,
            projects: Arc::new(FakeProjects::default()),
            session,
        }
    }

    /// Log in with `{a1, 3600, r1, 86400, bearer}` at the current instant.
    pub fn login(&self) {
        self.session
            .login(&LoginResponse::new("a1", 3600, "r1", 86400))
            .expect("well-formed login response");
    }

    /// Move the clock to `start + secs`.
    pub fn at(&self, secs: i64) {
        self.clock.set(self.start + Duration::seconds(secs));
    }

    pub fn router(&self) -> (Router, Navigator) {
        let navigator = Navigator::new();
        let cx = ScreenContext {
            session: self.session.clone(),
            auth: self.auth.clone(),
            api: self.projects.clone(),
            navigator: navigator.clone(),
            config: Config::default().into_shared(),
        };
        (Router::new(cx), navigator)
    }
}

/// Let spawned tasks run.
pub async fn yield_many() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}
