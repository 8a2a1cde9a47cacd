//! Screens behind each route.
//!
//! Every screen gets a `ScreenContext` and loads its data through
//! `ScreenContext::load`, which runs the call through the session's
//! refresh-and-retry interceptor on a background task.

mod help;
mod home;
mod login;
mod management;
mod not_found;
mod project;
mod projects;
mod register;
mod sprint;

use std::future::Future;
use std::sync::Arc;

pub use help::HelpScreen;
pub use home::HomeScreen;
pub use login::{LoginScreen, PASSWORD_MAX_LEN, USERNAME_MAX_LEN};
pub use management::ManagementScreen;
pub use not_found::NotFoundScreen;
pub use project::ProjectScreen;
pub use projects::ProjectsScreen;
pub use register::RegisterScreen;
pub use sprint::SprintScreen;

use crate::api::{ApiError, AuthApi, ProjectApi};
use crate::auth::SessionContext;
use crate::config::SharedConfig;
use crate::router::Navigator;
use crate::view::{Body, Fetch, FetchState};

/// Handles shared by every screen
#[derive(Clone)]
pub struct ScreenContext {
    pub session: SessionContext,
    pub auth: Arc<dyn AuthApi>,
    pub api: Arc<dyn ProjectApi>,
    pub navigator: Navigator,
    pub config: SharedConfig,
}

impl ScreenContext {
    /// Start an authenticated load into `fetch`.
    ///
    /// `op` may be invoked twice when the first attempt is rejected and the
    /// session refreshes.
    pub fn load<T, F, Fut>(&self, fetch: &mut Fetch<T>, op: F)
    where
        T: Send + 'static,
        F: Fn(Arc<dyn ProjectApi>, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let session = self.session.clone();
        let api = Arc::clone(&self.api);
        fetch.start(async move {
            session
                .authorized(|token| op(Arc::clone(&api), token))
                .await
        });
    }
}

/// Body for a fetch that has not produced data
fn pending_body<T>(fetch: &Fetch<T>) -> Option<Body> {
    match fetch.state() {
        FetchState::Idle | FetchState::Loading => Some(Body::Loading),
        FetchState::Failed(e) => Some(Body::Error(e.user_message())),
        FetchState::Ready(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;

    #[tokio::test]
    async fn test_pending_body_follows_fetch_state() {
        let mut fetch: Fetch<Vec<i64>> = Fetch::new();
        assert_eq!(pending_body(&fetch), Some(Body::Loading));

        fetch.start(async { Err(ApiError::NetworkError("offline".into())) });
        for _ in 0..50 {
            if fetch.poll() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(matches!(pending_body(&fetch), Some(Body::Error(_))));

        fetch.start(async { Ok(vec![1]) });
        for _ in 0..50 {
            if fetch.poll() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(pending_body(&fetch), None);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory backend for screen tests.

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{NaiveDate, Utc};

    use super::*;
    use crate::auth::{CredentialStore, LoginResponse, ManualClock};
    use crate::config::Config;
    use crate::models::{
        Member, MembershipStatus, Message, Priority, Project, ProjectMembership, RegisterRequest,
        Sprint, Task, Tag,
    };

    #[derive(Default)]
    pub struct FakeBackend {
        pub calls: AtomicUsize,
        pub projects: Mutex<Vec<Project>>,
        pub tasks: Mutex<Vec<Task>>,
        pub sprints: Mutex<Vec<Sprint>>,
        pub memberships: Mutex<Vec<ProjectMembership>>,
        pub fail_assign: Mutex<bool>,
        pub decisions: Mutex<Vec<(i64, bool)>>,
        pub left: Mutex<Vec<i64>>,
        pub registered: Mutex<Vec<RegisterRequest>>,
    }

    impl FakeBackend {
        fn hit(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    pub fn project(id: i64, name: &str) -> Project {
        Project {
            id,
            name: name.to_string(),
            description: format!("{} description", name),
            tag: Some(Tag {
                id: 1,
                name: "ops".to_string(),
            }),
        }
    }

    pub fn task(id: i64, name: &str) -> Task {
        Task {
            id,
            name: name.to_string(),
            description: String::new(),
            date_created: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            date_finished: None,
            timestamp: None,
            priority: Priority {
                id: 1,
                name: "Low".to_string(),
            },
        }
    }

    pub fn sprint(id: i64, name: &str, tasks: Vec<Task>) -> Sprint {
        Sprint {
            id,
            name: name.to_string(),
            start_date: None,
            end_date: None,
            tasks,
        }
    }

    pub fn membership(id: i64, status: MembershipStatus) -> ProjectMembership {
        ProjectMembership {
            project: project(id, "Shared"),
            owner: Some("grace".to_string()),
            status,
        }
    }

    #[async_trait]
    impl AuthApi for FakeBackend {
        async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
            if username == "ada" && password == "lovelace" {
                Ok(LoginResponse::new("a1", 3600, "r1", 86400))
            } else if username == "offline" {
                Err(ApiError::NetworkError("connection refused".into()))
            } else {
                Err(ApiError::Unauthorized)
            }
        }

        async fn refresh(&self, _: &str) -> Result<LoginResponse, ApiError> {
            Ok(LoginResponse::new("a2", 3600, "r2", 86400))
        }

        async fn register(&self, request: &RegisterRequest) -> Result<Message, ApiError> {
            self.registered
                .lock()
                .map_err(|_| ApiError::ServerError("poisoned".into()))?
                .push(request.clone());
            Ok(Message {
                message: "registered".to_string(),
            })
        }
    }

    #[async_trait]
    impl ProjectApi for FakeBackend {
        async fn get_projects(&self, _: &str) -> Result<Vec<Project>, ApiError> {
            self.hit();
            Ok(self.projects.lock().map(|p| p.clone()).unwrap_or_default())
        }

        async fn get_project(&self, _: &str, project_id: i64) -> Result<Project, ApiError> {
            self.hit();
            self.projects
                .lock()
                .ok()
                .and_then(|p| p.iter().find(|p| p.id == project_id).cloned())
                .ok_or_else(|| ApiError::NotFound("project".into()))
        }

        async fn get_tasks(&self, _: &str, _: i64) -> Result<Vec<Task>, ApiError> {
            self.hit();
            Ok(self.tasks.lock().map(|t| t.clone()).unwrap_or_default())
        }

        async fn get_sprints(&self, _: &str, _: i64) -> Result<Vec<Sprint>, ApiError> {
            self.hit();
            Ok(self.sprints.lock().map(|s| s.clone()).unwrap_or_default())
        }

        async fn get_sprint(&self, _: &str, sprint_id: i64) -> Result<Sprint, ApiError> {
            self.hit();
            self.sprints
                .lock()
                .ok()
                .and_then(|s| s.iter().find(|s| s.id == sprint_id).cloned())
                .ok_or_else(|| ApiError::NotFound("sprint".into()))
        }

        async fn add_task_to_sprint(&self, _: &str, _: i64, task_id: i64) -> Result<Task, ApiError> {
            self.hit();
            if self.fail_assign.lock().map(|f| *f).unwrap_or(false) {
                return Err(ApiError::ServerError("boom".into()));
            }
            self.tasks
                .lock()
                .ok()
                .and_then(|t| t.iter().find(|t| t.id == task_id).cloned())
                .ok_or_else(|| ApiError::NotFound("task".into()))
        }

        async fn managed_projects(&self, _: &str) -> Result<Vec<ProjectMembership>, ApiError> {
            self.hit();
            Ok(self.memberships.lock().map(|m| m.clone()).unwrap_or_default())
        }

        async fn project_members(&self, _: &str, _: i64) -> Result<Vec<Member>, ApiError> {
            self.hit();
            Ok(vec![Member {
                id: 1,
                username: "grace".to_string(),
                status: MembershipStatus::Accepted,
            }])
        }

        async fn decide_membership(&self, _: &str, project_id: i64, accept: bool) -> Result<Message, ApiError> {
            self.hit();
            if let Ok(mut decisions) = self.decisions.lock() {
                decisions.push((project_id, accept));
            }
            if let Ok(mut memberships) = self.memberships.lock() {
                if accept {
                    for m in memberships.iter_mut().filter(|m| m.project.id == project_id) {
                        m.status = MembershipStatus::Accepted;
                    }
                } else {
                    memberships.retain(|m| m.project.id != project_id);
                }
            }
            Ok(Message {
                message: "ok".to_string(),
            })
        }

        async fn leave_project(&self, _: &str, project_id: i64) -> Result<Message, ApiError> {
            self.hit();
            if let Ok(mut left) = self.left.lock() {
                left.push(project_id);
            }
            if let Ok(mut memberships) = self.memberships.lock() {
                memberships.retain(|m| m.project.id != project_id);
            }
            Ok(Message {
                message: "left".to_string(),
            })
        }
    }

    /// Context over `backend`, logged in unless `logged_in` is false
    pub fn context(backend: &Arc<FakeBackend>, logged_in: bool) -> ScreenContext {
        let store = Arc::new(CredentialStore::in_memory());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let session = SessionContext::new(store, backend.clone(), clock);
        if logged_in {
            let _ = session.login(&LoginResponse::new("a1", 3600, "r1", 86400));
        }
        ScreenContext {
            session,
            auth: backend.clone(),
            api: backend.clone(),
            navigator: Navigator::new(),
            config: Config::default().into_shared(),
        }
    }

    /// Poll until the screen reports a change or the budget runs out
    pub async fn settle<S: crate::view::Screen>(screen: &mut S) {
        for _ in 0..100 {
            if screen.poll() {
                return;
            }
            tokio::task::yield_now().await;
        }
    }
}
