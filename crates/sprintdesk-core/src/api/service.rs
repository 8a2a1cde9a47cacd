use async_trait::async_trait;

use super::ApiError;
use crate::auth::LoginResponse;
use crate::models::{Member, Message, Project, ProjectMembership, RegisterRequest, Sprint, Task};

/// Token issuance endpoints.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError>;

    async fn refresh(&self, refresh_token: &str) -> Result<LoginResponse, ApiError>;

    async fn register(&self, request: &RegisterRequest) -> Result<Message, ApiError>;
}

/// Protected CRUD endpoints. A 401 from the server must come back as
/// `ApiError::Unauthorized`.
#[async_trait]
pub trait ProjectApi: Send + Sync {
    async fn get_projects(&self, token: &str) -> Result<Vec<Project>, ApiError>;

    async fn get_project(&self, token: &str, project_id: i64) -> Result<Project, ApiError>;

    async fn get_tasks(&self, token: &str, project_id: i64) -> Result<Vec<Task>, ApiError>;

    async fn get_sprints(&self, token: &str, project_id: i64) -> Result<Vec<Sprint>, ApiError>;

    async fn get_sprint(&self, token: &str, sprint_id: i64) -> Result<Sprint, ApiError>;

    async fn add_task_to_sprint(
        &self,
        token: &str,
        sprint_id: i64,
        task_id: i64,
    ) -> Result<Task, ApiError>;

    /// Projects the user is a member (not owner) of.
    async fn managed_projects(&self, token: &str) -> Result<Vec<ProjectMembership>, ApiError>;

    async fn project_members(&self, token: &str, project_id: i64)
        -> Result<Vec<Member>, ApiError>;

    async fn decide_membership(
        &self,
        token: &str,
        project_id: i64,
        accept: bool,
    ) -> Result<Message, ApiError>;

    async fn leave_project(&self, token: &str, project_id: i64) -> Result<Message, ApiError>;
}
