//! HTTP client for the project-management REST API.
//!
//! This module provides the `ApiClient` struct, which implements `AuthApi`
//! and `ProjectApi` over reqwest.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::{ApiError, AuthApi, ProjectApi};
use crate::auth::LoginResponse;
use crate::models::{Member, Message, Project, ProjectMembership, RegisterRequest, Sprint, Task};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// API client for the project-management backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check if response is successful, returning a typed error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Send a request, backing off and retrying while the server rate limits.
    async fn send<T, F>(&self, url: &str, build: F) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = build().send().await?;

            if response.status().as_u16() == 429 {
                retries += 1;
                if retries > MAX_RATE_LIMIT_RETRIES {
                    return Err(ApiError::RateLimited);
                }
                warn!(url = url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms *= 2; // Exponential backoff
                continue;
            }

            let response = Self::check_response(response).await?;
            return response.json().await.map_err(|e| {
                ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
            });
        }
    }

    /// Authenticated request without a body
    async fn call<T: DeserializeOwned>(&self, method: Method, path: &str, token: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(%method, url = %url, "API request");
        self.send(&url, || self.client.request(method.clone(), &url).bearer_auth(token))
            .await
    }

    /// Unauthenticated JSON POST
    async fn post_public<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "API request");
        self.send(&url, || self.client.post(&url).json(body)).await
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let url = self.url("/auth/login");
        self.send(&url, || {
            self.client
                .post(&url)
                .form(&[("username", username), ("password", password)])
        })
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<LoginResponse, ApiError> {
        self.post_public("/auth/refresh", &serde_json::json!({ "refresh_token": refresh_token }))
            .await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<Message, ApiError> {
        self.post_public("/auth/register", request).await
    }
}

#[async_trait]
impl ProjectApi for ApiClient {
    async fn get_projects(&self, token: &str) -> Result<Vec<Project>, ApiError> {
        self.call(Method::GET, "/project/", token).await
    }

    async fn get_project(&self, token: &str, project_id: i64) -> Result<Project, ApiError> {
        self.call(Method::GET, &format!("/project/{}/", project_id), token).await
    }

    async fn get_tasks(&self, token: &str, project_id: i64) -> Result<Vec<Task>, ApiError> {
        self.call(Method::GET, &format!("/project/{}/task/", project_id), token).await
    }

    async fn get_sprints(&self, token: &str, project_id: i64) -> Result<Vec<Sprint>, ApiError> {
        self.call(Method::GET, &format!("/project/{}/sprint/", project_id), token).await
    }

    async fn get_sprint(&self, token: &str, sprint_id: i64) -> Result<Sprint, ApiError> {
        self.call(Method::GET, &format!("/sprint/{}/", sprint_id), token).await
    }

    async fn add_task_to_sprint(&self, token: &str, sprint_id: i64, task_id: i64) -> Result<Task, ApiError> {
        let path = format!("/sprint/{}/assign-task/?task_id={}", sprint_id, task_id);
        self.call(Method::POST, &path, token).await
    }

    async fn managed_projects(&self, token: &str) -> Result<Vec<ProjectMembership>, ApiError> {
        self.call(Method::GET, "/project-management/projects", token).await
    }

    async fn project_members(&self, token: &str, project_id: i64) -> Result<Vec<Member>, ApiError> {
        self.call(Method::GET, &format!("/project-management/{}/members", project_id), token)
            .await
    }

    async fn decide_membership(&self, token: &str, project_id: i64, accept: bool) -> Result<Message, ApiError> {
        let path = format!("/project-management/{}/decision?decision={}", project_id, accept);
        self.call(Method::POST, &path, token).await
    }

    async fn leave_project(&self, token: &str, project_id: i64) -> Result<Message, ApiError> {
        self.call(Method::POST, &format!("/project-management/{}/leave", project_id), token)
            .await
    }
}
