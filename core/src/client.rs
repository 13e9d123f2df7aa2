//! Stateless HTTP request builder and response parser for the ProjectPro API.
//!
//! # Design
//! `ApiClient` holds only a `base_url` and carries no mutable state between
//! calls. Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! `ResourceClient` glues the two halves to a `Transport`.
//!
//! Any 2xx counts as success. On failure the body is ignored and the error
//! carries a fixed per-operation message plus the status code.

use serde::de::DeserializeOwned;
use serde::Serialize;
use url::form_urlencoded;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, AUTHORIZATION, CONTENT_TYPE, FORM, JSON};
use crate::types::{
    CreateProject, CreateTask, Credential, KanbanBoard, Project, ProjectStats, RegisterUser, Task,
    TokenResponse, UpdateProject, UpdateTask, UserProfile,
};

/// Which error class a failed status maps to.
#[derive(Debug, Clone, Copy)]
enum Rejection {
    Auth,
    Validation,
    Request,
}

/// Synchronous, stateless client for the ProjectPro API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -- auth ---------------------------------------------------------------

    pub fn build_login(&self, username: &str, password: &str) -> HttpRequest {
        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("username", username)
            .append_pair("password", password)
            .finish();
        HttpRequest {
            method: HttpMethod::Post,
            path: self.url("/api/auth/token"),
            headers: vec![(CONTENT_TYPE.to_string(), FORM.to_string())],
            body: Some(body),
        }
    }

    pub fn build_register(&self, input: &RegisterUser) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/api/auth/register", None, input)
    }

    pub fn build_current_user(&self, credential: &Credential) -> HttpRequest {
        self.request(HttpMethod::Get, "/api/auth/me", credential)
    }

    pub fn parse_login(&self, response: HttpResponse) -> Result<Credential, ApiError> {
        check_status(&response, Rejection::Auth, "login failed")?;
        let token: TokenResponse = parse_body(&response, "token response")?;
        if token.access_token.is_empty() {
            return Err(ApiError::Validation(
                "token response carried an empty access_token".to_string(),
            ));
        }
        if !token.token_type.eq_ignore_ascii_case("bearer") {
            tracing::warn!(token_type = %token.token_type, "unexpected token type, using as bearer");
        }
        Ok(Credential::new(token.access_token))
    }

    pub fn parse_register(&self, response: HttpResponse) -> Result<UserProfile, ApiError> {
        check_status(&response, Rejection::Validation, "registration rejected")?;
        parse_body(&response, "user profile")
    }

    pub fn parse_current_user(&self, response: HttpResponse) -> Result<UserProfile, ApiError> {
        check_status(&response, Rejection::Auth, "token rejected")?;
        parse_body(&response, "user profile")
    }

    // -- projects -----------------------------------------------------------

    pub fn build_list_projects(&self, credential: &Credential) -> HttpRequest {
        self.request(HttpMethod::Get, "/api/projects/", credential)
    }

    pub fn build_get_project(&self, id: i64, credential: &Credential) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/api/projects/{id}"), credential)
    }

    pub fn build_create_project(
        &self,
        input: &CreateProject,
        credential: &Credential,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/api/projects/", Some(credential), input)
    }

    pub fn build_update_project(
        &self,
        id: i64,
        input: &UpdateProject,
        credential: &Credential,
    ) -> Result<HttpRequest, ApiError> {
        let path = format!("/api/projects/{id}");
        self.json_request(HttpMethod::Put, &path, Some(credential), input)
    }

    pub fn build_delete_project(&self, id: i64, credential: &Credential) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/api/projects/{id}"), credential)
    }

    pub fn build_project_stats(&self, id: i64, credential: &Credential) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/api/projects/{id}/stats"), credential)
    }

    pub fn parse_list_projects(&self, response: HttpResponse) -> Result<Vec<Project>, ApiError> {
        check_status(&response, Rejection::Request, "failed to load projects")?;
        parse_body(&response, "project list")
    }

    pub fn parse_get_project(&self, response: HttpResponse) -> Result<Project, ApiError> {
        check_status(&response, Rejection::Request, "failed to load project")?;
        parse_body(&response, "project")
    }

    pub fn parse_create_project(&self, response: HttpResponse) -> Result<Project, ApiError> {
        check_status(&response, Rejection::Request, "failed to create project")?;
        parse_body(&response, "project")
    }

    pub fn parse_update_project(&self, response: HttpResponse) -> Result<Project, ApiError> {
        check_status(&response, Rejection::Request, "failed to update project")?;
        parse_body(&response, "project")
    }

    pub fn parse_delete_project(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, Rejection::Request, "failed to delete project")
    }

    pub fn parse_project_stats(&self, response: HttpResponse) -> Result<ProjectStats, ApiError> {
        check_status(&response, Rejection::Request, "failed to load project statistics")?;
        parse_body(&response, "project statistics")
    }

    // -- tasks --------------------------------------------------------------

    pub fn build_list_tasks(&self, credential: &Credential, project_id: Option<i64>) -> HttpRequest {
        let path = match project_id {
            Some(project_id) => format!("/api/tasks/?project_id={project_id}"),
            None => "/api/tasks/".to_string(),
        };
        self.request(HttpMethod::Get, &path, credential)
    }

    pub fn build_get_task(&self, id: i64, credential: &Credential) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/api/tasks/{id}"), credential)
    }

    pub fn build_create_task(
        &self,
        input: &CreateTask,
        credential: &Credential,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/api/tasks/", Some(credential), input)
    }

    pub fn build_update_task(
        &self,
        id: i64,
        input: &UpdateTask,
        credential: &Credential,
    ) -> Result<HttpRequest, ApiError> {
        let path = format!("/api/tasks/{id}");
        self.json_request(HttpMethod::Put, &path, Some(credential), input)
    }

    pub fn build_delete_task(&self, id: i64, credential: &Credential) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/api/tasks/{id}"), credential)
    }

    pub fn build_kanban_tasks(&self, project_id: i64, credential: &Credential) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            &format!("/api/tasks/kanban/{project_id}"),
            credential,
        )
    }

    pub fn parse_list_tasks(&self, response: HttpResponse) -> Result<Vec<Task>, ApiError> {
        check_status(&response, Rejection::Request, "failed to load tasks")?;
        parse_body(&response, "task list")
    }

    pub fn parse_get_task(&self, response: HttpResponse) -> Result<Task, ApiError> {
        check_status(&response, Rejection::Request, "failed to load task")?;
        parse_body(&response, "task")
    }

    pub fn parse_create_task(&self, response: HttpResponse) -> Result<Task, ApiError> {
        check_status(&response, Rejection::Request, "failed to create task")?;
        parse_body(&response, "task")
    }

    pub fn parse_update_task(&self, response: HttpResponse) -> Result<Task, ApiError> {
        check_status(&response, Rejection::Request, "failed to update task")?;
        parse_body(&response, "task")
    }

    pub fn parse_delete_task(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, Rejection::Request, "failed to delete task")
    }

    pub fn parse_kanban_tasks(&self, response: HttpResponse) -> Result<KanbanBoard, ApiError> {
        check_status(&response, Rejection::Request, "failed to load kanban board")?;
        parse_body(&response, "kanban board")
    }

    // -- helpers ------------------------------------------------------------

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn request(&self, method: HttpMethod, path: &str, credential: &Credential) -> HttpRequest {
        HttpRequest {
            method,
            path: self.url(path),
            headers: vec![(AUTHORIZATION.to_string(), credential.bearer())],
            body: None,
        }
    }

    fn json_request<T: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        credential: Option<&Credential>,
        input: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input)
            .map_err(|e| ApiError::Validation(format!("could not encode request body: {e}")))?;
        let mut headers = vec![(CONTENT_TYPE.to_string(), JSON.to_string())];
        if let Some(credential) = credential {
            headers.push((AUTHORIZATION.to_string(), credential.bearer()));
        }
        Ok(HttpRequest {
            method,
            path: self.url(path),
            headers,
            body: Some(body),
        })
    }
}

/// Map a non-2xx status to the error class of the operation.
fn check_status(response: &HttpResponse, rejection: Rejection, context: &str) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    let message = format!("{context} (HTTP {})", response.status);
    Err(match rejection {
        Rejection::Auth => ApiError::Auth(message),
        Rejection::Validation => ApiError::Validation(message),
        Rejection::Request => ApiError::request(response.status, message),
    })
}

fn parse_body<T: DeserializeOwned>(response: &HttpResponse, what: &str) -> Result<T, ApiError> {
    serde_json::from_str(&response.body)
        .map_err(|e| ApiError::Validation(format!("malformed {what}: {e}")))
}
