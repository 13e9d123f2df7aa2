//! One method per API operation: build, execute, parse.
//!
//! `ResourceClient` adds nothing between the halves of `ApiClient` except the
//! round-trip itself. Calls are independent; concurrent callers are not
//! ordered or deduplicated, and a call that has started runs to completion.

use tracing::instrument;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::transport::Transport;
use crate::types::{
    CreateProject, CreateTask, Credential, KanbanBoard, Project, ProjectStats, RegisterUser, Task,
    UpdateProject, UpdateTask, UserProfile,
};

#[derive(Debug, Clone)]
pub struct ResourceClient<T> {
    api: ApiClient,
    transport: T,
}

impl<T: Transport> ResourceClient<T> {
    pub fn new(base_url: &str, transport: T) -> Self {
        Self {
            api: ApiClient::new(base_url),
            transport,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[instrument(skip(self, password))]
    pub fn login(&self, username: &str, password: &str) -> Result<Credential, ApiError> {
        let response = self.transport.execute(self.api.build_login(username, password))?;
        self.api.parse_login(response)
    }

    #[instrument(skip_all, fields(username = %input.username))]
    pub fn register(&self, input: &RegisterUser) -> Result<UserProfile, ApiError> {
        let response = self.transport.execute(self.api.build_register(input)?)?;
        self.api.parse_register(response)
    }

    #[instrument(skip_all)]
    pub fn current_user(&self, credential: &Credential) -> Result<UserProfile, ApiError> {
        let response = self.transport.execute(self.api.build_current_user(credential))?;
        self.api.parse_current_user(response)
    }

    #[instrument(skip_all)]
    pub fn list_projects(&self, credential: &Credential) -> Result<Vec<Project>, ApiError> {
        let response = self.transport.execute(self.api.build_list_projects(credential))?;
        self.api.parse_list_projects(response)
    }

    #[instrument(skip(self, credential))]
    pub fn get_project(&self, id: i64, credential: &Credential) -> Result<Project, ApiError> {
        let response = self.transport.execute(self.api.build_get_project(id, credential))?;
        self.api.parse_get_project(response)
    }

    #[instrument(skip_all, fields(name = %input.name))]
    pub fn create_project(
        &self,
        input: &CreateProject,
        credential: &Credential,
    ) -> Result<Project, ApiError> {
        let request = self.api.build_create_project(input, credential)?;
        self.api.parse_create_project(self.transport.execute(request)?)
    }

    #[instrument(skip(self, input, credential))]
    pub fn update_project(
        &self,
        id: i64,
        input: &UpdateProject,
        credential: &Credential,
    ) -> Result<Project, ApiError> {
        let request = self.api.build_update_project(id, input, credential)?;
        self.api.parse_update_project(self.transport.execute(request)?)
    }

    #[instrument(skip(self, credential))]
    pub fn delete_project(&self, id: i64, credential: &Credential) -> Result<(), ApiError> {
        let response = self.transport.execute(self.api.build_delete_project(id, credential))?;
        self.api.parse_delete_project(response)
    }

    #[instrument(skip(self, credential))]
    pub fn project_stats(&self, id: i64, credential: &Credential) -> Result<ProjectStats, ApiError> {
        let response = self.transport.execute(self.api.build_project_stats(id, credential))?;
        self.api.parse_project_stats(response)
    }

    #[instrument(skip(self, credential))]
    pub fn list_tasks(
        &self,
        credential: &Credential,
        project_id: Option<i64>,
    ) -> Result<Vec<Task>, ApiError> {
        let response = self
            .transport
            .execute(self.api.build_list_tasks(credential, project_id))?;
        self.api.parse_list_tasks(response)
    }

    #[instrument(skip(self, credential))]
    pub fn get_task(&self, id: i64, credential: &Credential) -> Result<Task, ApiError> {
        let response = self.transport.execute(self.api.build_get_task(id, credential))?;
        self.api.parse_get_task(response)
    }

    #[instrument(skip_all, fields(project_id = input.project_id))]
    pub fn create_task(&self, input: &CreateTask, credential: &Credential) -> Result<Task, ApiError> {
        let request = self.api.build_create_task(input, credential)?;
        self.api.parse_create_task(self.transport.execute(request)?)
    }

    #[instrument(skip(self, input, credential))]
    pub fn update_task(
        &self,
        id: i64,
        input: &UpdateTask,
        credential: &Credential,
    ) -> Result<Task, ApiError> {
        let request = self.api.build_update_task(id, input, credential)?;
        self.api.parse_update_task(self.transport.execute(request)?)
    }

    #[instrument(skip(self, credential))]
    pub fn delete_task(&self, id: i64, credential: &Credential) -> Result<(), ApiError> {
        let response = self.transport.execute(self.api.build_delete_task(id, credential))?;
        self.api.parse_delete_task(response)
    }

    #[instrument(skip(self, credential))]
    pub fn kanban_tasks(
        &self,
        project_id: i64,
        credential: &Credential,
    ) -> Result<KanbanBoard, ApiError> {
        let response = self
            .transport
            .execute(self.api.build_kanban_tasks(project_id, credential))?;
        self.api.parse_kanban_tasks(response)
    }
}
