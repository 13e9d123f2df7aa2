use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{header, request::Parts, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const UNASSIGNED: &str = "Non assigné";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[default]
    #[serde(rename = "En attente")]
    Pending,
    #[serde(rename = "En cours")]
    InProgress,
    #[serde(rename = "Terminé")]
    Done,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "Basse")]
    Low,
    #[default]
    #[serde(rename = "Moyenne")]
    Medium,
    #[serde(rename = "Haute")]
    High,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "À faire")]
    Todo,
    #[serde(rename = "En cours")]
    InProgress,
    #[serde(rename = "En révision")]
    InReview,
    #[serde(rename = "Terminé")]
    Done,
}

impl TaskStatus {
    const BOARD: [TaskStatus; 4] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::InReview,
        TaskStatus::Done,
    ];

    fn label(self) -> &'static str {
        match self {
            TaskStatus::Todo => "À faire",
            TaskStatus::InProgress => "En cours",
            TaskStatus::InReview => "En révision",
            TaskStatus::Done => "Terminé",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub full_name: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Deserialize)]
pub struct RegisterUser {
    pub email: String,
    pub username: String,
    pub full_name: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub priority: Priority,
    pub due_date: Option<NaiveDateTime>,
    pub owner_id: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

#[derive(Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDateTime>,
}

#[derive(Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDateTime>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub is_completed: bool,
    pub due_date: Option<NaiveDateTime>,
    pub project_id: i64,
    pub assignee_id: Option<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub project_id: i64,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub is_completed: Option<bool>,
    pub assignee_id: Option<i64>,
    pub due_date: Option<NaiveDateTime>,
}

#[derive(Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub is_completed: Option<bool>,
    pub project_id: Option<i64>,
    pub assignee_id: Option<i64>,
    pub due_date: Option<NaiveDateTime>,
}

#[derive(Deserialize)]
pub struct TaskFilter {
    pub project_id: Option<i64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KanbanCard {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub assignee: String,
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProjectStats {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub progress: f64,
    pub team_members: usize,
}

struct Account {
    user: User,
    password: String,
}

#[derive(Default)]
pub struct Store {
    accounts: Vec<Account>,
    tokens: HashMap<String, i64>,
    projects: BTreeMap<i64, Project>,
    tasks: BTreeMap<i64, Task>,
    next_id: i64,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn owned_project(&self, id: i64, owner_id: i64) -> Result<&Project, ApiFailure> {
        self.projects
            .get(&id)
            .filter(|project| project.owner_id == owner_id)
            .ok_or(ApiFailure::not_found("Project not found"))
    }

    fn owns_task(&self, id: i64, owner_id: i64) -> bool {
        self.tasks
            .get(&id)
            .is_some_and(|task| self.owned_project(task.project_id, owner_id).is_ok())
    }

    fn with_tasks(&self, project: &Project) -> Project {
        let mut project = project.clone();
        project.tasks = self
            .tasks
            .values()
            .filter(|task| task.project_id == project.id)
            .cloned()
            .collect();
        project
    }

    fn full_name(&self, user_id: i64) -> Option<&str> {
        self.accounts
            .iter()
            .find(|account| account.user.id == user_id)
            .map(|account| account.user.full_name.as_str())
    }
}

pub type Db = Arc<RwLock<Store>>;

/// Error response in the `{"detail": ...}` shape.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    detail: &'static str,
}

impl ApiFailure {
    fn not_found(detail: &'static str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            detail,
        }
    }

    fn bad_request(detail: &'static str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail,
        }
    }

    fn unauthorized(detail: &'static str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            detail,
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        tracing::debug!(status = %self.status, detail = self.detail, "request rejected");
        let mut response = (self.status, Json(json!({ "detail": self.detail }))).into_response();
        if self.status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Id of the user behind the request's bearer token.
pub struct CurrentUser(pub i64);

impl FromRequestParts<Db> for CurrentUser {
    type Rejection = ApiFailure;

    async fn from_request_parts(parts: &mut Parts, db: &Db) -> Result<Self, Self::Rejection> {
        let rejected = || ApiFailure::unauthorized("Could not validate credentials");
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_string)
            .ok_or_else(rejected)?;
        let store = db.read().await;
        store.tokens.get(&token).copied().map(CurrentUser).ok_or_else(rejected)
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/auth/register", post(register))
        .route("/api/auth/token", post(login))
        .route("/api/auth/me", get(me))
        .route("/api/projects/", get(list_projects).post(create_project))
        .route(
            "/api/projects/{id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/api/projects/{id}/stats", get(project_stats))
        .route("/api/tasks/", get(list_tasks).post(create_task))
        .route("/api/tasks/{id}", get(get_task).put(update_task).delete(delete_task))
        .route("/api/tasks/kanban/{project_id}", get(kanban))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "ProjectPro API", "version": "1.0.0" }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

// --- auth ---

async fn register(
    State(db): State<Db>,
    Json(input): Json<RegisterUser>,
) -> Result<Json<User>, ApiFailure> {
    if !input.email.contains('@') {
        return Err(ApiFailure {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: "Invalid email address",
        });
    }
    let mut store = db.write().await;
    if store.accounts.iter().any(|a| a.user.username == input.username) {
        return Err(ApiFailure::bad_request("Username already registered"));
    }
    if store.accounts.iter().any(|a| a.user.email == input.email) {
        return Err(ApiFailure::bad_request("Email already registered"));
    }
    let created_at = now();
    let user = User {
        id: store.next_id(),
        email: input.email,
        username: input.username,
        full_name: input.full_name,
        is_active: true,
        created_at,
        updated_at: created_at,
    };
    tracing::info!(user_id = user.id, username = %user.username, "user registered");
    store.accounts.push(Account {
        user: user.clone(),
        password: input.password,
    });
    Ok(Json(user))
}

async fn login(State(db): State<Db>, Form(form): Form<LoginForm>) -> Result<Json<Token>, ApiFailure> {
    let mut store = db.write().await;
    let user_id = store
        .accounts
        .iter()
        .find(|a| a.user.username == form.username && a.password == form.password)
        .map(|a| a.user.id)
        .ok_or(ApiFailure::unauthorized("Incorrect username or password"))?;
    let access_token = Uuid::new_v4().to_string();
    store.tokens.insert(access_token.clone(), user_id);
    Ok(Json(Token {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

async fn me(State(db): State<Db>, CurrentUser(user_id): CurrentUser) -> Result<Json<User>, ApiFailure> {
    let store = db.read().await;
    store
        .accounts
        .iter()
        .find(|a| a.user.id == user_id)
        .map(|a| Json(a.user.clone()))
        .ok_or(ApiFailure::unauthorized("Could not validate credentials"))
}

// --- projects ---

async fn list_projects(State(db): State<Db>, CurrentUser(user_id): CurrentUser) -> Json<Vec<Project>> {
    let store = db.read().await;
    Json(
        store
            .projects
            .values()
            .filter(|p| p.owner_id == user_id)
            .map(|p| store.with_tasks(p))
            .collect(),
    )
}

async fn create_project(
    State(db): State<Db>,
    CurrentUser(user_id): CurrentUser,
    Json(input): Json<CreateProject>,
) -> Json<Project> {
    let mut store = db.write().await;
    let created_at = now();
    let project = Project {
        id: store.next_id(),
        name: input.name,
        description: input.description,
        status: input.status.unwrap_or_default(),
        priority: input.priority.unwrap_or_default(),
        due_date: input.due_date,
        owner_id: user_id,
        created_at,
        updated_at: created_at,
        tasks: Vec::new(),
    };
    tracing::info!(project_id = project.id, owner_id = user_id, "project created");
    store.projects.insert(project.id, project.clone());
    Json(project)
}

async fn get_project(
    State(db): State<Db>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Project>, ApiFailure> {
    let store = db.read().await;
    let project = store.owned_project(id, user_id)?;
    Ok(Json(store.with_tasks(project)))
}

async fn update_project(
    State(db): State<Db>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<i64>,
    Json(input): Json<UpdateProject>,
) -> Result<Json<Project>, ApiFailure> {
    let mut store = db.write().await;
    store.owned_project(id, user_id)?;
    let project = store
        .projects
        .get_mut(&id)
        .ok_or(ApiFailure::not_found("Project not found"))?;
    if let Some(name) = input.name {
        project.name = name;
    }
    if let Some(description) = input.description {
        project.description = Some(description);
    }
    if let Some(status) = input.status {
        project.status = status;
    }
    if let Some(priority) = input.priority {
        project.priority = priority;
    }
    if let Some(due_date) = input.due_date {
        project.due_date = Some(due_date);
    }
    project.updated_at = now();
    let project = project.clone();
    Ok(Json(store.with_tasks(&project)))
}

async fn delete_project(
    State(db): State<Db>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiFailure> {
    let mut store = db.write().await;
    store.owned_project(id, user_id)?;
    store.projects.remove(&id);
    store.tasks.retain(|_, task| task.project_id != id);
    tracing::info!(project_id = id, "project deleted");
    Ok(Json(json!({ "message": "Project deleted successfully" })))
}

async fn project_stats(
    State(db): State<Db>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ProjectStats>, ApiFailure> {
    let store = db.read().await;
    store.owned_project(id, user_id)?;
    let tasks: Vec<&Task> = store.tasks.values().filter(|t| t.project_id == id).collect();
    let total_tasks = tasks.len();
    let completed_tasks = tasks.iter().filter(|t| t.is_completed).count();
    let progress = if total_tasks > 0 {
        (completed_tasks as f64 / total_tasks as f64 * 10_000.0).round() / 100.0
    } else {
        0.0
    };
    Ok(Json(ProjectStats {
        total_tasks,
        completed_tasks,
        progress,
        team_members: 1,
    }))
}

// --- tasks ---

async fn list_tasks(
    State(db): State<Db>,
    CurrentUser(user_id): CurrentUser,
    Query(filter): Query<TaskFilter>,
) -> Json<Vec<Task>> {
    let store = db.read().await;
    Json(
        store
            .tasks
            .values()
            .filter(|t| store.owned_project(t.project_id, user_id).is_ok())
            .filter(|t| filter.project_id.is_none_or(|id| t.project_id == id))
            .cloned()
            .collect(),
    )
}

async fn create_task(
    State(db): State<Db>,
    CurrentUser(user_id): CurrentUser,
    Json(input): Json<CreateTask>,
) -> Result<Json<Task>, ApiFailure> {
    let mut store = db.write().await;
    store.owned_project(input.project_id, user_id)?;
    let created_at = now();
    let task = Task {
        id: store.next_id(),
        title: input.title,
        description: input.description,
        status: input.status.unwrap_or_default(),
        priority: input.priority.unwrap_or_default(),
        is_completed: input.is_completed.unwrap_or(false),
        due_date: input.due_date,
        project_id: input.project_id,
        assignee_id: input.assignee_id,
        created_at,
        updated_at: created_at,
    };
    tracing::info!(task_id = task.id, project_id = task.project_id, "task created");
    store.tasks.insert(task.id, task.clone());
    Ok(Json(task))
}

async fn get_task(
    State(db): State<Db>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Task>, ApiFailure> {
    let store = db.read().await;
    if !store.owns_task(id, user_id) {
        return Err(ApiFailure::not_found("Task not found"));
    }
    store
        .tasks
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or(ApiFailure::not_found("Task not found"))
}

async fn update_task(
    State(db): State<Db>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<i64>,
    Json(input): Json<UpdateTask>,
) -> Result<Json<Task>, ApiFailure> {
    let mut store = db.write().await;
    if !store.owns_task(id, user_id) {
        return Err(ApiFailure::not_found("Task not found"));
    }
    let task = store
        .tasks
        .get_mut(&id)
        .ok_or(ApiFailure::not_found("Task not found"))?;
    if let Some(title) = input.title {
        task.title = title;
    }
    if let Some(description) = input.description {
        task.description = Some(description);
    }
    if let Some(priority) = input.priority {
        task.priority = priority;
    }
    if let Some(is_completed) = input.is_completed {
        task.is_completed = is_completed;
    }
    if let Some(project_id) = input.project_id {
        task.project_id = project_id;
    }
    if let Some(assignee_id) = input.assignee_id {
        task.assignee_id = Some(assignee_id);
    }
    if let Some(due_date) = input.due_date {
        task.due_date = Some(due_date);
    }
    // The status column decides completion, overriding an explicit flag.
    if let Some(status) = input.status {
        task.status = status;
        task.is_completed = status == TaskStatus::Done;
    }
    task.updated_at = now();
    Ok(Json(task.clone()))
}

async fn delete_task(
    State(db): State<Db>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiFailure> {
    let mut store = db.write().await;
    if !store.owns_task(id, user_id) {
        return Err(ApiFailure::not_found("Task not found"));
    }
    store.tasks.remove(&id);
    tracing::info!(task_id = id, "task deleted");
    Ok(Json(json!({ "message": "Task deleted successfully" })))
}

async fn kanban(
    State(db): State<Db>,
    CurrentUser(user_id): CurrentUser,
    Path(project_id): Path<i64>,
) -> Result<Json<BTreeMap<&'static str, Vec<KanbanCard>>>, ApiFailure> {
    let store = db.read().await;
    store.owned_project(project_id, user_id)?;

    let mut columns: BTreeMap<&'static str, Vec<KanbanCard>> = TaskStatus::BOARD
        .iter()
        .map(|status| (status.label(), Vec::new()))
        .collect();
    for task in store.tasks.values().filter(|t| t.project_id == project_id) {
        let card = KanbanCard {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
            assignee: task
                .assignee_id
                .and_then(|id| store.full_name(id))
                .unwrap_or(UNASSIGNED)
                .to_string(),
            tags: Vec::new(),
        };
        if let Some(column) = columns.get_mut(task.status.label()) {
            column.push(card);
        }
    }
    Ok(Json(columns))
}
