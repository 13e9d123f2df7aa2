//! Client core for the ProjectPro project and task API.
//!
//! # Overview
//! Two layers. The resource layer turns each API operation into one HTTP
//! request and parses the answer into typed values or a uniform `ApiError`.
//! The session layer owns the bearer token and cached user profile in
//! durable storage and gates everything else.
//!
//! # Design
//! - `ApiClient` is stateless and sans-IO: `build_*` produces an
//!   `HttpRequest`, `parse_*` consumes an `HttpResponse`.
//! - `Transport` performs the round-trip; `UreqTransport` is the blocking
//!   network implementation. `ResourceClient` glues the two.
//! - `SessionManager` is an explicit context object over a `ResourceClient`
//!   and a `SessionStore`. `AuthGuard` is the boot-time state machine built
//!   on its primitives.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod guard;
pub mod http;
pub mod resource;
pub mod session;
pub mod storage;
pub mod transport;
pub mod types;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::{ApiError, SessionError, StorageError};
pub use guard::{AuthGuard, SessionState};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use resource::ResourceClient;
pub use session::SessionManager;
pub use storage::{FileStore, MemoryStore, NullStore, SessionStore};
pub use transport::{Transport, UreqTransport};
pub use types::{
    CreateProject, CreateTask, Credential, KanbanBoard, KanbanTask, Priority, Project,
    ProjectStats, ProjectStatus, RegisterUser, Task, TaskStatus, UpdateProject, UpdateTask,
    UserProfile,
};
