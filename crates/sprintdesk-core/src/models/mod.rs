//! Data models for the project-management backend.
//!
//! - `Project`, `Tag`: projects and their labels
//! - `Task`, `Priority`: project tasks
//! - `Sprint`: time-boxed task groups within a project
//! - `ProjectMembership`, `Member`: shared-project management
//! - `RegisterRequest`: account sign-up payload

pub mod project;
pub mod sprint;
pub mod task;
pub mod user;

pub use project::{Member, MembershipStatus, Message, Project, ProjectMembership, Tag};
pub use sprint::Sprint;
pub use task::{Priority, Task};
pub use user::RegisterRequest;
