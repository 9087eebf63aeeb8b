//! Users, databases, and the alter-permission check.
//!
//! The SQL editor only needs one question answered: may the current user
//! change the database a tab is connected to?

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// Workspace-wide role of a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WorkspaceRole {
    Owner,
    Dba,
    #[default]
    Developer,
}

/// Role of a member inside a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProjectRole {
    Owner,
    Developer,
    Querier,
    Exporter,
    Viewer,
}

impl ProjectRole {
    /// Returns true if the role may change databases in the project.
    pub fn can_change_database(&self) -> bool {
        matches!(self, Self::Owner | Self::Developer)
    }
}

/// The signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub email: String,
    pub name: String,
    pub workspace_role: WorkspaceRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMember {
    pub email: String,
    pub role: ProjectRole,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub resource_id: String,
    pub members: Vec<ProjectMember>,
}

impl Project {
    /// Returns the role the given user holds in this project.
    pub fn role_of(&self, email: &str) -> Option<ProjectRole> {
        self.members
            .iter()
            .find(|m| m.email.eq_ignore_ascii_case(email))
            .map(|m| m.role)
    }
}

/// A database known to the editor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    pub uid: String,
    pub name: String,
    pub instance: String,
    pub project: Project,
}

/// Decides whether a user may alter a database.
pub trait PermissionChecker: Send + Sync {
    fn is_alterable(&self, database: &Database, user: &User) -> bool;
}

/// Role-based check: workspace owners and DBAs may alter anything, other
/// users need a changing role in the database's project.
#[derive(Debug, Clone, Copy, Default)]
pub struct RolePermissionChecker;

impl PermissionChecker for RolePermissionChecker {
    fn is_alterable(&self, database: &Database, user: &User) -> bool {
        if matches!(user.workspace_role, WorkspaceRole::Owner | WorkspaceRole::Dba) {
            return true;
        }

        database
            .project
            .role_of(&user.email)
            .is_some_and(|role| role.can_change_database())
    }
}

/// In-memory lookup of databases by uid.
#[derive(Debug, Default)]
pub struct DatabaseStore {
    databases: RwLock<HashMap<String, Database>>,
}

impl DatabaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a database.
    pub fn upsert(&self, database: Database) {
        if let Ok(mut databases) = self.databases.write() {
            databases.insert(database.uid.clone(), database);
        }
    }

    /// Looks up a database by uid.
    pub fn get_by_uid(&self, uid: &str) -> Option<Database> {
        self.databases.read().ok()?.get(uid).cloned()
    }
}
