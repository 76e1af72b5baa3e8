//! Role × page × action grid.

use crate::error::AppError;
use crate::model::Role;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::View, Action::Create, Action::Edit, Action::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
        }
    }
}

/// Back-office page keys.
pub mod pages {
    pub const DASHBOARD: &str = "dashboard";
    pub const PROPERTIES: &str = "properties";
    pub const MESSAGES: &str = "messages";
    pub const USERS: &str = "users";
    pub const DOMAINS: &str = "domains";
    pub const SETTINGS: &str = "settings";
    pub const PERMISSIONS: &str = "permissions";

    pub const ALL: [&str; 7] = [DASHBOARD, PROPERTIES, MESSAGES, USERS, DOMAINS, SETTINGS, PERMISSIONS];
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermission {
    pub role: Role,
    pub page_key: String,
    #[serde(default)]
    pub can_view: bool,
    #[serde(default)]
    pub can_create: bool,
    #[serde(default)]
    pub can_edit: bool,
    #[serde(default)]
    pub can_delete: bool,
}

impl RolePermission {
    pub fn new(role: Role, page_key: &str, actions: &[Action]) -> Self {
        RolePermission {
            role,
            page_key: page_key.to_string(),
            can_view: actions.contains(&Action::View),
            can_create: actions.contains(&Action::Create),
            can_edit: actions.contains(&Action::Edit),
            can_delete: actions.contains(&Action::Delete),
        }
    }

    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::View => self.can_view,
            Action::Create => self.can_create,
            Action::Edit => self.can_edit,
            Action::Delete => self.can_delete,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let key = self.page_key.trim();
        if key.is_empty() || key.len() > 64 {
            return Err(AppError::Validation("page_key must be 1 to 64 characters".into()));
        }
        Ok(())
    }
}

/// Grid seeded into an empty database. Admins never consult it.
pub fn default_grid() -> Vec<RolePermission> {
    let mut rows = Vec::new();
    for role in [Role::Owner, Role::Admin] {
        for page in pages::ALL {
            rows.push(RolePermission::new(role, page, &Action::ALL));
        }
    }
    rows.push(RolePermission::new(Role::Agent, pages::DASHBOARD, &[Action::View]));
    rows.push(RolePermission::new(
        Role::Agent,
        pages::PROPERTIES,
        &[Action::View, Action::Create, Action::Edit],
    ));
    rows.push(RolePermission::new(Role::Agent, pages::MESSAGES, &[Action::View, Action::Edit]));
    rows
}
