use serde::Serialize;

/// Reusable proposal content owned by a user.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Template {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: String,
    pub content: String,
    pub is_default: bool,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

pub struct NewTemplate {
    pub name: String,
    pub description: String,
    pub content: String,
    pub is_default: bool,
    pub is_active: bool,
}

#[derive(Debug, Default)]
pub struct TemplateChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub is_default: Option<bool>,
    pub is_active: Option<bool>,
}
