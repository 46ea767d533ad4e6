use serde::Serialize;

/// User profile as returned by the API. Never carries the password hash.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// New user data for creation. `password_hash` is already hashed.
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub company: Option<String>,
    pub password_hash: String,
}

/// Partial profile update; `None` leaves the column unchanged.
#[derive(Debug, Default, Clone)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
}
