//! Account tests: password hashing, user creation, profile and password
//! updates, workspace membership.

mod common;

use propdesk::auth::password;
use propdesk::errors::AppError;
use propdesk::models::user::{self, ProfileChanges};
use propdesk::models::workspace::{self, WorkspaceRole};
use common::*;

#[test]
fn test_hash_and_verify_password() {
    let hash = password::hash_password(TEST_PASSWORD).expect("Failed to hash password");
    assert!(hash.starts_with("$argon2"));
    assert!(password::verify_password(TEST_PASSWORD, &hash));
    assert!(!password::verify_password("wrong-password", &hash));
    assert!(!password::verify_password(TEST_PASSWORD, "not-a-hash"));
}

#[tokio::test]
async fn test_create_user_normalizes_email() {
    let db = setup_test_db().await;
    let (id, _) = create_test_user(db.pool(), "  Ana@Example.COM ", "Ana").await;

    let found = user::find_by_email(db.pool(), "ana@example.com")
        .await
        .unwrap()
        .expect("user not found");
    assert_eq!(found.id, id);
    assert_eq!(found.email, "ana@example.com");
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() {
    let db = setup_test_db().await;
    create_test_user(db.pool(), "ana@example.com", "Ana").await;

    let err = user::create(
        db.pool(),
        &user::NewUser {
            email: "ANA@example.com".to_string(),
            name: "Other Ana".to_string(),
            company: None,
            password_hash: "x".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_credentials_lookup() {
    let db = setup_test_db().await;
    let (id, _) = create_test_user(db.pool(), "ana@example.com", "Ana").await;

    let (found_id, hash) = user::find_credentials(db.pool(), "ANA@example.com")
        .await
        .unwrap()
        .expect("credentials not found");
    assert_eq!(found_id, id);
    assert!(password::verify_password(TEST_PASSWORD, &hash));

    assert!(user::find_credentials(db.pool(), "nobody@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_profile_partial_and_clearing() {
    let db = setup_test_db().await;
    let (id, _) = create_test_user(db.pool(), "ana@example.com", "Ana").await;

    let updated = user::update_profile(
        db.pool(),
        id,
        &ProfileChanges {
            company: Some("Acme".to_string()),
            phone: Some("+47 555 1234".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.name, "Ana");
    assert_eq!(updated.company.as_deref(), Some("Acme"));

    let cleared = user::update_profile(
        db.pool(),
        id,
        &ProfileChanges {
            phone: Some("  ".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(cleared.phone, None);
    assert_eq!(cleared.company.as_deref(), Some("Acme"));
}

#[tokio::test]
async fn test_update_profile_rejects_taken_email() {
    let db = setup_test_db().await;
    let (ana, _) = create_test_user(db.pool(), "ana@example.com", "Ana").await;
    create_test_user(db.pool(), "bob@example.com", "Bob").await;

    let err = user::update_profile(
        db.pool(),
        ana,
        &ProfileChanges {
            email: Some("Bob@example.com".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Keeping your own email is fine
    let same = user::update_profile(
        db.pool(),
        ana,
        &ProfileChanges {
            email: Some("ana@example.com".to_string()),
            ..Default::default()
        },
    )
    .await;
    assert!(same.is_ok());
}

#[tokio::test]
async fn test_update_password() {
    let db = setup_test_db().await;
    let (id, _) = create_test_user(db.pool(), "ana@example.com", "Ana").await;

    let new_hash = password::hash_password("another-password").unwrap();
    user::update_password(db.pool(), id, &new_hash).await.unwrap();

    let stored = user::find_password_hash(db.pool(), id).await.unwrap().unwrap();
    assert!(password::verify_password("another-password", &stored));
    assert!(!password::verify_password(TEST_PASSWORD, &stored));
}

#[tokio::test]
async fn test_personal_workspace_membership() {
    let db = setup_test_db().await;
    let (id, ws) = create_test_user(db.pool(), "ana@example.com", "Ana").await;

    let membership = workspace::first_membership(db.pool(), id).await.unwrap().unwrap();
    assert_eq!(membership.workspace_id, ws);
    assert_eq!(membership.workspace_name, "Ana's workspace");
    assert_eq!(membership.role, WorkspaceRole::Owner);
}

#[tokio::test]
async fn test_add_member_and_role_rules() {
    let db = setup_test_db().await;
    let (ana, ws) = create_test_user(db.pool(), "ana@example.com", "Ana").await;
    let (bob, _) = create_test_user(db.pool(), "bob@example.com", "Bob").await;

    workspace::add_member(db.pool(), ws, bob, WorkspaceRole::Member).await.unwrap();
    // Re-adding changes the role
    workspace::add_member(db.pool(), ws, bob, WorkspaceRole::Admin).await.unwrap();

    let members = workspace::members(db.pool(), ws).await.unwrap();
    assert_eq!(members.len(), 2);
    let bob_row = members.iter().find(|m| m.user_id == bob).unwrap();
    assert_eq!(bob_row.role, WorkspaceRole::Admin);

    let owner_err = workspace::add_member(db.pool(), ws, bob, WorkspaceRole::Owner).await.unwrap_err();
    assert!(matches!(owner_err, AppError::Validation(_)));

    let demote_owner = workspace::add_member(db.pool(), ws, ana, WorkspaceRole::Member).await.unwrap_err();
    assert!(matches!(demote_owner, AppError::Conflict(_)));

    let bob_workspaces = workspace::list_for_user(db.pool(), bob).await.unwrap();
    assert_eq!(bob_workspaces.len(), 2);
}

#[tokio::test]
async fn test_create_with_workspace_is_all_or_nothing() {
    let db = setup_test_db().await;
    let new_user = |email: &str| user::NewUser {
        email: email.to_string(),
        name: "Ana".to_string(),
        company: None,
        password_hash: password::hash_password(TEST_PASSWORD).unwrap(),
    };

    let (id, ws) = user::create_with_workspace(db.pool(), &new_user("ana@example.com"), "Ana's workspace")
        .await
        .unwrap();
    let membership = workspace::first_membership(db.pool(), id).await.unwrap().unwrap();
    assert_eq!(membership.workspace_id, ws);
    assert_eq!(membership.role, WorkspaceRole::Owner);

    // A failing workspace insert must not leave the user behind
    sqlx::query(
        "CREATE TRIGGER no_workspaces BEFORE INSERT ON workspaces \
         BEGIN SELECT RAISE(ABORT, 'workspaces disabled'); END",
    )
    .execute(db.pool())
    .await
    .unwrap();
    let err = user::create_with_workspace(db.pool(), &new_user("bob@example.com"), "Bob's workspace")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Db(_)));
    assert!(user::find_by_email(db.pool(), "bob@example.com").await.unwrap().is_none());

    let dup = user::create_with_workspace(db.pool(), &new_user("ANA@example.com"), "Again")
        .await
        .unwrap_err();
    assert!(matches!(dup, AppError::Conflict(_)));
}
