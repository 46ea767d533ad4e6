//! Template model tests: ownership, the single-default rule, and the
//! inactive/default interaction.

mod common;

use propdesk::errors::AppError;
use propdesk::models::template::{self, NewTemplate, TemplateChanges};
use common::*;

fn new_template(name: &str, is_default: bool) -> NewTemplate {
    NewTemplate {
        name: name.to_string(),
        description: String::new(),
        content: format!("{name} content"),
        is_default,
        is_active: true,
    }
}

#[tokio::test]
async fn test_only_one_default_per_user() {
    let db = setup_test_db().await;
    let (ana, _) = create_test_user(db.pool(), "ana@example.com", "Ana").await;

    let first = template::create(db.pool(), ana, &new_template("First", true)).await.unwrap();
    let second = template::create(db.pool(), ana, &new_template("Second", true)).await.unwrap();

    let default = template::find_default(db.pool(), ana).await.unwrap().unwrap();
    assert_eq!(default.id, second);

    template::set_default(db.pool(), first, ana).await.unwrap();
    let list = template::list_for_user(db.pool(), ana).await.unwrap();
    assert_eq!(list.iter().filter(|t| t.is_default).count(), 1);
    assert_eq!(list[0].id, first, "default template is listed first");
}

#[tokio::test]
async fn test_templates_are_private() {
    let db = setup_test_db().await;
    let (ana, _) = create_test_user(db.pool(), "ana@example.com", "Ana").await;
    let (bob, _) = create_test_user(db.pool(), "bob@example.com", "Bob").await;

    let id = template::create(db.pool(), ana, &new_template("Mine", false)).await.unwrap();

    assert!(template::find(db.pool(), id, bob).await.unwrap().is_none());
    assert!(matches!(
        template::delete(db.pool(), id, bob).await,
        Err(AppError::NotFound)
    ));
    assert!(matches!(
        template::set_default(db.pool(), id, bob).await,
        Err(AppError::NotFound)
    ));
}

#[tokio::test]
async fn test_inactive_template_cannot_be_default() {
    let db = setup_test_db().await;
    let (ana, _) = create_test_user(db.pool(), "ana@example.com", "Ana").await;

    let err = template::create(
        db.pool(),
        ana,
        &NewTemplate {
            is_active: false,
            ..new_template("Hidden", true)
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let id = template::create(db.pool(), ana, &new_template("Main", true)).await.unwrap();
    let deactivated = template::update(
        db.pool(),
        id,
        ana,
        &TemplateChanges {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(!deactivated.is_active);
    assert!(!deactivated.is_default, "deactivating drops the default flag");
    assert!(template::find_default(db.pool(), ana).await.unwrap().is_none());

    assert!(matches!(
        template::set_default(db.pool(), id, ana).await,
        Err(AppError::Validation(_))
    ));
}

#[tokio::test]
async fn test_update_keeps_unset_fields() {
    let db = setup_test_db().await;
    let (ana, _) = create_test_user(db.pool(), "ana@example.com", "Ana").await;
    let id = template::create(db.pool(), ana, &new_template("Main", false)).await.unwrap();

    let updated = template::update(
        db.pool(),
        id,
        ana,
        &TemplateChanges {
            name: Some("  Renamed ".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.content, "Main content");
    assert!(updated.is_active);
}
