mod common;

use chat_service::error::AppError;
use chat_service::services::users::UserService;

use common::{seed_user, test_app, RecordingBlobs};

#[tokio::test]
async fn complete_profile_requires_name_and_phone() {
    let app = test_app();
    let blobs = RecordingBlobs::new();
    let user = seed_user(&app.store, "fresh").await;

    let result =
        UserService::complete_profile(&app.store, &blobs, user.id, "  ".into(), "123".into(), None)
            .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let result =
        UserService::complete_profile(&app.store, &blobs, user.id, "Ann".into(), "".into(), None)
            .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let user = UserService::complete_profile(
        &app.store,
        &blobs,
        user.id,
        " Ann ".into(),
        " 555-0101 ".into(),
        Some(vec![1, 2]),
    )
    .await
    .unwrap();
    assert_eq!(user.name, "Ann");
    assert_eq!(user.phone.as_deref(), Some("555-0101"));
    assert!(user
        .profile_pic
        .as_deref()
        .unwrap()
        .contains("chat-app-profiles"));
}

#[tokio::test]
async fn failed_avatar_upload_leaves_profile_untouched() {
    let app = test_app();
    let blobs = RecordingBlobs::failing_uploads();
    let user = seed_user(&app.store, "fresh").await;

    let result = UserService::complete_profile(
        &app.store,
        &blobs,
        user.id,
        "Ann".into(),
        "555".into(),
        Some(vec![1]),
    )
    .await;
    assert!(matches!(result, Err(AppError::ExternalService(_))));

    let stored = UserService::get_profile(&app.store, user.id).await.unwrap();
    assert_eq!(stored.name, "fresh");
    assert!(stored.profile_pic.is_none());
}

#[tokio::test]
async fn update_profile_replaces_avatar_and_absorbs_delete_failure() {
    let app = test_app();
    let blobs = RecordingBlobs::new();
    let user = seed_user(&app.store, "ann").await;

    let user = UserService::update_profile(
        &app.store,
        &blobs,
        user.id,
        None,
        None,
        Some("hello there".into()),
        Some(vec![1]),
    )
    .await
    .unwrap();
    assert_eq!(user.about, "hello there");
    let first_pic = user.profile_pic.clone().unwrap();

    let failing = RecordingBlobs::failing_deletes();
    let user = UserService::update_profile(
        &app.store,
        &failing,
        user.id,
        None,
        None,
        None,
        Some(vec![2]),
    )
    .await
    .unwrap();
    assert_ne!(user.profile_pic.as_deref(), Some(first_pic.as_str()));
}

#[tokio::test]
async fn update_profile_ignores_blank_fields() {
    let app = test_app();
    let blobs = RecordingBlobs::new();
    let user = seed_user(&app.store, "ann").await;

    let updated = UserService::update_profile(
        &app.store,
        &blobs,
        user.id,
        Some("  ".into()),
        None,
        None,
        None,
    )
    .await
    .unwrap();
    assert_eq!(updated.name, "ann");
}

#[tokio::test]
async fn list_users_excludes_the_caller() {
    let app = test_app();
    let me = seed_user(&app.store, "me").await;
    seed_user(&app.store, "other1").await;
    seed_user(&app.store, "other2").await;

    let listed = UserService::list_users(&app.store, me.id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|u| u.id != me.id));
}

#[tokio::test]
async fn push_token_is_trimmed_and_stored() {
    let app = test_app();
    let user = seed_user(&app.store, "mobile").await;

    let result = UserService::save_push_token(&app.store, user.id, "  ".into()).await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    UserService::save_push_token(&app.store, user.id, " expo-token ".into())
        .await
        .unwrap();
    let stored = UserService::get_profile(&app.store, user.id).await.unwrap();
    assert_eq!(stored.push_token.as_deref(), Some("expo-token"));
}
