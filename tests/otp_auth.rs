mod common;

use chat_service::error::AppError;
use chat_service::models::OtpRecord;
use chat_service::services::auth::{AuthService, TokenIssuer};
use chat_service::store::{OtpStore, UserStore};

use common::{test_app, FailingMailer, RecordingMailer};

fn code_from_html(html: &str) -> String {
    html.split("<h1>")
        .nth(1)
        .and_then(|rest| rest.split("</h1>").next())
        .expect("mail body carries the code")
        .to_string()
}

fn last_code(mailer: &RecordingMailer) -> String {
    let sent = mailer.sent.lock().unwrap();
    code_from_html(&sent.last().expect("at least one mail sent").2)
}

#[tokio::test]
async fn first_login_creates_account_and_issues_valid_token() {
    let app = test_app();
    let mailer = RecordingMailer::default();
    let tokens = TokenIssuer::new("test-secret", 7);

    AuthService::request_otp(&app.store, &mailer, "new@test.local", 5)
        .await
        .unwrap();

    {
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "new@test.local");
        let code = code_from_html(&sent[0].2);
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    let code = last_code(&mailer);
    let login = AuthService::verify_otp(&app.store, &tokens, "new@test.local", &code)
        .await
        .unwrap();
    assert!(login.is_new_user);
    assert_eq!(login.user.email.as_deref(), Some("new@test.local"));
    assert_eq!(tokens.verify(&login.token).unwrap(), login.user.id);

    let stored = app
        .store
        .users
        .find_by_email("new@test.local")
        .await
        .unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn returning_user_is_not_flagged_new() {
    let app = test_app();
    let mailer = RecordingMailer::default();
    let tokens = TokenIssuer::new("test-secret", 7);

    AuthService::request_otp(&app.store, &mailer, "repeat@test.local", 5)
        .await
        .unwrap();
    let first = AuthService::verify_otp(&app.store, &tokens, "repeat@test.local", &last_code(&mailer))
        .await
        .unwrap();
    assert!(first.is_new_user);

    AuthService::request_otp(&app.store, &mailer, "repeat@test.local", 5)
        .await
        .unwrap();
    let second =
        AuthService::verify_otp(&app.store, &tokens, "repeat@test.local", &last_code(&mailer))
            .await
            .unwrap();
    assert!(!second.is_new_user);
    assert_eq!(second.user.id, first.user.id);
}

#[tokio::test]
async fn new_request_invalidates_prior_code() {
    let app = test_app();
    let mailer = RecordingMailer::default();
    let tokens = TokenIssuer::new("test-secret", 7);

    AuthService::request_otp(&app.store, &mailer, "a@test.local", 5)
        .await
        .unwrap();
    let stale = last_code(&mailer);

    AuthService::request_otp(&app.store, &mailer, "a@test.local", 5)
        .await
        .unwrap();
    let fresh = last_code(&mailer);

    if stale != fresh {
        let result = AuthService::verify_otp(&app.store, &tokens, "a@test.local", &stale).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
    AuthService::verify_otp(&app.store, &tokens, "a@test.local", &fresh)
        .await
        .unwrap();
}

#[tokio::test]
async fn code_is_consumed_on_successful_login() {
    let app = test_app();
    let mailer = RecordingMailer::default();
    let tokens = TokenIssuer::new("test-secret", 7);

    AuthService::request_otp(&app.store, &mailer, "once@test.local", 5)
        .await
        .unwrap();
    let code = last_code(&mailer);

    AuthService::verify_otp(&app.store, &tokens, "once@test.local", &code)
        .await
        .unwrap();
    let replay = AuthService::verify_otp(&app.store, &tokens, "once@test.local", &code).await;
    assert!(matches!(replay, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn expired_code_is_rejected_without_creating_an_account() {
    let app = test_app();
    let tokens = TokenIssuer::new("test-secret", 7);

    app.store
        .otps
        .replace_for_email(OtpRecord::new("late@test.local".into(), "123456".into(), -1))
        .await
        .unwrap();

    let result = AuthService::verify_otp(&app.store, &tokens, "late@test.local", "123456").await;
    match result {
        Err(AppError::Validation(msg)) => assert!(msg.contains("expired")),
        other => panic!("expected expiry rejection, got {other:?}"),
    }
    assert!(app
        .store
        .users
        .find_by_email("late@test.local")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn wrong_code_is_rejected() {
    let app = test_app();
    let mailer = RecordingMailer::default();
    let tokens = TokenIssuer::new("test-secret", 7);

    AuthService::request_otp(&app.store, &mailer, "b@test.local", 5)
        .await
        .unwrap();

    let result = AuthService::verify_otp(&app.store, &tokens, "b@test.local", "000000").await;
    // One-in-a-million collision with the real code aside, this must fail
    if last_code(&mailer) != "000000" {
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}

#[tokio::test]
async fn email_is_trimmed_and_lowercased() {
    let app = test_app();
    let mailer = RecordingMailer::default();
    let tokens = TokenIssuer::new("test-secret", 7);

    AuthService::request_otp(&app.store, &mailer, "  Mixed@Test.Local ", 5)
        .await
        .unwrap();
    assert_eq!(mailer.sent.lock().unwrap()[0].0, "mixed@test.local");

    let login =
        AuthService::verify_otp(&app.store, &tokens, "MIXED@test.local", &last_code(&mailer))
            .await
            .unwrap();
    assert_eq!(login.user.email.as_deref(), Some("mixed@test.local"));
}

#[tokio::test]
async fn blank_email_is_a_validation_error() {
    let app = test_app();
    let mailer = RecordingMailer::default();

    let result = AuthService::request_otp(&app.store, &mailer, "   ", 5).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(mailer.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn undeliverable_mail_fails_the_request() {
    let app = test_app();

    let result = AuthService::request_otp(&app.store, &FailingMailer, "c@test.local", 5).await;
    assert!(matches!(result, Err(AppError::ExternalService(_))));
}
