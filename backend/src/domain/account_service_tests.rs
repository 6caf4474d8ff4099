//! Tests for the account manager.

use std::sync::{Arc, Mutex};

use chrono::Duration;
use rstest::rstest;

use super::*;
use crate::domain::ports::{
    MailerError, MockIdentityRepository, MockMailer, MockPasswordHasher,
};
use crate::domain::{ErrorCode, PasswordHash, ProfileRef, StudentId, Username};
use crate::test_support::{MutableClock, admin, fixture_timestamp, principal};

fn identity(profile: Option<ProfileRef>) -> Identity {
    let role = match profile {
        Some(ProfileRef::Student(_)) => Role::Student,
        Some(ProfileRef::Faculty(_)) => Role::Faculty,
        None => Role::Admin,
    };
    Identity::new(
        NewIdentity {
            username: Username::parse("ada").expect("username"),
            email: EmailAddress::parse("ada@example.edu").expect("email"),
            role,
            profile,
        },
        PasswordHash::new("old-hash"),
        fixture_timestamp(),
    )
    .expect("identity")
}

fn service(
    repo: MockIdentityRepository,
    hasher: MockPasswordHasher,
    mailer: MockMailer,
) -> AccountManager<MockIdentityRepository> {
    AccountManager::new(
        Arc::new(repo),
        Arc::new(hasher),
        Arc::new(mailer),
        Arc::new(MutableClock::default()),
        AccountPolicy::default(),
    )
}

fn email(raw: &str) -> EmailAddress {
    EmailAddress::parse(raw).expect("email")
}

fn token_from_body(body: &str) -> String {
    body.lines()
        .map(str::trim)
        .find(|line| line.len() == 64 && line.chars().all(|c| c.is_ascii_hexdigit()))
        .expect("token line")
        .to_owned()
}

#[tokio::test]
async fn reset_request_for_unknown_email_is_silent() {
    let mut repo = MockIdentityRepository::new();
    repo.expect_find_by_email().return_once(|_| Ok(None));
    repo.expect_update().never();
    let mut mailer = MockMailer::new();
    mailer.expect_send().never();

    let service = service(repo, MockPasswordHasher::new(), mailer);
    service
        .request_password_reset(&email("nobody@example.edu"))
        .await
        .expect("silent success");
}

#[tokio::test]
async fn reset_request_stores_only_the_digest_of_the_mailed_token() {
    let stored: Arc<Mutex<Option<Identity>>> = Arc::new(Mutex::new(None));
    let mailed: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));

    let mut repo = MockIdentityRepository::new();
    repo.expect_find_by_email()
        .return_once(|_| Ok(Some(identity(None))));
    let sink = Arc::clone(&stored);
    repo.expect_update().times(1).returning(move |identity| {
        *sink.lock().expect("lock") = Some(identity.clone());
        Ok(())
    });
    let mut mailer = MockMailer::new();
    let outbox = Arc::clone(&mailed);
    mailer.expect_send().times(1).returning(move |mail| {
        *outbox.lock().expect("lock") = Some(mail.body.clone());
        Ok("<id@registrar>".to_owned())
    });

    let service = service(repo, MockPasswordHasher::new(), mailer);
    service
        .request_password_reset(&email("ada@example.edu"))
        .await
        .expect("reset requested");

    let body = mailed.lock().expect("lock").clone().expect("mail sent");
    let token = token_from_body(&body);
    let saved = stored.lock().expect("lock").clone().expect("identity saved");
    let reset = saved.password_reset.expect("reset stored");
    assert_eq!(reset.token_hash, hash_reset_token(&token));
    assert_ne!(reset.token_hash, token);
    assert_eq!(reset.expires_at, fixture_timestamp() + Duration::hours(1));
}

#[tokio::test]
async fn reset_request_surfaces_mail_failure() {
    let mut repo = MockIdentityRepository::new();
    repo.expect_find_by_email()
        .return_once(|_| Ok(Some(identity(None))));
    repo.expect_update().returning(|_| Ok(()));
    let mut mailer = MockMailer::new();
    mailer
        .expect_send()
        .return_once(|_| Err(MailerError::delivery("relay refused")));

    let service = service(repo, MockPasswordHasher::new(), mailer);
    let err = service
        .request_password_reset(&email("ada@example.edu"))
        .await
        .expect_err("mail failure");
    assert_eq!(err.code(), ErrorCode::DependencyFailure);
}

#[rstest]
#[case(Duration::minutes(30), true)]
#[case(Duration::minutes(-1), false)]
#[tokio::test]
async fn reset_password_honours_expiry(#[case] remaining: Duration, #[case] accepted: bool) {
    let mut pending = identity(None);
    pending.failed_login_attempts = 3;
    pending.begin_password_reset(
        hash_reset_token("secret-token"),
        fixture_timestamp() + remaining,
    );

    let mut repo = MockIdentityRepository::new();
    repo.expect_find_by_reset_token_hash()
        .return_once(move |_| Ok(Some(pending)));
    let saved: Arc<Mutex<Option<Identity>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&saved);
    repo.expect_update().returning(move |identity| {
        *sink.lock().expect("lock") = Some(identity.clone());
        Ok(())
    });
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_hash()
        .returning(|_| Ok(PasswordHash::new("new-hash")));

    let service = service(repo, hasher, MockMailer::new());
    let result = service
        .reset_password("secret-token", NewPassword::new("a-new-password").expect("password"))
        .await;

    if accepted {
        result.expect("reset accepted");
        let saved = saved.lock().expect("lock").clone().expect("saved");
        assert_eq!(saved.password_hash.as_str(), "new-hash");
        assert!(saved.password_reset.is_none());
        assert_eq!(saved.failed_login_attempts, 0);
    } else {
        let err = result.expect_err("expired token");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert!(saved.lock().expect("lock").is_none());
    }
}

#[tokio::test]
async fn change_password_requires_current_password() {
    let caller = admin();
    let current = identity(None);
    let mut repo = MockIdentityRepository::new();
    repo.expect_find_by_id()
        .return_once(move |_| Ok(Some(current)));
    repo.expect_update().never();
    let mut hasher = MockPasswordHasher::new();
    hasher.expect_verify().return_once(|_, _| Ok(false));

    let service = service(repo, hasher, MockMailer::new());
    let err = service
        .change_password(
            &caller,
            "not-it",
            NewPassword::new("another-password").expect("password"),
        )
        .await
        .expect_err("wrong current password");
    assert_eq!(err.code(), ErrorCode::Unauthorized);
}

#[tokio::test]
async fn admins_cannot_delete_themselves() {
    let caller = admin();
    let mut repo = MockIdentityRepository::new();
    repo.expect_delete().never();
    let service = service(repo, MockPasswordHasher::new(), MockMailer::new());

    let err = service
        .delete(&caller, caller.identity_id)
        .await
        .expect_err("self delete");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn linked_identities_cannot_be_deleted_directly() {
    let linked = identity(Some(ProfileRef::Student(StudentId::generate())));
    let id = linked.id;
    let mut repo = MockIdentityRepository::new();
    repo.expect_find_by_id()
        .return_once(move |_| Ok(Some(linked)));
    repo.expect_delete().never();
    let service = service(repo, MockPasswordHasher::new(), MockMailer::new());

    let err = service.delete(&admin(), id).await.expect_err("linked");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[case(Role::Student)]
#[case(Role::Faculty)]
#[tokio::test]
async fn identity_listing_is_admin_only(#[case] role: Role) {
    let mut repo = MockIdentityRepository::new();
    repo.expect_list().never();
    let service = service(repo, MockPasswordHasher::new(), MockMailer::new());

    let err = service
        .list(&principal(role, None), &IdentityQuery::default())
        .await
        .expect_err("forbidden");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn bootstrap_rejects_taken_username() {
    let mut repo = MockIdentityRepository::new();
    repo.expect_find_by_username()
        .return_once(|_| Ok(Some(identity(None))));
    repo.expect_insert().never();
    let service = service(repo, MockPasswordHasher::new(), MockMailer::new());

    let err = service
        .bootstrap_admin(AdminRegistration {
            username: Username::parse("ada").expect("username"),
            email: email("other@example.edu"),
            password: NewPassword::new("long-enough").expect("password"),
        })
        .await
        .expect_err("duplicate");
    assert_eq!(err.code(), ErrorCode::Duplicate);
}
