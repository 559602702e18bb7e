//! End-to-end flows against the in-memory adapters and a pinned clock.

use std::sync::Arc;
use std::time::Duration;

use auth::AliasCache;
use auth::FixedClock;
use auth::TokenCodec;
use records::access::AccessError;
use records::access::AuthenticationGate;
use records::access::RequestContext;
use records::access::TokenService;
use records::file::FileDraft;
use records::file::FileKind;
use records::file::FileService;
use records::outbound::InMemoryRepository;
use records::record::RecordError;
use records::record::VersionToken;
use records::record::VersionedRecord;
use records::subject::ProfileUpdate;
use records::subject::Registration;
use records::subject::Subject;
use records::subject::SubjectRole;
use records::subject::SubjectLookup;
use records::subject::SubjectService;
use records::subject::SubjectState;
use uuid::Uuid;

const SECRET: &[u8] = b"integration_secret_at_least_32_bytes!";
const TTL_WINDOW_MS: i64 = 60_000;

struct Harness {
    clock: Arc<FixedClock>,
    directory: Arc<InMemoryRepository<Subject>>,
    subjects: SubjectService<InMemoryRepository<Subject>, FixedClock>,
    tokens: Arc<TokenService<InMemoryRepository<Subject>, FixedClock>>,
    gate: AuthenticationGate<InMemoryRepository<Subject>, FixedClock>,
}

fn harness(start_millis: i64) -> Harness {
    let clock = Arc::new(FixedClock::at(start_millis));
    let repository = Arc::new(InMemoryRepository::<Subject>::new());

    let subjects = SubjectService::new(Arc::clone(&repository), Arc::clone(&clock));
    let tokens = Arc::new(TokenService::new(
        TokenCodec::new(SECRET),
        Arc::clone(&clock),
        Arc::clone(&repository),
        TTL_WINDOW_MS,
        AliasCache::new(Arc::clone(&clock), Duration::from_millis(5_000), 64),
    ));
    let gate = AuthenticationGate::new(Arc::clone(&tokens));

    Harness {
        clock,
        directory: repository,
        subjects,
        tokens,
        gate,
    }
}

fn alice() -> Registration {
    Registration {
        username: "alice".to_string(),
        email: "alice@example.com".to_string(),
        display_name: Some("Alice".to_string()),
        role: SubjectRole::Member,
        password: "Secret123".to_string(),
    }
}

fn profile_of(subject: &Subject) -> ProfileUpdate {
    ProfileUpdate {
        username: subject.username.as_str().to_string(),
        email: subject.email.as_str().to_string(),
        display_name: subject.display_name.clone(),
        role: subject.role,
        state: subject.state,
    }
}

#[tokio::test]
async fn version_round_trip_and_stale_write_rejection() {
    let h = harness(1_000);

    let created = h.subjects.register(alice()).await.unwrap();
    let t0 = created.version();
    assert_eq!(t0, VersionToken::from_millis(1_000));

    let fetched = h.subjects.get(created.id).await.unwrap().unwrap();
    assert_eq!(fetched.version(), t0);

    // Update with the observed version succeeds and advances the stamp.
    h.clock.set(2_000);
    let updated = h
        .subjects
        .update_profile(profile_of(&fetched), created.id, t0)
        .await
        .unwrap();
    assert!(updated.updated_at > created.updated_at);
    assert_eq!(updated.version(), VersionToken::from_millis(2_000));

    // Replaying the same update with the original version is a conflict.
    let replay = h
        .subjects
        .update_profile(profile_of(&fetched), created.id, t0)
        .await;
    match replay {
        Err(records::subject::SubjectError::Record(RecordError::VersionConflict {
            supplied,
            current,
        })) => {
            assert_eq!(supplied, t0);
            assert_eq!(current, VersionToken::from_millis(2_000));
        }
        other => panic!("expected version conflict, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn delete_requires_current_version() {
    let h = harness(1_000);
    let created = h.subjects.register(alice()).await.unwrap();

    let stale = h
        .subjects
        .delete(created.id, VersionToken::from_millis(999))
        .await;
    assert!(stale.is_err());

    h.subjects.delete(created.id, created.version()).await.unwrap();
    assert!(h.subjects.get(created.id).await.unwrap().is_none());
}

#[tokio::test]
async fn password_change_invalidates_outstanding_tokens() {
    let h = harness(100);

    let subject = h.subjects.register(alice()).await.unwrap();
    let old_token = h.tokens.issue(&subject).unwrap();
    assert!(h.tokens.parse_and_validate(&old_token).await.is_ok());

    // Password change at t=200 moves the fingerprint.
    h.clock.set(200);
    let changed = h
        .subjects
        .change_password(subject.id, subject.version(), "NewSecret456")
        .await
        .unwrap();
    assert_eq!(changed.fingerprint_millis(), 200);

    let result = h.tokens.parse_and_validate(&old_token).await;
    assert!(matches!(result, Err(AccessError::StaleCredentials)));

    // A token issued after the change validates.
    let fresh = h.tokens.issue(&changed).unwrap();
    assert!(h.tokens.parse_and_validate(&fresh).await.is_ok());
}

#[tokio::test]
async fn token_ttl_boundary() {
    let h = harness(10_000);
    let subject = h.subjects.register(alice()).await.unwrap();
    let token = h.tokens.issue(&subject).unwrap();

    h.clock.set(10_000 + TTL_WINDOW_MS);
    assert!(h.tokens.parse_and_validate(&token).await.is_ok());

    h.clock.advance(1);
    let result = h.tokens.parse_and_validate(&token).await;
    assert!(matches!(result, Err(AccessError::ExpiredToken)));
}

#[tokio::test]
async fn alias_mint_and_redeem() {
    let h = harness(1_000);
    let subject = h.subjects.register(alice()).await.unwrap();

    let alias = h.tokens.mint_alias(subject.id);
    let token = h.tokens.redeem_alias(alias).await.unwrap().expect("token");

    let principal = h.gate.authenticate(&token).await.unwrap();
    assert_eq!(principal.id(), subject.id);

    // Second redemption of the same alias falls through to no token.
    assert!(h.tokens.redeem_alias(alias).await.unwrap().is_none());

    // Expired alias falls through as well, without an error.
    let late = h.tokens.mint_alias(subject.id);
    h.clock.advance(5_001);
    assert!(h.tokens.redeem_alias(late).await.unwrap().is_none());

    // Unknown alias likewise.
    assert!(h.tokens.redeem_alias(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn reads_never_touch_timestamps() {
    let h = harness(1_000);
    let created = h.subjects.register(alice()).await.unwrap();

    h.clock.set(50_000);
    let _ = h.subjects.get(created.id).await.unwrap();
    let _ = h.subjects.list().await.unwrap();
    let _ = h.subjects.list_by_ids(&[created.id]).await.unwrap();
    assert_eq!(h.subjects.count().await.unwrap(), 1);

    let after = h.subjects.get(created.id).await.unwrap().unwrap();
    assert_eq!(after.version(), VersionToken::from_millis(1_000));
}

#[tokio::test]
async fn gate_enforces_lifecycle_state() {
    let h = harness(1_000);
    let subject = h.subjects.register(alice()).await.unwrap();

    // Block the account; a token issued before still validates at the token
    // layer but the gate refuses it.
    let mut profile = profile_of(&subject);
    profile.state = SubjectState::Blocked;
    h.clock.set(2_000);
    let blocked = h
        .subjects
        .update_profile(profile, subject.id, subject.version())
        .await
        .unwrap();

    let token = h.tokens.issue(&blocked).unwrap();
    let result = h.gate.authenticate(&token).await;
    assert!(matches!(result, Err(AccessError::AccountLocked)));
}

#[tokio::test]
async fn anonymous_and_authenticated_requests() {
    let h = harness(1_000);
    let subject = h.subjects.register(alice()).await.unwrap();
    let token = h.tokens.issue(&subject).unwrap();

    let mut ctx = RequestContext::new();
    h.gate.authenticate_request(&mut ctx, None).await.unwrap();
    assert!(ctx.is_anonymous());

    h.gate
        .authenticate_request(&mut ctx, Some(&token))
        .await
        .unwrap();
    let principal = ctx.principal().unwrap();
    assert_eq!(principal.id(), subject.id);

    // Refresh only works with a bound principal.
    assert!(h.tokens.refresh(ctx.principal()).is_ok());
    assert!(matches!(
        h.tokens.refresh(None),
        Err(AccessError::NoPrincipal)
    ));
}

#[tokio::test]
async fn login_by_username_issues_usable_token() {
    let h = harness(1_000);
    h.subjects.register(alice()).await.unwrap();

    let found = h
        .directory
        .find_by_name("alice")
        .await
        .unwrap()
        .expect("registered subject resolvable by name");
    assert!(h.subjects.verify_password(&found, "Secret123"));
    assert!(!h.subjects.verify_password(&found, "wrong"));
    assert!(h.directory.find_by_name("nobody").await.unwrap().is_none());

    let token = h.tokens.issue(&found).unwrap();
    let principal = h.gate.authenticate(&token).await.unwrap();
    assert_eq!(principal.id(), found.id);
    assert_eq!(principal.role(), SubjectRole::Member);
}

#[tokio::test]
async fn file_records_share_the_versioned_crud_surface() {
    let clock = Arc::new(FixedClock::at(1_000));
    let files: FileService<_, _> = FileService::new(
        FileKind,
        Arc::new(InMemoryRepository::new()),
        Arc::clone(&clock),
    );

    let owner = Uuid::new_v4();
    let created = files
        .create(FileDraft {
            owner,
            filename: "report.pdf".to_string(),
            media_type: "application/pdf".to_string(),
            size_bytes: 2_048,
            blob_ref: "blob/report-v1".to_string(),
        })
        .await
        .unwrap();
    let v0 = created.version();

    clock.set(2_000);
    let updated = files
        .update(
            FileDraft {
                owner,
                filename: "report.pdf".to_string(),
                media_type: "application/pdf".to_string(),
                size_bytes: 4_096,
                blob_ref: "blob/report-v2".to_string(),
            },
            created.id,
            v0,
        )
        .await
        .unwrap();
    assert_eq!(updated.version(), VersionToken::from_millis(2_000));
    assert_eq!(updated.created_at, created.created_at);

    // The stale version no longer deletes.
    assert!(files.delete(created.id, v0).await.is_err());
    files.delete(created.id, updated.version()).await.unwrap();
    assert_eq!(files.count().await.unwrap(), 0);
}

#[tokio::test]
async fn validation_reports_per_field_problems() {
    let clock = Arc::new(FixedClock::at(0));
    let files: FileService<_, _> =
        FileService::new(FileKind, Arc::new(InMemoryRepository::new()), clock);

    let result = files
        .create(FileDraft {
            owner: Uuid::new_v4(),
            filename: "../evil".to_string(),
            media_type: String::new(),
            size_bytes: 0,
            blob_ref: String::new(),
        })
        .await;

    match result {
        Err(RecordError::Validation(problems)) => {
            assert!(problems.contains_key("filename"));
            assert!(problems.contains_key("media_type"));
            assert!(problems.contains_key("blob_ref"));
        }
        other => panic!("expected validation error, got {:?}", other.err()),
    }
}
