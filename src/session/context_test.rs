use super::*;
use crate::storage::{FileStore, MemoryStore};

fn user(username: &str, role: Option<&str>) -> User {
    User {
        id: 1,
        username: username.to_owned(),
        email: Some(format!("{username}@example.com")),
        display_name: None,
        created_date: None,
        points: Some(0),
        role: role.map(str::to_owned),
        extra: serde_json::Map::new(),
    }
}

fn context() -> (Arc<MemoryStore>, SessionContext) {
    let storage = Arc::new(MemoryStore::new());
    let ctx = SessionContext::new(storage.clone());
    (storage, ctx)
}

// =============================================================================
// Session invariant
// =============================================================================

#[test]
fn session_needs_both_user_and_token() {
    let only_token = Session { user: None, token: Some("t".to_owned()) };
    let only_user = Session { user: Some(user("a", None)), token: None };
    let both = Session { user: Some(user("a", None)), token: Some("t".to_owned()) };

    assert!(!Session::default().is_authenticated());
    assert!(!only_token.is_authenticated());
    assert!(!only_user.is_authenticated());
    assert!(both.is_authenticated());
}

#[test]
fn session_admin_follows_user_role() {
    let admin = Session { user: Some(user("root", Some("ADMIN"))), token: Some("t".to_owned()) };
    let member = Session { user: Some(user("bob", Some("USER"))), token: Some("t".to_owned()) };
    assert!(admin.is_admin());
    assert!(!member.is_admin());
    assert!(!Session::default().is_admin());
}

// =============================================================================
// restore
// =============================================================================

#[tokio::test]
async fn restore_with_both_entries_authenticates() {
    let (storage, ctx) = context();
    storage.set(TOKEN_KEY, "tok").unwrap();
    storage.set(USER_KEY, &serde_json::to_string(&user("alice", None)).unwrap()).unwrap();

    assert!(ctx.restore().await.unwrap());
    let snapshot = ctx.snapshot().await;
    assert!(snapshot.is_authenticated());
    assert_eq!(snapshot.token(), Some("tok"));
    assert_eq!(snapshot.user().map(|u| u.username.as_str()), Some("alice"));
}

#[tokio::test]
async fn restore_with_token_only_stays_anonymous() {
    let (storage, ctx) = context();
    storage.set(TOKEN_KEY, "tok").unwrap();

    assert!(!ctx.restore().await.unwrap());
    assert!(!ctx.is_authenticated().await);
    assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("tok"));
}

#[tokio::test]
async fn restore_with_corrupt_user_clears_everything() {
    let (storage, ctx) = context();
    storage.set(TOKEN_KEY, "tok").unwrap();
    storage.set(USER_KEY, "{not json").unwrap();
    let mut events = ctx.subscribe();

    assert!(!ctx.restore().await.unwrap());
    assert!(!ctx.is_authenticated().await);
    assert!(storage.is_empty());
    assert_eq!(events.try_recv().unwrap(), SessionEvent::Cleared { reason: ClearReason::CorruptStorage });
}

#[tokio::test]
async fn restore_with_corrupt_file_resets_it() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{\"token\": \"tok").unwrap();
    let storage = Arc::new(FileStore::new(&path));
    let ctx = SessionContext::new(storage.clone());
    let mut events = ctx.subscribe();

    assert!(!ctx.restore().await.unwrap());
    assert!(!ctx.is_authenticated().await);
    assert_eq!(events.try_recv().unwrap(), SessionEvent::Cleared { reason: ClearReason::CorruptStorage });
    assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);

    ctx.establish("tok".to_owned(), user("alice", None)).await.unwrap();
    assert_eq!(ctx.stored_token().unwrap().as_deref(), Some("tok"));
}

#[tokio::test]
async fn clear_over_corrupt_file_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "not json").unwrap();
    let storage = Arc::new(FileStore::new(&path));
    let ctx = SessionContext::new(storage.clone());

    assert!(ctx.clear(ClearReason::Logout).await.unwrap());
    assert_eq!(storage.get(USER_KEY).unwrap(), None);
    assert!(!ctx.clear(ClearReason::Logout).await.unwrap());
}

// =============================================================================
// establish / replace_user / clear
// =============================================================================

#[tokio::test]
async fn establish_persists_and_publishes() {
    let (storage, ctx) = context();
    let mut events = ctx.subscribe();

    ctx.establish("tok".to_owned(), user("alice", None)).await.unwrap();

    assert!(ctx.is_authenticated().await);
    assert_eq!(ctx.stored_token().unwrap().as_deref(), Some("tok"));
    let stored: User = serde_json::from_str(&storage.get(USER_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(stored.username, "alice");
    assert!(matches!(events.try_recv().unwrap(), SessionEvent::Authenticated { .. }));
}

#[tokio::test]
async fn replace_user_without_token_keeps_storage_empty() {
    let (storage, ctx) = context();

    ctx.replace_user(user("alice", None)).await.unwrap();

    assert!(storage.is_empty());
    assert!(!ctx.is_authenticated().await);
    assert_eq!(ctx.user().await.map(|u| u.username), Some("alice".to_owned()));
}

#[tokio::test]
async fn replace_user_with_token_rewrites_storage() {
    let (storage, ctx) = context();
    ctx.establish("tok".to_owned(), user("alice", None)).await.unwrap();

    ctx.replace_user(user("alice", Some("ADMIN"))).await.unwrap();

    let stored: User = serde_json::from_str(&storage.get(USER_KEY).unwrap().unwrap()).unwrap();
    assert!(stored.is_admin());
    assert!(ctx.snapshot().await.is_admin());
}

#[tokio::test]
async fn clear_is_reported_once() {
    let (storage, ctx) = context();
    ctx.establish("tok".to_owned(), user("alice", None)).await.unwrap();
    let mut events = ctx.subscribe();

    assert!(ctx.clear(ClearReason::Logout).await.unwrap());
    assert!(!ctx.clear(ClearReason::Logout).await.unwrap());

    assert!(storage.is_empty());
    assert_eq!(events.try_recv().unwrap(), SessionEvent::Cleared { reason: ClearReason::Logout });
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn clear_removes_stray_storage_entries() {
    let (storage, ctx) = context();
    storage.set(TOKEN_KEY, "orphan").unwrap();

    assert!(ctx.clear(ClearReason::Unauthorized).await.unwrap());
    assert!(storage.is_empty());
}

#[test]
fn stored_token_ignores_empty_value() {
    let (storage, ctx) = context();
    storage.set(TOKEN_KEY, "").unwrap();
    assert_eq!(ctx.stored_token().unwrap(), None);
}
