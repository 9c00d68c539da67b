//! Behavior-driven tests for the watchlist reconciler.
//!
//! These tests drive the reconciler against an in-memory store whose answers
//! are scripted per call, and assert on what the user would see in the list.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stockwatch_core::{
    Ack, Endpoint, Identity, IdentityResolver, LoadOutcome, Market, Resolution, SessionState,
    StoreError, Symbol, Timestamp, TrackedSymbol, WatchlistError, WatchlistReconciler,
    WatchlistStore,
};
use tokio::sync::oneshot;

// =============================================================================
// Scripted store
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    List(Option<String>),
    Create(String, String, Market),
    Delete(String, String),
}

struct Scripted<T> {
    result: Result<T, StoreError>,
    gate: Option<oneshot::Receiver<()>>,
}

#[derive(Default)]
struct ScriptedStore {
    calls: Mutex<Vec<Call>>,
    lists: Mutex<VecDeque<Scripted<Vec<TrackedSymbol>>>>,
    creates: Mutex<VecDeque<Scripted<TrackedSymbol>>>,
    deletes: Mutex<VecDeque<Scripted<Ack>>>,
}

impl ScriptedStore {
    fn script_list(&self, result: Result<Vec<TrackedSymbol>, StoreError>) {
        self.lists
            .lock()
            .unwrap()
            .push_back(Scripted { result, gate: None });
    }

    fn script_list_gated(&self, result: Result<Vec<TrackedSymbol>, StoreError>) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        self.lists.lock().unwrap().push_back(Scripted {
            result,
            gate: Some(gate),
        });
        release
    }

    fn script_create(&self, result: Result<TrackedSymbol, StoreError>) {
        self.creates
            .lock()
            .unwrap()
            .push_back(Scripted { result, gate: None });
    }

    fn script_create_gated(&self, result: Result<TrackedSymbol, StoreError>) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        self.creates.lock().unwrap().push_back(Scripted {
            result,
            gate: Some(gate),
        });
        release
    }

    fn script_delete(&self, result: Result<Ack, StoreError>) {
        self.deletes
            .lock()
            .unwrap()
            .push_back(Scripted { result, gate: None });
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    async fn wait_for_calls(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.calls.lock().unwrap().len() < count {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("store should receive the expected calls");
    }
}

async fn answer<T>(
    queue: &Mutex<VecDeque<Scripted<T>>>,
    endpoint: Endpoint,
) -> Result<T, StoreError> {
    let scripted = queue.lock().unwrap().pop_front();
    let Some(scripted) = scripted else {
        return Err(StoreError::transport(endpoint, "no scripted answer"));
    };
    if let Some(gate) = scripted.gate {
        let _ = gate.await;
    }
    scripted.result
}

type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

impl WatchlistStore for ScriptedStore {
    fn list<'a>(&'a self, identity: Option<&'a Identity>) -> StoreFuture<'a, Vec<TrackedSymbol>> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::List(identity.map(|id| id.to_string())));
        Box::pin(answer(&self.lists, Endpoint::ListSymbols))
    }

    fn create<'a>(
        &'a self,
        identity: &'a Identity,
        symbol: &'a Symbol,
        market: Market,
    ) -> StoreFuture<'a, TrackedSymbol> {
        self.calls.lock().unwrap().push(Call::Create(
            identity.to_string(),
            symbol.to_string(),
            market,
        ));
        Box::pin(answer(&self.creates, Endpoint::AddSymbol))
    }

    fn delete<'a>(&'a self, identity: &'a Identity, symbol: &'a Symbol) -> StoreFuture<'a, Ack> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Delete(identity.to_string(), symbol.to_string()));
        Box::pin(answer(&self.deletes, Endpoint::RemoveSymbol))
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn user(id: &str) -> Resolution {
    Resolution::User(Identity::parse(id).expect("valid identity"))
}

fn entry(symbol: &str, market: Market, name: &str) -> TrackedSymbol {
    TrackedSymbol::new(
        Symbol::parse(symbol).expect("valid symbol"),
        market,
        Some(String::from(name)),
        Timestamp::parse("2024-05-01T09:30:00Z").expect("valid timestamp"),
    )
}

fn rejected(endpoint: Endpoint, body: &str) -> StoreError {
    StoreError::status(endpoint, 400, body)
}

async fn signed_in(
    id: &str,
    initial: Vec<TrackedSymbol>,
) -> (Arc<ScriptedStore>, Arc<WatchlistReconciler<Arc<ScriptedStore>>>) {
    let store = Arc::new(ScriptedStore::default());
    store.script_list(Ok(initial));
    let reconciler = Arc::new(WatchlistReconciler::new(store.clone()));
    reconciler.settle(user(id)).await.expect("initial load");
    (store, reconciler)
}

// =============================================================================
// Loading
// =============================================================================

#[tokio::test]
async fn when_user_settles_watchlist_is_loaded_in_store_order() {
    // Given: The store holds two symbols for the user, newest last
    let listed = vec![
        entry("MSFT", Market::Us, "Microsoft"),
        entry("00700", Market::Hk, "Tencent"),
    ];

    // When: The identity settles
    let (store, reconciler) = signed_in("ada@example.com", listed.clone()).await;

    // Then: The list matches the store exactly and the identity was sent
    assert_eq!(reconciler.entries(), listed);
    assert_eq!(store.calls(), vec![Call::List(Some(String::from("ada@example.com")))]);
}

#[tokio::test]
async fn when_load_fails_previous_list_is_kept_and_error_reported() {
    // Given: A loaded watchlist
    let listed = vec![entry("AAPL", Market::Us, "Apple Inc.")];
    let (store, reconciler) = signed_in("ada@example.com", listed.clone()).await;

    // When: A refresh fails
    store.script_list(Err(StoreError::status(Endpoint::ListSymbols, 500, "database locked")));
    let error = reconciler.load().await.expect_err("refresh should fail");

    // Then: Nothing was merged or dropped
    assert_eq!(error.to_string(), "database locked");
    assert_eq!(reconciler.entries(), listed);
}

#[tokio::test]
async fn when_user_signs_out_list_is_cleared_without_network() {
    // Given: A signed-in user with symbols
    let (store, reconciler) =
        signed_in("ada@example.com", vec![entry("AAPL", Market::Us, "Apple Inc.")]).await;
    let calls_before = store.calls().len();

    // When: The session becomes anonymous
    let outcome = reconciler.settle(Resolution::Guest).await.expect("guest settle");

    // Then: The list is empty and no call was made
    assert_eq!(outcome, LoadOutcome::Cleared);
    assert!(reconciler.is_empty());
    assert!(reconciler.snapshot().owner().is_none());
    assert_eq!(store.calls().len(), calls_before);
}

#[tokio::test]
async fn when_session_is_pending_nothing_is_cleared_or_loaded() {
    // Given: A loaded watchlist
    let listed = vec![entry("AAPL", Market::Us, "Apple Inc.")];
    let (store, reconciler) = signed_in("ada@example.com", listed.clone()).await;

    // When: The session goes back to resolving
    let outcome = reconciler.settle(Resolution::Pending).await.expect("pending settle");

    // Then: Entries stay and no call is issued
    assert_eq!(outcome, LoadOutcome::Deferred);
    assert_eq!(reconciler.entries(), listed);
    assert_eq!(store.calls().len(), 1);
}

#[tokio::test]
async fn when_load_for_previous_user_arrives_late_it_is_discarded() {
    // Given: A load for user A that will answer only when released
    let store = Arc::new(ScriptedStore::default());
    let release_a = store.script_list_gated(Ok(vec![entry("AAPL", Market::Us, "Apple Inc.")]));
    let b_list = vec![entry("TSLA", Market::Us, "Tesla")];
    store.script_list(Ok(b_list.clone()));
    let reconciler = Arc::new(WatchlistReconciler::new(store.clone()));

    let for_a = {
        let reconciler = reconciler.clone();
        tokio::spawn(async move { reconciler.settle(user("a@example.com")).await })
    };
    store.wait_for_calls(1).await;

    // When: The identity switches to B and B's load completes first
    let outcome = reconciler.settle(user("b@example.com")).await.expect("load for B");
    assert_eq!(outcome, LoadOutcome::Loaded { count: 1 });
    release_a.send(()).expect("A's load still waiting");
    let late = for_a.await.expect("task joined").expect("stale is not an error");

    // Then: A's result was dropped and B's list is intact
    assert_eq!(late, LoadOutcome::Stale);
    assert_eq!(reconciler.entries(), b_list);
    assert_eq!(
        reconciler.snapshot().owner().map(Identity::as_str),
        Some("b@example.com")
    );
}

#[tokio::test]
async fn when_switching_users_list_never_shows_previous_users_symbols() {
    // Given: User A with a symbol
    let (store, reconciler) =
        signed_in("a@example.com", vec![entry("AAPL", Market::Us, "Apple Inc.")]).await;

    // When: User B signs in but B's load fails
    store.script_list(Err(StoreError::transport(Endpoint::ListSymbols, "connection refused")));
    let result = reconciler.settle(user("b@example.com")).await;

    // Then: The list belongs to B and is empty rather than A's
    assert!(matches!(result, Err(WatchlistError::Remote(_))));
    assert!(reconciler.is_empty());
    assert_eq!(
        reconciler.snapshot().owner().map(Identity::as_str),
        Some("b@example.com")
    );
}

#[tokio::test]
async fn when_resolver_publishes_changes_watchlist_follows() {
    // Given: A resolver feeding the reconciler
    let store = Arc::new(ScriptedStore::default());
    store.script_list(Ok(vec![entry("AAPL", Market::Us, "Apple Inc.")]));
    let resolver = IdentityResolver::new();
    let reconciler = Arc::new(WatchlistReconciler::new(store.clone()));
    let follower = {
        let reconciler = reconciler.clone();
        let receiver = resolver.subscribe();
        tokio::spawn(async move { reconciler.follow(receiver).await })
    };

    // When: The session signs in
    resolver.update(&SessionState::Authenticated {
        email: None,
        name: Some(String::from("octocat")),
    });
    store.wait_for_calls(1).await;
    tokio::time::timeout(Duration::from_secs(2), async {
        while reconciler.is_empty() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("list should load");

    // Then: The display name scoped the load
    assert_eq!(store.calls(), vec![Call::List(Some(String::from("octocat")))]);

    drop(resolver);
    follower.await.expect("follower ends when resolver is dropped");
}

// =============================================================================
// Adding
// =============================================================================

#[tokio::test]
async fn when_add_succeeds_placeholder_is_replaced_by_store_entry() {
    // Given: An empty watchlist and a store that resolves the name
    let (store, reconciler) = signed_in("ada@example.com", Vec::new()).await;
    let confirmed = entry("AAPL", Market::Us, "Apple Inc.");
    store.script_create(Ok(confirmed.clone()));

    // When: The user adds lower-case "aapl"
    let added = reconciler.add("aapl", Market::Us).await.expect("add succeeds");

    // Then: Exactly one AAPL row with the resolved name
    assert_eq!(added, confirmed);
    assert_eq!(reconciler.entries(), vec![confirmed]);
    assert_eq!(
        store.calls().last(),
        Some(&Call::Create(
            String::from("ada@example.com"),
            String::from("AAPL"),
            Market::Us
        ))
    );
}

#[tokio::test]
async fn while_add_is_in_flight_placeholder_is_visible_first() {
    // Given: A store that holds the create open
    let existing = entry("MSFT", Market::Us, "Microsoft");
    let (store, reconciler) = signed_in("ada@example.com", vec![existing.clone()]).await;
    let release = store.script_create_gated(Ok(entry("0700", Market::Hk, "Tencent")));

    // When: The user adds "  0700 " on HK
    let pending = {
        let reconciler = reconciler.clone();
        tokio::spawn(async move { reconciler.add("  0700 ", Market::Hk).await })
    };
    store.wait_for_calls(2).await;

    // Then: The trimmed placeholder is prepended before the store answers
    let optimistic = reconciler.entries();
    assert_eq!(optimistic.len(), 2);
    assert_eq!(optimistic[0].symbol.as_str(), "0700");
    assert!(optimistic[0].is_placeholder());
    assert_eq!(optimistic[1], existing);

    // And: A second add of the same listing is refused while pending
    let duplicate = reconciler.add("0700", Market::Hk).await;
    assert!(matches!(duplicate, Err(WatchlistError::AlreadyPending { .. })));

    release.send(()).expect("create still waiting");
    pending.await.expect("task joined").expect("add succeeds");
    assert_eq!(reconciler.entries()[0].name.as_deref(), Some("Tencent"));
}

#[tokio::test]
async fn when_add_fails_list_returns_to_pre_add_state() {
    // Given: A watchlist with one symbol
    let (store, reconciler) =
        signed_in("ada@example.com", vec![entry("MSFT", Market::Us, "Microsoft")]).await;
    let before = reconciler.snapshot();
    store.script_create(Err(rejected(Endpoint::AddSymbol, "{\"detail\":\"unknown symbol\"}")));

    // When: Adding 0700 on HK fails
    let error = reconciler.add("0700", Market::Hk).await.expect_err("add fails");

    // Then: No placeholder remains and the body is surfaced verbatim
    assert_eq!(reconciler.snapshot(), before);
    assert_eq!(error.to_string(), "{\"detail\":\"unknown symbol\"}");
}

#[tokio::test]
async fn when_listing_is_already_tracked_add_is_refused_locally() {
    // Given: Tencent is tracked under the store's padded code
    let (store, reconciler) =
        signed_in("ada@example.com", vec![entry("00700", Market::Hk, "Tencent")]).await;

    // When: The user adds "700"
    let result = reconciler.add("700", Market::Hk).await;

    // Then: Refused without a create call and the list is unchanged
    assert!(matches!(result, Err(WatchlistError::AlreadyTracked { .. })));
    assert_eq!(store.calls().len(), 1);
    assert_eq!(reconciler.len(), 1);
}

#[tokio::test]
async fn when_symbol_is_blank_add_is_a_validation_error() {
    let (store, reconciler) = signed_in("ada@example.com", Vec::new()).await;

    let result = reconciler.add("   ", Market::Us).await;

    assert!(matches!(result, Err(WatchlistError::Validation(_))));
    assert_eq!(store.calls().len(), 1);
    assert!(reconciler.is_empty());
}

#[tokio::test]
async fn when_guest_mutates_sign_in_is_required_and_store_untouched() {
    // Given: A guest session
    let store = Arc::new(ScriptedStore::default());
    let reconciler = WatchlistReconciler::new(store.clone());
    reconciler.settle(Resolution::Guest).await.expect("guest settle");

    // When: The guest tries to add and remove
    let add = reconciler.add("AAPL", Market::Us).await.expect_err("guest add");
    let remove = reconciler.remove("AAPL").await.expect_err("guest remove");

    // Then: Both ask for sign-in and no call was made
    assert!(matches!(add, WatchlistError::AuthRequired { .. }));
    assert!(matches!(remove, WatchlistError::AuthRequired { .. }));
    assert!(add.needs_sign_in());
    assert!(store.calls().is_empty());
    assert!(reconciler.is_empty());
}

#[tokio::test]
async fn when_session_has_no_identifier_user_is_told_to_sign_in_again() {
    // Given: A loaded list, then a session with neither email nor name
    let listed = vec![entry("AAPL", Market::Us, "Apple Inc.")];
    let (store, reconciler) = signed_in("ada@example.com", listed.clone()).await;

    // When: The session re-resolves as unidentified
    let settle = reconciler.settle(Resolution::Unidentified).await;
    let add = reconciler.add("TSLA", Market::Us).await;

    // Then: Loud errors, no calls, and the list is not silently wiped
    assert_eq!(settle, Err(WatchlistError::IdentityUnavailable));
    assert_eq!(add, Err(WatchlistError::IdentityUnavailable));
    assert_eq!(store.calls().len(), 1);
    assert_eq!(reconciler.entries(), listed);
}

#[tokio::test]
async fn when_add_completes_after_user_switch_it_does_not_leak_into_new_list() {
    // Given: A create for A held open
    let (store, reconciler) = signed_in("a@example.com", Vec::new()).await;
    let release = store.script_create_gated(Ok(entry("AAPL", Market::Us, "Apple Inc.")));
    let pending = {
        let reconciler = reconciler.clone();
        tokio::spawn(async move { reconciler.add("AAPL", Market::Us).await })
    };
    store.wait_for_calls(2).await;

    // When: B signs in, then A's create succeeds
    store.script_list(Ok(Vec::new()));
    reconciler.settle(user("b@example.com")).await.expect("load for B");
    release.send(()).expect("create still waiting");
    pending.await.expect("task joined").expect("A's create succeeded remotely");

    // Then: B's list stays empty
    assert!(reconciler.is_empty());
}

// =============================================================================
// Removing
// =============================================================================

#[tokio::test]
async fn when_remove_succeeds_list_equals_fresh_store_load() {
    // Given: Two tracked symbols
    let (store, reconciler) = signed_in(
        "ada@example.com",
        vec![
            entry("AAPL", Market::Us, "Apple Inc."),
            entry("MSFT", Market::Us, "Microsoft"),
        ],
    )
    .await;
    let post_delete = vec![entry("MSFT", Market::Us, "Microsoft Corporation")];
    store.script_delete(Ok(Ack::default()));
    store.script_list(Ok(post_delete.clone()));

    // When: AAPL is removed
    let outcome = reconciler.remove("aapl").await.expect("remove succeeds");

    // Then: The list is exactly what the store returned after the delete
    assert_eq!(outcome, LoadOutcome::Loaded { count: 1 });
    assert_eq!(reconciler.entries(), post_delete);
    assert_eq!(
        store.calls()[1..],
        [
            Call::Delete(String::from("ada@example.com"), String::from("AAPL")),
            Call::List(Some(String::from("ada@example.com"))),
        ]
    );
}

#[tokio::test]
async fn when_remove_fails_list_is_unchanged_and_not_reloaded() {
    // Given: One tracked symbol
    let listed = vec![entry("AAPL", Market::Us, "Apple Inc.")];
    let (store, reconciler) = signed_in("ada@example.com", listed.clone()).await;
    store.script_delete(Err(StoreError::status(Endpoint::RemoveSymbol, 500, "")));

    // When: The delete fails
    let error = reconciler.remove("AAPL").await.expect_err("remove fails");

    // Then: Generic message, same list, no reload
    assert_eq!(error.to_string(), "remove_symbol failed with status 500");
    assert_eq!(reconciler.entries(), listed);
    assert_eq!(store.calls().len(), 2);
}

#[tokio::test]
async fn when_hk_symbol_is_removed_by_short_code_store_padded_code_is_deleted() {
    // Given: Tencent is tracked under the store's padded code
    let (store, reconciler) =
        signed_in("ada@example.com", vec![entry("00700", Market::Hk, "Tencent")]).await;
    store.script_delete(Ok(Ack::default()));
    store.script_list(Ok(Vec::new()));

    // When: The user removes "700"
    let outcome = reconciler.remove("700").await.expect("remove succeeds");

    // Then: The delete names the stored code and the list is empty
    assert_eq!(outcome, LoadOutcome::Loaded { count: 0 });
    assert!(reconciler.is_empty());
    assert_eq!(
        store.calls()[1],
        Call::Delete(String::from("ada@example.com"), String::from("00700"))
    );
}
