//! Debounced incremental entity search
//!
//! Every keystroke updates the query immediately. The provider is only consulted
//! once input has been idle for the debounce interval, and only for queries long
//! enough to be meaningful. Responses that arrive after a newer keystroke or a
//! clear are discarded.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use tokio::{sync::watch, task::JoinHandle};

use crate::{
    models::{Entity, EntitySearch},
    services::RecommendationProvider,
};

pub const DEBOUNCE: Duration = Duration::from_millis(300);
pub const MIN_QUERY_LEN: usize = 2;
pub const MAX_RESULTS: usize = 6;
pub const SEARCH_FAILED: &str = "Search failed. Please try again.";

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub debounce: Duration,
    pub min_query_len: usize,
    pub max_results: usize,
    /// Entity type URNs forwarded to the provider; empty means all types
    pub types: Vec<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            debounce: DEBOUNCE,
            min_query_len: MIN_QUERY_LEN,
            max_results: MAX_RESULTS,
            types: Vec::new(),
        }
    }
}

/// Observable state of a search box
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<Entity>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Debounced search over a [`RecommendationProvider`]
///
/// Must be driven from within a tokio runtime.
pub struct DebouncedSearch {
    provider: Arc<dyn RecommendationProvider>,
    options: SearchOptions,
    state: Arc<watch::Sender<SearchState>>,
    generation: Arc<AtomicU64>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl DebouncedSearch {
    pub fn new(provider: Arc<dyn RecommendationProvider>) -> Self {
        Self::with_options(provider, SearchOptions::default())
    }

    pub fn with_options(provider: Arc<dyn RecommendationProvider>, options: SearchOptions) -> Self {
        let (state, _) = watch::channel(SearchState::default());

        Self {
            provider,
            options,
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
        }
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    /// Records a keystroke and (re)starts the debounce timer
    pub fn set_query(&self, query: impl Into<String>) {
        let query = query.into();
        let trimmed = query.trim().to_string();
        let searchable = trimmed.chars().count() >= self.options.min_query_len;

        let mut pending = self.lock_pending();
        let aborted = match pending.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        };

        let mut generation = 0;
        self.state.send_modify(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            state.query = query;
            if aborted || !searchable {
                state.loading = false;
            }
            if !searchable {
                state.results.clear();
                state.error = None;
            }
        });

        if !searchable {
            return;
        }

        let provider = Arc::clone(&self.provider);
        let state = Arc::clone(&self.state);
        let current = Arc::clone(&self.generation);
        let options = self.options.clone();

        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(options.debounce).await;
            run_search(provider, state, current, generation, trimmed, options).await;
        }));
    }

    /// Resets query, results, and error in a single update
    pub fn clear(&self) {
        if let Some(handle) = self.lock_pending().take() {
            handle.abort();
        }

        self.state.send_modify(|state| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            *state = SearchState::default();
        });
    }

    /// Waits for the pending search, if any, to run to completion
    ///
    /// A search still inside its debounce window is not cut short; it fires
    /// once the interval elapses and its outcome is published before this returns.
    pub async fn settled(&self) {
        let handle = self.lock_pending().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    tracing::error!(error = %e, "Pending search panicked");
                }
            }
        }
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for DebouncedSearch {
    fn drop(&mut self) {
        if let Some(handle) = self.lock_pending().take() {
            handle.abort();
        }
    }
}

/// Applies `update` only if no keystroke or clear happened since `generation` was issued
fn apply_if_current(
    state: &watch::Sender<SearchState>,
    current: &AtomicU64,
    generation: u64,
    update: impl FnOnce(&mut SearchState),
) -> bool {
    state.send_if_modified(|s| {
        if current.load(Ordering::SeqCst) != generation {
            return false;
        }
        update(s);
        true
    })
}

async fn run_search(
    provider: Arc<dyn RecommendationProvider>,
    state: Arc<watch::Sender<SearchState>>,
    current: Arc<AtomicU64>,
    generation: u64,
    query: String,
    options: SearchOptions,
) {
    if !apply_if_current(&state, &current, generation, |s| s.loading = true) {
        return;
    }

    let search = EntitySearch {
        query: query.clone(),
        types: options.types,
        take: u32::try_from(options.max_results).unwrap_or(u32::MAX),
    };

    let outcome = provider.search_entities(&search).await;

    let applied = apply_if_current(&state, &current, generation, |s| {
        s.loading = false;
        match outcome {
            Ok(mut results) => {
                results.truncate(options.max_results);
                s.results = results;
                s.error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, query = %query, provider = provider.name(), "Entity search failed");
                s.results.clear();
                s.error = Some(SEARCH_FAILED.to_string());
            }
        }
    });

    if !applied {
        tracing::debug!(query = %query, "Discarded stale search response");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, AppResult};
    use crate::models::RecommendationQuery;

    /// Provider double recording every query it receives
    struct FakeProvider {
        results: usize,
        fail: bool,
        delay: Duration,
        queries: Mutex<Vec<String>>,
        takes: Mutex<Vec<u32>>,
    }

    impl FakeProvider {
        fn returning(results: usize) -> Arc<Self> {
            Arc::new(Self {
                results,
                fail: false,
                delay: Duration::ZERO,
                queries: Mutex::new(Vec::new()),
                takes: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                results: 0,
                fail: true,
                delay: Duration::ZERO,
                queries: Mutex::new(Vec::new()),
                takes: Mutex::new(Vec::new()),
            })
        }

        fn slow(results: usize, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                results,
                fail: false,
                delay,
                queries: Mutex::new(Vec::new()),
                takes: Mutex::new(Vec::new()),
            })
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }

        fn takes(&self) -> Vec<u32> {
            self.takes.lock().unwrap().clone()
        }
    }

    fn entity(i: usize) -> Entity {
        Entity {
            entity_id: format!("E{i}"),
            name: format!("Entity {i}"),
            types: vec!["urn:entity:movie".to_string()],
            popularity: None,
            properties: None,
        }
    }

    #[async_trait::async_trait]
    impl RecommendationProvider for FakeProvider {
        async fn get_recommendations(&self, _query: &RecommendationQuery) -> AppResult<Vec<Entity>> {
            unreachable!("search never asks for recommendations")
        }

        async fn search_entities(&self, search: &EntitySearch) -> AppResult<Vec<Entity>> {
            self.queries.lock().unwrap().push(search.query.clone());
            self.takes.lock().unwrap().push(search.take);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(AppError::ExternalApi("Qloo API returned status 500".to_string()));
            }
            Ok((0..self.results).map(entity).collect())
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    async fn idle() {
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_updates_immediately() {
        let provider = FakeProvider::returning(1);
        let search = DebouncedSearch::new(provider.clone());

        search.set_query("inc");

        assert_eq!(search.state().query, "inc");
        assert!(provider.queries().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_query_never_searches() {
        let provider = FakeProvider::returning(3);
        let search = DebouncedSearch::new(provider.clone());

        search.set_query("a");
        idle().await;
        search.set_query("  b  ");
        idle().await;
        search.set_query("");
        idle().await;

        assert!(provider.queries().is_empty());
        assert!(search.state().results.is_empty());
        assert!(!search.state().loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_keystrokes_searches_once() {
        let provider = FakeProvider::returning(2);
        let search = DebouncedSearch::new(provider.clone());

        for query in ["in", "inc", "ince", "incep"] {
            search.set_query(query);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        idle().await;

        assert_eq!(provider.queries(), vec!["incep".to_string()]);
        assert_eq!(search.state().results.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_debounce_interval() {
        let provider = FakeProvider::returning(1);
        let search = DebouncedSearch::new(provider.clone());

        search.set_query("jazz");
        tokio::time::sleep(Duration::from_millis(299)).await;
        assert!(provider.queries().is_empty());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(provider.queries(), vec!["jazz".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_is_trimmed_before_search() {
        let provider = FakeProvider::returning(1);
        let search = DebouncedSearch::new(provider.clone());

        search.set_query("  kyoto ");
        idle().await;

        assert_eq!(provider.queries(), vec!["kyoto".to_string()]);
        assert_eq!(search.state().query, "  kyoto ");
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_are_truncated() {
        let provider = FakeProvider::returning(10);
        let search = DebouncedSearch::new(provider);

        search.set_query("radiohead");
        idle().await;

        let state = search.state();
        assert_eq!(state.results.len(), MAX_RESULTS);
        assert_eq!(state.results[0].entity_id, "E0");
        assert!(!state.loading);
        assert_eq!(state.error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_surfaces_generic_error() {
        let provider = FakeProvider::failing();
        let search = DebouncedSearch::new(provider);

        search.set_query("radiohead");
        idle().await;

        let state = search.state();
        assert_eq!(state.error.as_deref(), Some(SEARCH_FAILED));
        assert!(state.results.is_empty());
        assert!(!state.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_while_in_flight() {
        let provider = FakeProvider::slow(1, Duration::from_secs(2));
        let search = DebouncedSearch::new(provider);

        search.set_query("arrival");
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(search.state().loading);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!search.state().loading);
        assert_eq!(search.state().results.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keystroke_during_flight_resets_loading() {
        let provider = FakeProvider::slow(1, Duration::from_secs(2));
        let search = DebouncedSearch::new(provider.clone());

        search.set_query("arrival");
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(search.state().loading);

        search.set_query("arrivals");
        assert!(!search.state().loading);

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert!(search.state().loading);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!search.state().loading);
        assert_eq!(
            provider.queries(),
            vec!["arrival".to_string(), "arrivals".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_settled_runs_pending_search() {
        let provider = FakeProvider::returning(3);
        let search = DebouncedSearch::new(provider.clone());

        search.set_query("radiohead");
        search.settled().await;

        assert_eq!(provider.queries(), vec!["radiohead".to_string()]);
        assert_eq!(search.state().results.len(), 3);
        assert!(!search.state().loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_final_state_survives_drop_after_settling() {
        let provider = FakeProvider::returning(2);
        let search = DebouncedSearch::new(provider);
        let mut rx = search.subscribe();

        search.set_query("radiohead");
        search.settled().await;
        drop(search);

        let mut last = SearchState::default();
        while rx.changed().await.is_ok() {
            last = rx.borrow_and_update().clone();
        }
        assert_eq!(last.query, "radiohead");
        assert_eq!(last.results.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settled_without_pending_search() {
        let provider = FakeProvider::returning(1);
        let search = DebouncedSearch::new(provider.clone());

        search.settled().await;
        search.set_query("a");
        search.settled().await;

        assert!(provider.queries().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_is_discarded() {
        let provider = FakeProvider::slow(4, Duration::from_secs(1));
        let search = DebouncedSearch::new(provider.clone());

        search.set_query("arrival");
        tokio::time::sleep(Duration::from_millis(400)).await;
        search.set_query("a");
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(provider.queries(), vec!["arrival".to_string()]);
        let state = search.state();
        assert_eq!(state.query, "a");
        assert!(state.results.is_empty());
        assert!(!state.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_resets_state() {
        let provider = FakeProvider::failing();
        let search = DebouncedSearch::new(provider);

        search.set_query("radiohead");
        idle().await;
        assert!(search.state().error.is_some());

        search.clear();

        assert_eq!(search.state(), SearchState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cancels_pending_search() {
        let provider = FakeProvider::returning(3);
        let search = DebouncedSearch::new(provider.clone());

        search.set_query("radiohead");
        tokio::time::sleep(Duration::from_millis(100)).await;
        search.clear();
        idle().await;

        assert!(provider.queries().is_empty());
        assert_eq!(search.state(), SearchState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_results() {
        let provider = FakeProvider::returning(2);
        let search = DebouncedSearch::new(provider);
        let mut rx = search.subscribe();

        search.set_query("jazz");
        idle().await;

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().results.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_options() {
        let provider = FakeProvider::returning(10);
        let options = SearchOptions {
            debounce: Duration::from_millis(50),
            min_query_len: 4,
            max_results: 3,
            types: vec!["urn:entity:artist".to_string()],
        };
        let search = DebouncedSearch::with_options(provider.clone(), options);

        search.set_query("abc");
        idle().await;
        assert!(provider.queries().is_empty());

        search.set_query("abcd");
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(provider.queries(), vec!["abcd".to_string()]);
        assert_eq!(provider.takes(), vec![3]);
        assert_eq!(search.state().results.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_max_results_saturates_take() {
        let provider = FakeProvider::returning(2);
        let options = SearchOptions {
            max_results: usize::MAX,
            ..SearchOptions::default()
        };
        let search = DebouncedSearch::with_options(provider.clone(), options);

        search.set_query("radiohead");
        search.settled().await;

        assert_eq!(provider.takes(), vec![u32::MAX]);
        assert_eq!(search.state().results.len(), 2);
    }
}
