use super::combobox::{ComboboxController, FetchTicket};
use super::service::RelationSearchService;
use super::types::{AttachedRelation, RelationPage, RequestId};
use crate::error::Result;
use crate::form::FormFieldStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

enum InputEvent {
    SearchCompleted {
        request_id: RequestId,
        result: Result<RelationPage>,
    },
    DebounceElapsed {
        generation: u64,
        text: String,
    },
}

/// What processing one event did to the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputUpdate {
    /// A search response replaced or extended the options
    ResultsApplied,
    /// A response for a superseded search was dropped
    StaleResponseDiscarded,
    /// Typing settled and a search was issued
    SearchIssued,
    /// Typing settled but the cursor was unchanged or no search is possible
    SearchSkipped,
    /// A newer keystroke replaced this debounce timer
    DebounceSuperseded,
}

/// Drives a [`ComboboxController`] against a live [`RelationSearchService`].
///
/// Searches run as spawned tasks and report back over a channel; the owner
/// applies them one at a time via [`RelationsInput::next_update`]. Keystrokes
/// are debounced before they turn into a search.
pub struct RelationsInput {
    controller: ComboboxController,
    service: Arc<dyn RelationSearchService>,
    debounce: Duration,
    debounce_generation: u64,
    outstanding: usize,
    events_tx: mpsc::UnboundedSender<InputEvent>,
    events_rx: mpsc::UnboundedReceiver<InputEvent>,
}

impl RelationsInput {
    pub fn new(controller: ComboboxController, service: Arc<dyn RelationSearchService>, debounce: Duration) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            controller,
            service,
            debounce,
            debounce_generation: 0,
            outstanding: 0,
            events_tx,
            events_rx,
        }
    }

    pub fn controller(&self) -> &ComboboxController {
        &self.controller
    }

    /// Searches and debounce timers that have not reported back yet.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn open(&mut self) {
        let ticket = self.controller.on_open();
        self.dispatch(ticket);
    }

    /// Echo `text` and search for it once typing pauses.
    pub fn type_text(&mut self, text: &str) {
        self.controller.on_text_change(text);

        if self.debounce.is_zero() {
            let ticket = self.controller.on_explicit_search(text);
            self.dispatch(ticket);
            return;
        }

        self.debounce_generation += 1;
        let generation = self.debounce_generation;
        let delay = self.debounce;
        let text = text.to_string();
        let tx = self.events_tx.clone();
        self.outstanding += 1;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(InputEvent::DebounceElapsed { generation, text });
        });
    }

    /// Search immediately, bypassing the debounce.
    pub fn search_now(&mut self, text: &str) {
        self.controller.on_text_change(text);
        // pending timers become stale
        self.debounce_generation += 1;
        let ticket = self.controller.on_explicit_search(text);
        self.dispatch(ticket);
    }

    pub fn load_more(&mut self) -> bool {
        let ticket = self.controller.on_load_more();
        let issued = ticket.is_some();
        self.dispatch(ticket);
        issued
    }

    pub fn retry(&mut self) -> bool {
        let ticket = self.controller.retry();
        let issued = ticket.is_some();
        self.dispatch(ticket);
        issued
    }

    pub fn select(&mut self, candidate_id: &str, store: &mut dyn FormFieldStore) -> Result<Option<AttachedRelation>> {
        self.controller.on_select(candidate_id, store)
    }

    fn dispatch(&mut self, ticket: Option<FetchTicket>) {
        let Some(ticket) = ticket else {
            return;
        };
        let service = Arc::clone(&self.service);
        let tx = self.events_tx.clone();
        self.outstanding += 1;
        tokio::spawn(async move {
            let result = service.search(&ticket.request).await;
            let _ = tx.send(InputEvent::SearchCompleted {
                request_id: ticket.request_id,
                result,
            });
        });
    }

    /// Wait for the next search response or debounce timer and apply it.
    ///
    /// Returns `None` when nothing is outstanding.
    pub async fn next_update(&mut self) -> Option<InputUpdate> {
        if self.outstanding == 0 {
            return None;
        }
        let event = self.events_rx.recv().await?;
        self.outstanding -= 1;

        let update = match event {
            InputEvent::SearchCompleted { request_id, result } => {
                if self.controller.apply_response(request_id, result) {
                    InputUpdate::ResultsApplied
                } else {
                    InputUpdate::StaleResponseDiscarded
                }
            }
            InputEvent::DebounceElapsed { generation, text } => {
                if generation != self.debounce_generation {
                    InputUpdate::DebounceSuperseded
                } else {
                    match self.controller.on_explicit_search(&text) {
                        Some(ticket) => {
                            self.dispatch(Some(ticket));
                            InputUpdate::SearchIssued
                        }
                        None => InputUpdate::SearchSkipped,
                    }
                }
            }
        };
        Some(update)
    }

    /// Process events until no search or timer is outstanding.
    pub async fn settle(&mut self) -> Vec<InputUpdate> {
        let mut updates = Vec::new();
        while let Some(update) = self.next_update().await {
            updates.push(update);
        }
        updates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeaturesConfig;
    use crate::error::RelkitError;
    use crate::form::MemoryFormStore;
    use crate::notify::RecordingNotifier;
    use crate::relations::service::{ListRequest, RelationTarget, SearchRequest};
    use crate::relations::types::{PaginationMeta, RelationCandidate};
    use crate::schema::RelationKind;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers after `100ms - 10ms * query length`, so shorter queries
    /// resolve later than longer ones.
    struct SlowService {
        calls: Mutex<Vec<SearchRequest>>,
        fail_query: Option<String>,
    }

    impl SlowService {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_query: None,
            }
        }

        fn calls(&self) -> Vec<SearchRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RelationSearchService for SlowService {
        async fn search(&self, request: &SearchRequest) -> Result<RelationPage> {
            self.calls.lock().unwrap().push(request.clone());
            let delay = 100u64.saturating_sub(request.query_text.len() as u64 * 10);
            tokio::time::sleep(Duration::from_millis(delay)).await;

            if self.fail_query.as_deref() == Some(request.query_text.as_str()) {
                return Err(RelkitError::Fetch("service unavailable".to_string()));
            }

            let results = (0..2)
                .map(|i| {
                    let id = format!("{}-{}-{}", request.query_text, request.page, i);
                    RelationCandidate {
                        display_label: id.clone(),
                        id,
                        published: true,
                    }
                })
                .collect();
            Ok(RelationPage {
                results,
                pagination: Some(PaginationMeta {
                    page: request.page,
                    page_count: 2,
                }),
            })
        }

        async fn list_attached(&self, _request: &ListRequest) -> Result<RelationPage> {
            Ok(RelationPage::default())
        }
    }

    fn make_input(service: Arc<SlowService>, parent_id: Option<&str>, debounce_ms: u64) -> RelationsInput {
        let target = RelationTarget::new("api::article.article", "tags", parent_id.map(String::from));
        let controller = ComboboxController::new(
            target,
            RelationKind::ManyToMany,
            10,
            FeaturesConfig::default(),
            Arc::new(RecordingNotifier::new()),
        );
        RelationsInput::new(controller, service, Duration::from_millis(debounce_ms))
    }

    fn option_ids(input: &RelationsInput) -> Vec<String> {
        input.controller().options().iter().map(|o| o.id.clone()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_searches_keep_latest() {
        let service = Arc::new(SlowService::new());
        let mut input = make_input(service.clone(), Some("1"), 0);

        // "a" is slower than "abc", so it resolves second
        input.search_now("a");
        input.search_now("abc");
        let updates = input.settle().await;

        assert_eq!(
            updates,
            vec![InputUpdate::ResultsApplied, InputUpdate::StaleResponseDiscarded]
        );
        assert_eq!(option_ids(&input), vec!["abc-1-0", "abc-1-1"]);
        assert_eq!(service.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_is_debounced() {
        let service = Arc::new(SlowService::new());
        let mut input = make_input(service.clone(), Some("1"), 250);

        input.type_text("r");
        input.type_text("ru");
        input.type_text("rus");
        let updates = input.settle().await;

        assert_eq!(updates.iter().filter(|u| **u == InputUpdate::DebounceSuperseded).count(), 2);
        assert!(updates.contains(&InputUpdate::SearchIssued));
        let calls = service.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].query_text, "rus");
        assert_eq!(input.controller().text_value(), "rus");
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_more_accumulates() {
        let service = Arc::new(SlowService::new());
        let mut input = make_input(service.clone(), Some("1"), 0);

        input.open();
        input.settle().await;
        assert!(input.load_more());
        input.settle().await;

        assert_eq!(option_ids(&input), vec!["-1-0", "-1-1", "-2-0", "-2-1"]);
        assert!(!input.load_more(), "page 2 of 2 is the last one");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsaved_record_never_searches() {
        let service = Arc::new(SlowService::new());
        let mut input = make_input(service.clone(), None, 0);

        input.open();
        input.search_now("x");
        assert_eq!(input.outstanding(), 0);
        assert!(input.settle().await.is_empty());
        assert!(service.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_then_retry() {
        let service = Arc::new(SlowService {
            calls: Mutex::new(Vec::new()),
            fail_query: Some("bad".to_string()),
        });
        let mut input = make_input(service.clone(), Some("1"), 0);

        input.search_now("bad");
        input.settle().await;
        assert!(input.controller().error().is_some());
        assert!(input.controller().options().is_empty());

        assert!(input.retry());
        input.settle().await;
        assert_eq!(service.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_after_search() {
        let service = Arc::new(SlowService::new());
        let mut input = make_input(service, Some("1"), 0);
        let mut store = MemoryFormStore::new();

        input.search_now("go");
        input.settle().await;
        let row = input.select("go-1-1", &mut store).unwrap().unwrap();
        assert_eq!(row.position, 0);
        assert!(input.select("nope", &mut store).is_err());
        assert_eq!(store.field("tags").len(), 1);
    }
}
