use super::combobox::ComboboxController;
use super::input::RelationsInput;
use super::list::RelationListController;
use super::service::{RelationSearchService, RelationTarget};
use super::types::{AttachedRelation, PaginationMeta};
use super::viewport::ListViewport;
use crate::config::Config;
use crate::error::Result;
use crate::form::{FormFieldStore, RelationChanges};
use crate::notify::Notifier;
use crate::schema::RelationKind;
use std::collections::HashSet;
use std::sync::Arc;

/// A relation attribute in the edit view: the search input on top, the
/// attached list below, and paged loading of what the server already has.
pub struct RelationsField {
    target: RelationTarget,
    service: Arc<dyn RelationSearchService>,
    input: RelationsInput,
    list: RelationListController,
    viewport: ListViewport,
    list_page_size: u32,
    attached_pagination: Option<PaginationMeta>,
    server_ids: Vec<String>,
    load_error: Option<String>,
}

impl RelationsField {
    pub fn new(
        target: RelationTarget,
        kind: RelationKind,
        config: &Config,
        service: Arc<dyn RelationSearchService>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let controller = ComboboxController::new(
            target.clone(),
            kind,
            config.relations.search_page_size,
            config.features,
            notifier,
        );
        let input = RelationsInput::new(controller, Arc::clone(&service), config.search_debounce());
        let list = RelationListController::new(target.attribute_name.clone(), kind);

        Self {
            target,
            service,
            input,
            list,
            viewport: ListViewport::from_config(&config.relations),
            list_page_size: config.relations.list_page_size,
            attached_pagination: None,
            server_ids: Vec::new(),
            load_error: None,
        }
    }

    pub fn target(&self) -> &RelationTarget {
        &self.target
    }

    pub fn input(&self) -> &RelationsInput {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut RelationsInput {
        &mut self.input
    }

    pub fn list(&self) -> &RelationListController {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut RelationListController {
        &mut self.list
    }

    pub fn viewport(&self) -> &ListViewport {
        &self.viewport
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn has_more_attached(&self) -> bool {
        self.attached_pagination
            .map(|p| p.has_next_page())
            .unwrap_or(false)
    }

    /// Fetch the first page of relations already connected on the server
    ///
    /// Rows are appended to `store` after whatever it already holds. Ids seen
    /// in an earlier load are never appended again, so a reload does not undo
    /// a local `disconnect`.
    ///
    /// # Arguments
    /// * `store` - Form state receiving the rows
    ///
    /// # Returns
    /// Number of rows appended; `0` for a record that has not been saved yet
    pub async fn load_attached(&mut self, store: &mut dyn FormFieldStore) -> Result<usize> {
        self.load_attached_page(1, store).await
    }

    /// Fetch the next page of connected relations, if there is one.
    pub async fn load_more_attached(&mut self, store: &mut dyn FormFieldStore) -> Result<usize> {
        let Some(pagination) = self.attached_pagination else {
            return Ok(0);
        };
        if !pagination.has_next_page() {
            return Ok(0);
        }
        self.load_attached_page(pagination.page + 1, store).await
    }

    async fn load_attached_page(&mut self, page: u32, store: &mut dyn FormFieldStore) -> Result<usize> {
        let Some(request) = self.target.list_request(page, self.list_page_size) else {
            log::debug!(
                "No parent id for {}.{}, attached relations not loaded",
                self.target.model,
                self.target.attribute_name
            );
            return Ok(0);
        };

        let fetched = match self.service.list_attached(&request).await {
            Ok(fetched) => fetched,
            Err(e) => {
                log::warn!(
                    "Loading attached relations for {}.{} failed: {}",
                    self.target.model,
                    self.target.attribute_name,
                    e
                );
                self.load_error = Some(e.to_string());
                return Err(e);
            }
        };
        self.load_error = None;
        self.attached_pagination = match fetched.pagination {
            Some(p) if p.page < page => {
                log::warn!(
                    "Asked for page {} of {}.{} but got page {}, stopping",
                    page,
                    self.target.model,
                    self.target.attribute_name,
                    p.page
                );
                None
            }
            other => other,
        };

        let field_path = self.target.attribute_name.as_str();
        let present: HashSet<String> = store.field(field_path).iter().map(|r| r.id.clone()).collect();
        let mut added = 0;
        for candidate in fetched.results {
            // a known id missing from the form was disconnected locally
            if self.server_ids.contains(&candidate.id) {
                if !present.contains(&candidate.id) {
                    log::debug!("Keeping {} disconnected from {}", candidate.id, field_path);
                }
                continue;
            }
            self.server_ids.push(candidate.id.clone());
            if present.contains(&candidate.id) {
                continue;
            }
            let position = store.field(field_path).len();
            store.append_row(field_path, AttachedRelation::from_candidate(&candidate, position));
            added += 1;
        }
        log::debug!("Loaded {} attached relations into {}", added, field_path);
        Ok(added)
    }

    /// Connect / disconnect payload relative to what the server returned.
    pub fn changes(&self, store: &dyn FormFieldStore) -> RelationChanges {
        RelationChanges::between(&self.server_ids, store.field(&self.target.attribute_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelkitError;
    use crate::form::MemoryFormStore;
    use crate::notify::RecordingNotifier;
    use crate::relations::service::{ListRequest, SearchRequest};
    use crate::relations::types::{RelationCandidate, RelationPage};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Seven attached relations, served in pages; candidates are `N1..N3`.
    struct FixtureService {
        fail_listing: AtomicBool,
        /// Ignore the requested page and always answer page 1
        stuck: AtomicBool,
    }

    fn candidate(id: &str) -> RelationCandidate {
        RelationCandidate {
            id: id.to_string(),
            display_label: id.to_string(),
            published: false,
        }
    }

    #[async_trait]
    impl RelationSearchService for FixtureService {
        async fn search(&self, request: &SearchRequest) -> Result<RelationPage> {
            Ok(RelationPage {
                results: ["N1", "N2", "N3"].iter().map(|id| candidate(id)).collect(),
                pagination: Some(PaginationMeta {
                    page: request.page,
                    page_count: 1,
                }),
            })
        }

        async fn list_attached(&self, request: &ListRequest) -> Result<RelationPage> {
            if self.fail_listing.load(Ordering::SeqCst) {
                return Err(RelkitError::Api {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            let all: Vec<String> = (1..=7).map(|i| format!("A{}", i)).collect();
            let page = if self.stuck.load(Ordering::SeqCst) { 1 } else { request.page };
            let size = request.page_size as usize;
            let start = (page as usize - 1) * size;
            let results = all.iter().skip(start).take(size).map(|id| candidate(id)).collect();
            Ok(RelationPage {
                results,
                pagination: Some(PaginationMeta {
                    page,
                    page_count: (all.len() as u32).div_ceil(request.page_size),
                }),
            })
        }
    }

    fn config() -> Config {
        Config::from_toml(
            r#"
[api]
base_url = "http://localhost:1337/admin"

[relations]
search_debounce_ms = 0
"#,
        )
        .unwrap()
    }

    fn make_field(kind: RelationKind, parent_id: Option<&str>) -> (RelationsField, Arc<FixtureService>) {
        let service = Arc::new(FixtureService {
            fail_listing: AtomicBool::new(false),
            stuck: AtomicBool::new(false),
        });
        let target = RelationTarget::new("api::article.article", "tags", parent_id.map(String::from));
        let field = RelationsField::new(
            target,
            kind,
            &config(),
            service.clone(),
            Arc::new(RecordingNotifier::new()),
        );
        (field, service)
    }

    fn ids(store: &MemoryFormStore) -> Vec<String> {
        store.field("tags").iter().map(|r| r.id.clone()).collect()
    }

    #[tokio::test]
    async fn test_attached_relations_load_in_pages() {
        let (mut field, _) = make_field(RelationKind::ManyToMany, Some("1"));
        let mut store = MemoryFormStore::new();

        assert_eq!(field.load_attached(&mut store).await.unwrap(), 5);
        assert!(field.has_more_attached());
        assert_eq!(field.load_more_attached(&mut store).await.unwrap(), 2);
        assert!(!field.has_more_attached());
        assert_eq!(field.load_more_attached(&mut store).await.unwrap(), 0);

        assert_eq!(ids(&store), vec!["A1", "A2", "A3", "A4", "A5", "A6", "A7"]);
        let positions: Vec<usize> = store.field("tags").iter().map(|r| r.position).collect();
        assert_eq!(positions, (0..7).collect::<Vec<_>>());
        assert!(field.changes(&store).is_empty());
    }

    #[tokio::test]
    async fn test_reload_does_not_duplicate_rows() {
        let (mut field, _) = make_field(RelationKind::ManyToMany, Some("1"));
        let mut store = MemoryFormStore::new();
        field.load_attached(&mut store).await.unwrap();
        assert_eq!(field.load_attached(&mut store).await.unwrap(), 0);
        assert_eq!(store.field("tags").len(), 5);
    }

    #[tokio::test]
    async fn test_reload_keeps_disconnected_rows_out() {
        let (mut field, _) = make_field(RelationKind::ManyToMany, Some("1"));
        let mut store = MemoryFormStore::new();
        field.load_attached(&mut store).await.unwrap();
        field.list_mut().disconnect(&mut store, "A3").unwrap();

        assert_eq!(field.load_attached(&mut store).await.unwrap(), 0);
        assert_eq!(ids(&store), vec!["A1", "A2", "A4", "A5"]);
        let disconnect: Vec<String> = field.changes(&store).disconnect.into_iter().map(|r| r.id).collect();
        assert_eq!(disconnect, vec!["A3"]);

        // later pages still arrive
        assert_eq!(field.load_more_attached(&mut store).await.unwrap(), 2);
        assert_eq!(ids(&store), vec!["A1", "A2", "A4", "A5", "A6", "A7"]);
    }

    #[tokio::test]
    async fn test_paging_stops_when_server_repeats_a_page() {
        let (mut field, service) = make_field(RelationKind::ManyToMany, Some("1"));
        let mut store = MemoryFormStore::new();
        field.load_attached(&mut store).await.unwrap();
        service.stuck.store(true, Ordering::SeqCst);

        assert_eq!(field.load_more_attached(&mut store).await.unwrap(), 0);
        assert!(!field.has_more_attached());
        assert_eq!(store.field("tags").len(), 5);
    }

    #[tokio::test]
    async fn test_unsaved_record_loads_nothing() {
        let (mut field, _) = make_field(RelationKind::ManyToMany, None);
        let mut store = MemoryFormStore::new();
        assert_eq!(field.load_attached(&mut store).await.unwrap(), 0);
        assert!(!field.has_more_attached());
        assert!(store.field("tags").is_empty());
    }

    #[tokio::test]
    async fn test_listing_failure_keeps_rows() {
        let (mut field, service) = make_field(RelationKind::ManyToMany, Some("1"));
        let mut store = MemoryFormStore::new();
        field.load_attached(&mut store).await.unwrap();

        service.fail_listing.store(true, Ordering::SeqCst);
        assert!(field.load_more_attached(&mut store).await.is_err());
        assert!(field.load_error().unwrap().contains("500"));
        assert_eq!(store.field("tags").len(), 5);
    }

    #[tokio::test]
    async fn test_search_select_reorder_disconnect_roundtrip() {
        let (mut field, _) = make_field(RelationKind::ManyToMany, Some("1"));
        let mut store = MemoryFormStore::new();
        field.load_attached(&mut store).await.unwrap();

        field.input_mut().search_now("n");
        field.input_mut().settle().await;
        field.input_mut().select("N2", &mut store).unwrap();

        field.list_mut().reorder(&mut store, 5, 0).unwrap();
        field.list_mut().disconnect(&mut store, "A3").unwrap();

        assert_eq!(ids(&store), vec!["N2", "A1", "A2", "A4", "A5"]);
        let changes = field.changes(&store);
        let connect: Vec<&str> = changes.connect.iter().map(|r| r.id.as_str()).collect();
        let disconnect: Vec<&str> = changes.disconnect.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(connect, vec!["N2"]);
        assert_eq!(disconnect, vec!["A3"]);
    }

    #[test]
    fn test_viewport_uses_config() {
        let (field, _) = make_field(RelationKind::ManyToMany, Some("1"));
        assert_eq!(field.viewport().window, 5);
        assert_eq!(field.viewport().item_size(), 54);
    }
}
