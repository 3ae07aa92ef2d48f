use super::cursor::{SearchCursor, SearchQueryState};
use super::service::{RelationTarget, SearchRequest};
use super::types::{AttachedRelation, PaginationMeta, PublicationState, RelationCandidate, RelationPage, RequestId};
use crate::config::FeaturesConfig;
use crate::error::{RelkitError, Result};
use crate::form::FormFieldStore;
use crate::notify::Notifier;
use crate::schema::RelationKind;
use std::collections::HashSet;
use std::sync::Arc;

const STALE_SELECTION_MESSAGE: &str = "An error occurred while trying to add the relation.";

/// A search the caller must run and feed back through [`ComboboxController::apply_response`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub request_id: RequestId,
    pub request: SearchRequest,
}

#[derive(Debug, Clone)]
struct PendingFetch {
    request_id: RequestId,
    cursor: SearchCursor,
}

/// An option row ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionView<'a> {
    pub id: &'a str,
    pub label: &'a str,
    pub status: Option<PublicationState>,
}

/// State machine behind the "add relation" combobox.
///
/// It never performs I/O: every operation that needs data returns a
/// [`FetchTicket`], and results come back through `apply_response`. Only the
/// most recently issued ticket can change the visible options.
pub struct ComboboxController {
    target: RelationTarget,
    kind: RelationKind,
    features: FeaturesConfig,
    notifier: Arc<dyn Notifier>,
    text_value: String,
    query: SearchQueryState,
    options: Vec<RelationCandidate>,
    pagination: Option<PaginationMeta>,
    pending: Option<PendingFetch>,
    /// Cursor of the last response that reached `options`
    applied: Option<SearchCursor>,
    failed: Option<SearchCursor>,
    last_request_id: u64,
    error: Option<String>,
}

impl ComboboxController {
    pub fn new(
        target: RelationTarget,
        kind: RelationKind,
        page_size: u32,
        features: FeaturesConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            target,
            kind,
            features,
            notifier,
            text_value: String::new(),
            query: SearchQueryState::new(page_size),
            options: Vec::new(),
            pagination: None,
            pending: None,
            applied: None,
            failed: None,
            last_request_id: 0,
            error: None,
        }
    }

    pub fn target(&self) -> &RelationTarget {
        &self.target
    }

    pub fn text_value(&self) -> &str {
        &self.text_value
    }

    pub fn options(&self) -> &[RelationCandidate] {
        &self.options
    }

    pub fn option_views(&self) -> Vec<OptionView<'_>> {
        self.options
            .iter()
            .map(|opt| OptionView {
                id: &opt.id,
                label: &opt.display_label,
                status: PublicationState::for_record(opt.published, &self.features),
            })
            .collect()
    }

    pub fn pagination(&self) -> Option<PaginationMeta> {
        self.pagination
    }

    pub fn cursor(&self) -> Option<&SearchCursor> {
        self.query.current()
    }

    pub fn has_next_page(&self) -> bool {
        self.pagination.map(|p| p.has_next_page()).unwrap_or(false)
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Message of the last failed fetch, cleared by the next successful one.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Local echo of the typed text; does not search.
    pub fn on_text_change(&mut self, text: &str) {
        self.text_value = text.to_string();
    }

    /// Opening the list searches for whatever is currently typed.
    pub fn on_open(&mut self) -> Option<FetchTicket> {
        let text = self.text_value.clone();
        self.on_explicit_search(&text)
    }

    pub fn on_explicit_search(&mut self, text: &str) -> Option<FetchTicket> {
        if self.target.parent_id.is_none() {
            log::debug!(
                "No parent id for {}.{}, search suppressed",
                self.target.model,
                self.target.attribute_name
            );
            return None;
        }
        let cursor = self.query.reset(text)?;
        self.issue(cursor)
    }

    /// Request the next page; results are appended to the current options.
    pub fn on_load_more(&mut self) -> Option<FetchTicket> {
        if self.pending.is_some() {
            return None;
        }
        let pagination = self.pagination?;
        if !pagination.has_next_page() {
            return None;
        }
        let cursor = self.query.go_to_page(pagination.page + 1)?;
        self.issue(cursor)
    }

    /// Re-issue the cursor of the failed fetch.
    pub fn retry(&mut self) -> Option<FetchTicket> {
        if self.error.is_none() || self.pending.is_some() {
            return None;
        }
        let cursor = self.failed.clone()?;
        self.query.rewind(Some(cursor.clone()));
        self.issue(cursor)
    }

    fn issue(&mut self, cursor: SearchCursor) -> Option<FetchTicket> {
        let request = self.target.search_request(&cursor)?;
        self.last_request_id += 1;
        let request_id = RequestId(self.last_request_id);

        if let Some(previous) = &self.pending {
            log::debug!("Search {} supersedes in-flight {}", request_id, previous.request_id);
        }
        log::debug!(
            "Issuing search {} for {}.{} (q={:?}, page={})",
            request_id,
            request.model,
            request.attribute_name,
            request.query_text,
            request.page
        );

        self.pending = Some(PendingFetch { request_id, cursor });
        Some(FetchTicket { request_id, request })
    }

    /// Apply a search result. Returns `false` when the response belongs to a
    /// superseded request and was dropped.
    pub fn apply_response(&mut self, request_id: RequestId, result: Result<RelationPage>) -> bool {
        let pending = match &self.pending {
            Some(pending) if pending.request_id == request_id => pending.clone(),
            _ => {
                log::debug!("Discarding stale search response {}", request_id);
                return false;
            }
        };
        self.pending = None;

        match result {
            Ok(page) => {
                if pending.cursor.page <= 1 {
                    self.options = page.results;
                } else {
                    let seen: HashSet<String> = self.options.iter().map(|o| o.id.clone()).collect();
                    self.options
                        .extend(page.results.into_iter().filter(|o| !seen.contains(&o.id)));
                }
                self.pagination = page.pagination;
                self.applied = Some(pending.cursor);
                self.failed = None;
                self.error = None;
            }
            Err(e) => {
                log::warn!(
                    "Relation search failed for {}.{}: {}",
                    self.target.model,
                    self.target.attribute_name,
                    e
                );
                self.error = Some(e.to_string());
                // the failed cursor was never applied
                self.query.rewind(self.applied.clone());
                self.failed = Some(pending.cursor);
            }
        }
        true
    }

    /// Connect the selected candidate to the field.
    ///
    /// Returns the appended row, or `None` when the id is already attached.
    /// Single-valued kinds replace whatever row the field held.
    pub fn on_select(
        &mut self,
        candidate_id: &str,
        store: &mut dyn FormFieldStore,
    ) -> Result<Option<AttachedRelation>> {
        let Some(candidate) = self.options.iter().find(|opt| opt.id == candidate_id) else {
            log::error!(
                "Selected relation {} is not among the loaded options for {}.{}",
                candidate_id,
                self.target.model,
                self.target.attribute_name
            );
            self.notifier.warning(STALE_SELECTION_MESSAGE);
            return Err(RelkitError::StaleSelection(candidate_id.to_string()));
        };

        let field_path = self.target.attribute_name.as_str();
        if store.field(field_path).iter().any(|row| row.id == candidate.id) {
            log::debug!("Relation {} already attached to {}", candidate.id, field_path);
            return Ok(None);
        }

        if self.kind.is_single_valued() {
            while store.remove_row(field_path, 0).is_some() {}
        }

        let row = AttachedRelation::from_candidate(candidate, store.field(field_path).len());
        store.append_row(field_path, row.clone());
        Ok(Some(row))
    }
}
