use super::cursor::SearchCursor;
use super::types::RelationPage;
use crate::error::Result;
use async_trait::async_trait;

/// Which relation field a fetch belongs to.
///
/// `parent_id` is `None` for a record that has not been saved yet; no
/// search or listing is ever issued for such a target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationTarget {
    pub model: String,
    pub attribute_name: String,
    pub parent_id: Option<String>,
    /// Attribute of the related record used as its label
    pub main_field: Option<String>,
}

impl RelationTarget {
    pub fn new(model: impl Into<String>, attribute_name: impl Into<String>, parent_id: Option<String>) -> Self {
        Self {
            model: model.into(),
            attribute_name: attribute_name.into(),
            parent_id,
            main_field: None,
        }
    }

    pub fn with_main_field(mut self, main_field: impl Into<String>) -> Self {
        self.main_field = Some(main_field.into());
        self
    }

    pub fn search_request(&self, cursor: &SearchCursor) -> Option<SearchRequest> {
        let parent_id = self.parent_id.clone()?;
        Some(SearchRequest {
            model: self.model.clone(),
            attribute_name: self.attribute_name.clone(),
            parent_id,
            main_field: self.main_field.clone(),
            query_text: cursor.query_text.clone(),
            page: cursor.page,
            page_size: cursor.page_size,
        })
    }

    pub fn list_request(&self, page: u32, page_size: u32) -> Option<ListRequest> {
        let parent_id = self.parent_id.clone()?;
        Some(ListRequest {
            model: self.model.clone(),
            attribute_name: self.attribute_name.clone(),
            parent_id,
            main_field: self.main_field.clone(),
            page,
            page_size,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchRequest {
    pub model: String,
    pub attribute_name: String,
    pub parent_id: String,
    pub main_field: Option<String>,
    pub query_text: String,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListRequest {
    pub model: String,
    pub attribute_name: String,
    pub parent_id: String,
    pub main_field: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

/// Backend that resolves relation candidates and attached relations.
#[async_trait]
pub trait RelationSearchService: Send + Sync {
    /// Candidates matching `query_text` that could be connected to the field
    async fn search(&self, request: &SearchRequest) -> Result<RelationPage>;

    /// Relations already connected to the parent record
    async fn list_attached(&self, request: &ListRequest) -> Result<RelationPage>;
}
