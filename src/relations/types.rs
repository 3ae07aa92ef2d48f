use crate::config::FeaturesConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A search hit that can be connected to the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationCandidate {
    pub id: String,
    pub display_label: String,
    pub published: bool,
}

/// A relation already attached to the record being edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedRelation {
    pub id: String,
    pub display_label: String,
    pub published: bool,
    /// 0-based, always equal to the row's index in its field.
    pub position: usize,
}

impl AttachedRelation {
    pub fn from_candidate(candidate: &RelationCandidate, position: usize) -> Self {
        Self {
            id: candidate.id.clone(),
            display_label: candidate.display_label.clone(),
            published: candidate.published,
            position,
        }
    }
}

/// Pagination block returned next to every page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub page_count: u32,
}

impl PaginationMeta {
    pub fn has_next_page(&self) -> bool {
        self.page < self.page_count
    }
}

/// One page of candidates or attached relations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RelationPage {
    pub results: Vec<RelationCandidate>,
    pub pagination: Option<PaginationMeta>,
}

/// Publication badge shown next to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicationState {
    Draft,
    Published,
}

impl PublicationState {
    /// `None` when draft & publish is disabled for the instance.
    pub fn for_record(published: bool, features: &FeaturesConfig) -> Option<Self> {
        if !features.draft_and_publish {
            return None;
        }
        Some(if published {
            PublicationState::Published
        } else {
            PublicationState::Draft
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            PublicationState::Draft => "Draft",
            PublicationState::Published => "Published",
        }
    }
}

impl fmt::Display for PublicationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identity of an issued search; only the latest one may update the options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
