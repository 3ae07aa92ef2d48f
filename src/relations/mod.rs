//! Relation field runtime: candidate search with accumulated pagination,
//! selection into the form, and management of the attached list.

pub mod announce;
mod combobox;
mod cursor;
mod field;
mod input;
mod list;
mod service;
mod types;
mod viewport;

pub use combobox::{ComboboxController, FetchTicket, OptionView};
pub use cursor::{SearchCursor, SearchQueryState};
pub use field::RelationsField;
pub use input::{InputUpdate, RelationsInput};
pub use list::{DragKey, RelationListController};
pub use service::{ListRequest, RelationSearchService, RelationTarget, SearchRequest};
pub use types::{AttachedRelation, PaginationMeta, PublicationState, RelationCandidate, RelationPage, RequestId};
pub use viewport::{ListViewport, Overflow};

/// Attached relations visible before the list starts scrolling.
pub const RELATIONS_TO_DISPLAY: usize = 5;
