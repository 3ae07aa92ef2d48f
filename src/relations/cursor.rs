/// Where a search currently stands: the query text and the last requested page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchCursor {
    pub query_text: String,
    pub page: u32,
    pub page_size: u32,
}

impl SearchCursor {
    pub fn first(query_text: impl Into<String>, page_size: u32) -> Self {
        Self {
            query_text: query_text.into(),
            page: 1,
            page_size,
        }
    }

    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page: page.max(1),
            ..self.clone()
        }
    }

    /// Same query text and page; page size is fixed per field.
    pub fn same_position(&self, other: &SearchCursor) -> bool {
        self.query_text == other.query_text && self.page == other.page
    }
}

/// Holds the cursor of the last issued search.
///
/// Every mutator reports whether the cursor actually changed, which is the
/// only condition under which a new fetch is issued.
#[derive(Debug, Clone)]
pub struct SearchQueryState {
    page_size: u32,
    current: Option<SearchCursor>,
}

impl SearchQueryState {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&SearchCursor> {
        self.current.as_ref()
    }

    /// Put the cursor back to `cursor` without reporting a change.
    ///
    /// Used after a failed fetch so the next identical request is not
    /// mistaken for a repeat of data that was never received.
    pub fn rewind(&mut self, cursor: Option<SearchCursor>) {
        self.current = cursor;
    }

    /// Start over at page 1 for `query_text`.
    pub fn reset(&mut self, query_text: &str) -> Option<SearchCursor> {
        self.replace(SearchCursor::first(query_text, self.page_size))
    }

    /// Move the current query to `page`.
    pub fn go_to_page(&mut self, page: u32) -> Option<SearchCursor> {
        let next = self.current.as_ref()?.with_page(page);
        self.replace(next)
    }

    fn replace(&mut self, next: SearchCursor) -> Option<SearchCursor> {
        if let Some(current) = &self.current {
            if current.same_position(&next) {
                log::debug!(
                    "Cursor unchanged (q={:?}, page={}), skipping fetch",
                    next.query_text,
                    next.page
                );
                return None;
            }
        }
        self.current = Some(next.clone());
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_reset_changes_cursor() {
        let mut state = SearchQueryState::new(10);
        let cursor = state.reset("").unwrap();
        assert_eq!(cursor, SearchCursor::first("", 10));
    }

    #[test]
    fn test_identical_reset_is_suppressed() {
        let mut state = SearchQueryState::new(10);
        assert!(state.reset("cat").is_some());
        assert!(state.reset("cat").is_none());
        assert!(state.reset("cats").is_some());
    }

    #[test]
    fn test_reset_after_paging_returns_to_page_one() {
        let mut state = SearchQueryState::new(10);
        state.reset("cat");
        assert_eq!(state.go_to_page(2).unwrap().page, 2);
        let cursor = state.reset("cat").unwrap();
        assert_eq!(cursor.page, 1);
    }

    #[test]
    fn test_go_to_page_without_query_is_none() {
        let mut state = SearchQueryState::new(10);
        assert!(state.go_to_page(2).is_none());
    }

    #[test]
    fn test_rewind_allows_reissuing() {
        let mut state = SearchQueryState::new(10);
        let first = state.reset("dog").unwrap();
        state.go_to_page(2).unwrap();
        state.rewind(Some(first));
        assert_eq!(state.go_to_page(2).unwrap().page, 2);

        state.rewind(None);
        assert!(state.reset("dog").is_some());
    }

    #[test]
    fn test_go_to_same_page_is_suppressed() {
        let mut state = SearchQueryState::new(10);
        state.reset("dog");
        assert!(state.go_to_page(1).is_none());
        assert!(state.go_to_page(0).is_none(), "page is clamped to 1");
    }
}
