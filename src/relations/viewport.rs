use super::types::AttachedRelation;
use super::RELATIONS_TO_DISPLAY;
use crate::config::RelationsConfig;
use std::ops::Range;

/// Which edges of the list have hidden rows behind them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    Top,
    Bottom,
    TopBottom,
}

/// Geometry of the fixed-height attached-relations list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListViewport {
    pub item_height: u32,
    pub gutter: u32,
    pub window: usize,
}

impl Default for ListViewport {
    fn default() -> Self {
        Self {
            item_height: 50,
            gutter: 4,
            window: RELATIONS_TO_DISPLAY,
        }
    }
}

impl ListViewport {
    pub fn from_config(config: &RelationsConfig) -> Self {
        Self {
            item_height: config.item_height,
            gutter: config.gutter,
            window: RELATIONS_TO_DISPLAY,
        }
    }

    pub fn item_size(&self) -> u32 {
        self.item_height + self.gutter
    }

    pub fn needs_virtualization(&self, count: usize) -> bool {
        count > self.window
    }

    /// Visible height; a half row peeks out when more rows are hidden below.
    pub fn list_height(&self, count: usize) -> u32 {
        let shown = count.min(self.window) as u32;
        if self.needs_virtualization(count) {
            shown * self.item_size() + self.item_height / 2
        } else {
            shown * self.item_size()
        }
    }

    pub fn content_height(&self, count: usize) -> u32 {
        count as u32 * self.item_size()
    }

    /// Rows intersecting the viewport at `scroll_top`.
    pub fn visible_range(&self, count: usize, scroll_top: u32) -> Range<usize> {
        let size = self.item_size().max(1);
        let max_scroll = self.content_height(count).saturating_sub(self.list_height(count));
        let scroll_top = scroll_top.min(max_scroll);

        let first = (scroll_top / size) as usize;
        let bottom = scroll_top + self.list_height(count);
        let last = bottom.div_ceil(size) as usize;
        first.min(count)..last.min(count)
    }

    pub fn overflow(&self, count: usize, scroll_top: u32) -> Option<Overflow> {
        if !self.needs_virtualization(count) {
            return None;
        }
        if scroll_top == 0 {
            return Some(Overflow::Bottom);
        }
        let remaining = self.content_height(count).saturating_sub(scroll_top);
        if remaining <= self.list_height(count) {
            Some(Overflow::Top)
        } else {
            Some(Overflow::TopBottom)
        }
    }

    /// Rows to render at `scroll_top`, keyed by their stable id.
    pub fn visible_rows<'a>(&self, rows: &'a [AttachedRelation], scroll_top: u32) -> Vec<(&'a str, &'a AttachedRelation)> {
        rows[self.visible_range(rows.len(), scroll_top)]
            .iter()
            .map(|row| (row.id.as_str(), row))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: usize) -> Vec<AttachedRelation> {
        (0..n)
            .map(|i| AttachedRelation {
                id: format!("id-{}", i),
                display_label: format!("row {}", i),
                published: false,
                position: i,
            })
            .collect()
    }

    #[test]
    fn test_window_ignores_list_page_size() {
        let config = RelationsConfig {
            list_page_size: 20,
            item_height: 40,
            ..RelationsConfig::default()
        };
        let vp = ListViewport::from_config(&config);
        assert_eq!(vp.window, RELATIONS_TO_DISPLAY);
        assert_eq!(vp.item_size(), 44);
        assert_eq!(vp.list_height(12), 5 * 44 + 20);
    }

    #[test]
    fn test_list_height() {
        let vp = ListViewport::default();
        assert_eq!(vp.list_height(0), 0);
        assert_eq!(vp.list_height(3), 3 * 54);
        assert_eq!(vp.list_height(5), 5 * 54);
        assert_eq!(vp.list_height(12), 5 * 54 + 25);
    }

    #[test]
    fn test_small_lists_are_not_virtualized() {
        let vp = ListViewport::default();
        assert!(!vp.needs_virtualization(5));
        assert_eq!(vp.visible_range(3, 0), 0..3);
        assert_eq!(vp.overflow(5, 0), None);
    }

    #[test]
    fn test_visible_range_scrolls() {
        let vp = ListViewport::default();
        assert_eq!(vp.visible_range(20, 0), 0..6);
        assert_eq!(vp.visible_range(20, 54 * 3), 3..9);
        // clamped to the end of the content
        let end = vp.visible_range(20, 100_000);
        assert_eq!(end.end, 20);
    }

    #[test]
    fn test_overflow_edges() {
        let vp = ListViewport::default();
        assert_eq!(vp.overflow(10, 0), Some(Overflow::Bottom));
        assert_eq!(vp.overflow(10, 54), Some(Overflow::TopBottom));
        let bottom = vp.content_height(10) - vp.list_height(10);
        assert_eq!(vp.overflow(10, bottom), Some(Overflow::Top));
    }

    #[test]
    fn test_visible_rows_are_keyed_by_id() {
        let vp = ListViewport::default();
        let rows = rows(8);
        let visible = vp.visible_rows(&rows, 54);
        assert_eq!(visible.first().map(|(key, _)| *key), Some("id-1"));
        assert!(visible.iter().all(|(key, row)| *key == row.id));
    }
}
