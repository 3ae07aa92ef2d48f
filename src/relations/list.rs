use super::announce;
use super::types::AttachedRelation;
use crate::error::{RelkitError, Result};
use crate::form::FormFieldStore;
use crate::schema::RelationKind;

/// Keys the list reacts to while a row has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKey {
    Space,
    Enter,
    ArrowUp,
    ArrowDown,
    Escape,
}

#[derive(Debug, Clone)]
struct DragSession {
    id: String,
    origin: usize,
}

/// Mutations on the attached-relations list of one field.
///
/// The rows themselves live in the [`FormFieldStore`]; this controller only
/// validates operations, keeps a keyboard drag session and the live status
/// text announced after each action.
#[derive(Debug, Clone)]
pub struct RelationListController {
    field_path: String,
    kind: RelationKind,
    drag: Option<DragSession>,
    live_text: String,
}

impl RelationListController {
    pub fn new(field_path: impl Into<String>, kind: RelationKind) -> Self {
        Self {
            field_path: field_path.into(),
            kind,
            drag: None,
            live_text: String::new(),
        }
    }

    pub fn field_path(&self) -> &str {
        &self.field_path
    }

    pub fn can_reorder(&self) -> bool {
        self.kind.can_reorder()
    }

    /// Hint for the drag handle; `None` when the list cannot be reordered.
    pub fn instructions(&self) -> Option<&'static str> {
        self.can_reorder().then_some(announce::INSTRUCTIONS)
    }

    pub fn rows<'a>(&self, store: &'a dyn FormFieldStore) -> &'a [AttachedRelation] {
        store.field(&self.field_path)
    }

    pub fn live_text(&self) -> &str {
        &self.live_text
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Move the row at `old_index` to `new_index`, shifting the rows between.
    pub fn reorder(&mut self, store: &mut dyn FormFieldStore, old_index: usize, new_index: usize) -> Result<String> {
        self.ensure_reorderable()?;
        let len = store.field(&self.field_path).len();
        if old_index >= len || new_index >= len {
            return Err(RelkitError::InvalidInput(format!(
                "reorder {} -> {} out of bounds for {} rows",
                old_index, new_index, len
            )));
        }

        if old_index != new_index {
            store.move_row(&self.field_path, old_index, new_index);
        }

        let rows = store.field(&self.field_path);
        let text = announce::moved(&rows[new_index].display_label, new_index, rows.len());
        Ok(self.announce(text))
    }

    /// Remove the row with `id`; later rows move up by one.
    pub fn disconnect(&mut self, store: &mut dyn FormFieldStore, id: &str) -> Result<AttachedRelation> {
        let index = self
            .index_of(store, id)
            .ok_or_else(|| RelkitError::RelationNotFound(id.to_string()))?;
        let removed = store
            .remove_row(&self.field_path, index)
            .ok_or_else(|| RelkitError::RelationNotFound(id.to_string()))?;

        if self.drag.as_ref().map(|d| d.id == id).unwrap_or(false) {
            self.drag = None;
        }
        log::debug!("Disconnected relation {} from {}", id, self.field_path);
        Ok(removed)
    }

    pub fn grab(&mut self, store: &dyn FormFieldStore, index: usize) -> Result<String> {
        self.ensure_reorderable()?;
        let rows = store.field(&self.field_path);
        let row = rows
            .get(index)
            .ok_or_else(|| RelkitError::InvalidInput(format!("no row at index {}", index)))?;

        self.drag = Some(DragSession {
            id: row.id.clone(),
            origin: index,
        });
        let text = announce::grabbed(&row.display_label, index, rows.len());
        Ok(self.announce(text))
    }

    /// Move the grabbed row by `delta`, clamped to the list bounds.
    pub fn move_grabbed(&mut self, store: &mut dyn FormFieldStore, delta: isize) -> Result<String> {
        let current = self.grabbed_index(store)?;
        let last = store.field(&self.field_path).len().saturating_sub(1) as isize;
        let target = (current as isize + delta).clamp(0, last) as usize;
        self.reorder(store, current, target)
    }

    pub fn drop_grabbed(&mut self, store: &dyn FormFieldStore) -> Result<String> {
        let current = self.grabbed_index(store)?;
        self.drag = None;

        let rows = store.field(&self.field_path);
        let text = announce::dropped(&rows[current].display_label, current, rows.len());
        Ok(self.announce(text))
    }

    /// Put the grabbed row back where it was picked up.
    pub fn cancel(&mut self, store: &mut dyn FormFieldStore) -> Result<String> {
        let current = self.grabbed_index(store)?;
        let origin = self.drag.take().map(|d| d.origin).unwrap_or(current);
        let len = store.field(&self.field_path).len();
        let origin = origin.min(len.saturating_sub(1));

        if current != origin {
            store.move_row(&self.field_path, current, origin);
        }

        let rows = store.field(&self.field_path);
        let text = announce::cancelled(&rows[origin].display_label, origin, rows.len());
        Ok(self.announce(text))
    }

    /// Keyboard handling for the row at `focused_index`.
    ///
    /// Returns `None` for keys that do nothing in the current state.
    pub fn handle_key(
        &mut self,
        store: &mut dyn FormFieldStore,
        focused_index: usize,
        key: DragKey,
    ) -> Result<Option<String>> {
        let text = match (key, self.is_dragging()) {
            (DragKey::Space | DragKey::Enter, false) => self.grab(store, focused_index)?,
            (DragKey::Space | DragKey::Enter, true) => self.drop_grabbed(store)?,
            (DragKey::ArrowUp, true) => self.move_grabbed(store, -1)?,
            (DragKey::ArrowDown, true) => self.move_grabbed(store, 1)?,
            (DragKey::Escape, true) => self.cancel(store)?,
            _ => return Ok(None),
        };
        Ok(Some(text))
    }

    fn ensure_reorderable(&self) -> Result<()> {
        if self.can_reorder() {
            Ok(())
        } else {
            Err(RelkitError::ReorderNotAllowed(self.kind.to_string()))
        }
    }

    fn index_of(&self, store: &dyn FormFieldStore, id: &str) -> Option<usize> {
        store.field(&self.field_path).iter().position(|row| row.id == id)
    }

    fn grabbed_index(&self, store: &dyn FormFieldStore) -> Result<usize> {
        let drag = self
            .drag
            .as_ref()
            .ok_or_else(|| RelkitError::InvalidInput("no row is grabbed".to_string()))?;
        self.index_of(store, &drag.id)
            .ok_or_else(|| RelkitError::RelationNotFound(drag.id.clone()))
    }

    fn announce(&mut self, text: String) -> String {
        self.live_text = text.clone();
        text
    }
}
