//! Screen-reader status messages for keyboard reordering.
//!
//! Positions are 1-based and always computed after the action took effect.

pub const INSTRUCTIONS: &str = "Press spacebar to grab and re-order";

pub fn position(index: usize, total: usize) -> String {
    format!("{} of {}", index + 1, total)
}

pub fn grabbed(item: &str, index: usize, total: usize) -> String {
    format!(
        "{}, grabbed. Current position in list: {}. Press up and down arrow to change position, Spacebar to drop, Escape to cancel.",
        item,
        position(index, total)
    )
}

pub fn moved(item: &str, index: usize, total: usize) -> String {
    format!("{}, moved. New position in list: {}.", item, position(index, total))
}

pub fn dropped(item: &str, index: usize, total: usize) -> String {
    format!("{}, dropped. Final position in list: {}.", item, position(index, total))
}

pub fn cancelled(item: &str, index: usize, total: usize) -> String {
    format!(
        "{}, dropped. Re-order cancelled. Position in list: {}.",
        item,
        position(index, total)
    )
}
