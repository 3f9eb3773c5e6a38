//! Cursor movement over a display sequence.
//!
//! List mode visits every row. Tree mode only lands on rows that are not
//! directories. All functions are pure; `None` means "no row focused".

use crate::tree::FlatItem;
use serde::{Deserialize, Serialize};

/// Which family of movement rules applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationMode {
    List,
    Tree,
}

/// First selectable row
pub fn first(items: &[FlatItem], mode: NavigationMode) -> Option<usize> {
    match mode {
        NavigationMode::List => (!items.is_empty()).then_some(0),
        NavigationMode::Tree => first_file_index(items),
    }
}

/// Next selectable row, wrapping to the start
pub fn next(items: &[FlatItem], current: Option<usize>, mode: NavigationMode) -> Option<usize> {
    match mode {
        NavigationMode::List => next_list_index(items.len(), current),
        NavigationMode::Tree => next_file_index(items, current),
    }
}

/// Previous selectable row, wrapping to the end
pub fn prev(items: &[FlatItem], current: Option<usize>, mode: NavigationMode) -> Option<usize> {
    match mode {
        NavigationMode::List => prev_list_index(items.len(), current),
        NavigationMode::Tree => prev_file_index(items, current),
    }
}

fn next_list_index(len: usize, current: Option<usize>) -> Option<usize> {
    if len == 0 {
        return current;
    }
    match current {
        Some(i) if i + 1 < len => Some(i + 1),
        Some(_) => Some(0),
        None => Some(0),
    }
}

fn prev_list_index(len: usize, current: Option<usize>) -> Option<usize> {
    if len == 0 {
        return current;
    }
    match current {
        Some(i) if i > 0 && i <= len => Some(i - 1),
        _ => Some(len - 1),
    }
}

/// Index of the first non-directory row
pub fn first_file_index(items: &[FlatItem]) -> Option<usize> {
    items.iter().position(FlatItem::is_selectable_file)
}

/// Index of the last non-directory row
pub fn last_file_index(items: &[FlatItem]) -> Option<usize> {
    items.iter().rposition(FlatItem::is_selectable_file)
}

/// Next file after `current`, wrapping to the first file.
/// Without any file rows, `current` is returned unchanged.
pub fn next_file_index(items: &[FlatItem], current: Option<usize>) -> Option<usize> {
    let start = current.map_or(0, |i| i + 1);
    items
        .iter()
        .enumerate()
        .skip(start)
        .find(|(_, item)| item.is_selectable_file())
        .map(|(i, _)| i)
        .or_else(|| first_file_index(items))
        .or(current)
}

/// Previous file before `current`, wrapping to the last file.
/// Without any file rows, `current` is returned unchanged.
pub fn prev_file_index(items: &[FlatItem], current: Option<usize>) -> Option<usize> {
    let end = current.unwrap_or(0).min(items.len());
    items[..end]
        .iter()
        .rposition(FlatItem::is_selectable_file)
        .or_else(|| last_file_index(items))
        .or(current)
}
