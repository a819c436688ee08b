pub mod cursor;
pub mod drag;
pub mod entry;
pub mod grid;

use cursor::{CursorController, Direction, InputMode};
use drag::{DragCoordinator, DragOutcome};
use entry::Entry;
use grid::{GridGeometry, PagingContainer};
use log::debug;
use std::time::Instant;

/// Columns of the folder dialog grid.
const FOLDER_COLUMNS: usize = 3;

/// What the drawer reports outward to its host.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawerEvent {
    ItemActivated(Entry),
    FolderRequested(usize),
    ReorderCommitted,
    FolderCreated { index: usize },
    FolderMerged { index: usize },
    DraggedOut { entry: Entry, from: usize },
    Dismissed,
}

/// One open-drawer session: the entry sequence plus paging, cursor, drag
/// and folder-dialog state. Mutations re-render only the pages they touch;
/// the host persists when it sees the matching event.
pub struct DrawerState {
    entries: Vec<Entry>,
    pub paging: PagingContainer,
    pub cursor: CursorController,
    pub drag: DragCoordinator,
    open_folder: Option<usize>,
    folder_focus: usize,
}

impl DrawerState {
    pub fn new(entries: Vec<Entry>, geometry: GridGeometry, opened_by_touch: bool) -> Self {
        let paging = PagingContainer::new(geometry, entries.len());
        let mode = if opened_by_touch {
            InputMode::Touch
        } else {
            InputMode::Dpad
        };
        Self {
            entries,
            paging,
            cursor: CursorController::new(mode),
            drag: DragCoordinator::new(),
            open_folder: None,
            folder_focus: 0,
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub fn open_folder(&self) -> Option<usize> {
        self.open_folder
    }

    pub fn folder_focus(&self) -> usize {
        self.folder_focus
    }

    /// Swap in a freshly loaded sequence, resetting all view state.
    pub fn reset(&mut self, entries: Vec<Entry>, now: Instant) {
        self.entries = entries;
        self.paging.rebind(self.entries.len());
        self.open_folder = None;
        self.folder_focus = 0;
        self.drag.cancel();
        self.cursor.reset_after_load(&mut self.paging, now);
    }

    /// Per-frame bookkeeping: settle animations, then route page events
    /// through the cursor, then fire due cursor timers.
    pub fn tick(&mut self, now: Instant) {
        self.paging.tick(now);
        let events = self.paging.take_events();
        self.cursor.on_page_events(&events, &mut self.paging, now);
        self.cursor.tick(&mut self.paging, now);
    }

    pub fn handle_direction(&mut self, direction: Direction, now: Instant) {
        if let Some(folder_index) = self.open_folder {
            self.move_folder_focus(folder_index, direction);
            return;
        }
        self.cursor.handle_direction(direction, &mut self.paging, now);
    }

    fn move_folder_focus(&mut self, folder_index: usize, direction: Direction) {
        let Some(Entry::Folder(folder)) = self.entries.get(folder_index) else {
            return;
        };
        let count = folder.apps.len();
        if count == 0 {
            return;
        }
        let focus = self.folder_focus.min(count - 1);
        self.folder_focus = match direction {
            Direction::Left => focus.saturating_sub(1),
            Direction::Right => (focus + 1).min(count - 1),
            Direction::Up => focus.saturating_sub(FOLDER_COLUMNS.min(focus)),
            Direction::Down => {
                if focus + FOLDER_COLUMNS < count {
                    focus + FOLDER_COLUMNS
                } else {
                    focus
                }
            }
        };
    }

    /// Enter/center key.
    pub fn activate_focused(&mut self) -> Option<DrawerEvent> {
        if self.cursor.is_locked() {
            return None;
        }
        if let Some(folder_index) = self.open_folder {
            let Entry::Folder(folder) = self.entries.get(folder_index)? else {
                return None;
            };
            let app = folder.apps.get(self.folder_focus)?.clone();
            self.open_folder = None;
            return Some(DrawerEvent::ItemActivated(Entry::App(app)));
        }
        let index = self.cursor.focused_index(&self.paging)?;
        self.activate_index(index)
    }

    /// Activation by global index (d-pad enter or a tap).
    pub fn activate_index(&mut self, index: usize) -> Option<DrawerEvent> {
        match self.entries.get(index)? {
            Entry::App(_) => Some(DrawerEvent::ItemActivated(self.entries[index].clone())),
            Entry::Folder(_) => {
                self.open_folder = Some(index);
                self.folder_focus = 0;
                Some(DrawerEvent::FolderRequested(index))
            }
        }
    }

    /// Activate an app inside the open folder dialog by slot (tap path).
    pub fn activate_folder_slot(&mut self, slot: usize) -> Option<DrawerEvent> {
        let folder_index = self.open_folder?;
        let Entry::Folder(folder) = self.entries.get(folder_index)? else {
            return None;
        };
        let app = folder.apps.get(slot)?.clone();
        self.open_folder = None;
        Some(DrawerEvent::ItemActivated(Entry::App(app)))
    }

    /// Back/escape: the folder dialog closes first, then the drawer.
    pub fn back(&mut self) -> Option<DrawerEvent> {
        if self.open_folder.take().is_some() {
            return None;
        }
        Some(DrawerEvent::Dismissed)
    }

    /// Apply a finished drag gesture. Mutation failures (stale indices)
    /// abort silently with no event.
    pub fn apply_outcome(&mut self, outcome: DragOutcome, now: Instant) -> Option<DrawerEvent> {
        match outcome {
            DragOutcome::Tap { index } => self.activate_index(index),
            DragOutcome::Reorder { from, to } => {
                if !entry::reorder(&mut self.entries, from, to) {
                    return None;
                }
                self.refresh(from.min(to), now);
                Some(DrawerEvent::ReorderCommitted)
            }
            DragOutcome::MergeApps { from, to } => {
                if !entry::merge_apps(&mut self.entries, from, to) {
                    return None;
                }
                let index = if from < to { to - 1 } else { to };
                self.refresh(from.min(index), now);
                Some(DrawerEvent::FolderCreated { index })
            }
            DragOutcome::AddToFolder { from, to } => {
                if !entry::add_to_folder(&mut self.entries, from, to) {
                    return None;
                }
                let index = if from < to { to - 1 } else { to };
                self.refresh(from.min(index), now);
                Some(DrawerEvent::FolderMerged { index })
            }
            DragOutcome::DragOut { from } => {
                if from >= self.entries.len() {
                    return None;
                }
                let entry = self.entries.remove(from);
                debug!("entry {} dragged out of the drawer", entry.label());
                self.refresh(from, now);
                Some(DrawerEvent::DraggedOut { entry, from })
            }
        }
    }

    /// Put an entry back into the sequence, for a drag-out the host could
    /// not absorb.
    pub fn insert_index(&mut self, index: usize, entry: Entry, now: Instant) {
        let index = index.min(self.entries.len());
        self.entries.insert(index, entry);
        self.refresh(index, now);
    }

    /// Remove an entry outside of drag (the hide action).
    pub fn remove_index(&mut self, index: usize, now: Instant) -> Option<Entry> {
        if index >= self.entries.len() {
            return None;
        }
        let entry = self.entries.remove(index);
        if self.open_folder == Some(index) {
            self.open_folder = None;
        }
        self.refresh(index, now);
        Some(entry)
    }

    /// Rebind the pages that can have changed and re-seat the focus.
    fn refresh(&mut self, affected_index: usize, now: Instant) {
        let page = self.paging.geometry().page_of(affected_index);
        self.paging.refresh_from(self.entries.len(), page);
        self.cursor.refresh_focus(&mut self.paging, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apps::AppInfo;
    use entry::Folder;

    fn app(id: &str) -> AppInfo {
        AppInfo {
            name: id.to_string(),
            id: id.to_string(),
            exec: id.to_string(),
            icon: None,
        }
    }

    fn drawer(ids: &[&str]) -> DrawerState {
        let entries = ids.iter().map(|id| Entry::App(app(id))).collect();
        DrawerState::new(entries, GridGeometry::new(3, 2), false)
    }

    #[test]
    fn merge_emits_folder_created_at_the_final_index() {
        let mut d = drawer(&["a", "b", "c", "d"]);
        let event = d.apply_outcome(DragOutcome::MergeApps { from: 0, to: 2 }, Instant::now());
        assert_eq!(event, Some(DrawerEvent::FolderCreated { index: 1 }));
        assert!(d.entries()[1].is_folder());
        assert_eq!(d.entries().len(), 3);
    }

    #[test]
    fn drag_out_removes_and_hands_the_entry_over() {
        let mut d = drawer(&["a", "b", "c"]);
        let event = d.apply_outcome(DragOutcome::DragOut { from: 1 }, Instant::now());
        let Some(DrawerEvent::DraggedOut {
            entry: Entry::App(removed),
            from,
        }) = event
        else {
            panic!("expected a dragged-out app");
        };
        assert_eq!(removed.id, "b");
        assert_eq!(from, 1);
        assert_eq!(d.entries().len(), 2);
        assert_eq!(d.paging.item_count(), 2);
    }

    #[test]
    fn stale_outcome_indices_abort_without_mutation() {
        let mut d = drawer(&["a", "b"]);
        let now = Instant::now();
        assert_eq!(d.apply_outcome(DragOutcome::Reorder { from: 0, to: 9 }, now), None);
        assert_eq!(d.apply_outcome(DragOutcome::MergeApps { from: 9, to: 0 }, now), None);
        assert_eq!(d.apply_outcome(DragOutcome::DragOut { from: 5 }, now), None);
        assert_eq!(d.entries().len(), 2);
    }

    #[test]
    fn activating_a_folder_opens_the_dialog() {
        let mut d = drawer(&["a"]);
        d.entries.push(Entry::Folder(Folder {
            name: "Tools".into(),
            apps: vec![app("x"), app("y"), app("z"), app("w"), app("v")],
        }));
        d.paging.rebind(d.entries.len());

        assert_eq!(d.activate_index(1), Some(DrawerEvent::FolderRequested(1)));
        assert_eq!(d.open_folder(), Some(1));

        // D-pad moves inside the dialog, not the drawer grid.
        d.handle_direction(Direction::Right, Instant::now());
        d.handle_direction(Direction::Down, Instant::now());
        assert_eq!(d.folder_focus(), 4);
        d.handle_direction(Direction::Down, Instant::now());
        assert_eq!(d.folder_focus(), 4);

        let event = d.activate_focused();
        let Some(DrawerEvent::ItemActivated(Entry::App(launched))) = event else {
            panic!("expected an app activation");
        };
        assert_eq!(launched.id, "v");
        assert_eq!(d.open_folder(), None);
    }

    #[test]
    fn back_closes_the_dialog_before_the_drawer() {
        let mut d = drawer(&["a"]);
        d.entries.push(Entry::Folder(Folder {
            name: "Tools".into(),
            apps: vec![app("x")],
        }));
        d.paging.rebind(d.entries.len());
        d.activate_index(1);
        assert_eq!(d.back(), None);
        assert_eq!(d.open_folder(), None);
        assert_eq!(d.back(), Some(DrawerEvent::Dismissed));
    }

    #[test]
    fn reorder_across_the_page_boundary_rebinds_later_pages() {
        let mut d = drawer(&["a", "b", "c", "d", "e", "f", "g", "h"]);
        for page in 0..d.paging.page_count() {
            d.paging.mark_bound(page);
        }
        let event = d.apply_outcome(DragOutcome::Reorder { from: 7, to: 0 }, Instant::now());
        assert_eq!(event, Some(DrawerEvent::ReorderCommitted));
        assert_eq!(d.entries()[0], Entry::App(app("h")));
        assert!(!d.paging.page(0).unwrap().is_bound());
    }
}
