use super::entry::Entry;
use eframe::egui::Pos2;
use log::debug;
use std::time::{Duration, Instant};

/// Hold time before a press lifts its entry into a drag.
pub const DRAG_HOLD_MS: u64 = 260;
/// Finger wander allowed while waiting for the hold.
pub const DRAG_MOVE_TOLERANCE: f32 = 18.0;
/// Wander allowed for a release to still count as a tap.
pub const TAP_TOLERANCE: f32 = 20.0;

#[derive(Debug, Clone, Copy)]
struct PressCandidate {
    index: usize,
    started: Instant,
    origin: Pos2,
    pointer: Pos2,
}

#[derive(Debug, Clone, Copy)]
struct ActiveDrag {
    index: usize,
    pointer: Pos2,
}

/// Where the pointer was when the drag ended, as resolved by the UI's
/// hit test against the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// A slot holding an entry, by global index.
    Occupied(usize),
    /// An empty cell of the page grid.
    Empty,
    /// Released outside the drawer bounds.
    Outside,
}

/// What a finished gesture amounts to. Mutations are applied by the
/// caller; the coordinator only classifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    Tap { index: usize },
    Reorder { from: usize, to: usize },
    MergeApps { from: usize, to: usize },
    AddToFolder { from: usize, to: usize },
    DragOut { from: usize },
}

/// Long-press drag state machine for the drawer grid.
#[derive(Default)]
pub struct DragCoordinator {
    press: Option<PressCandidate>,
    drag: Option<ActiveDrag>,
}

impl DragCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dragging(&self) -> Option<usize> {
        self.drag.map(|d| d.index)
    }

    pub fn drag_pointer(&self) -> Option<Pos2> {
        self.drag.map(|d| d.pointer)
    }

    pub fn is_idle(&self) -> bool {
        self.press.is_none() && self.drag.is_none()
    }

    /// Pointer went down on the entry at `index`.
    pub fn note_press(&mut self, index: usize, pos: Pos2, now: Instant) {
        if self.is_idle() {
            self.press = Some(PressCandidate {
                index,
                started: now,
                origin: pos,
                pointer: pos,
            });
        }
    }

    /// Pointer moved while down. A candidate that wanders past the hold
    /// tolerance is handed over to page swiping instead.
    pub fn note_move(&mut self, pos: Pos2) {
        if let Some(drag) = &mut self.drag {
            drag.pointer = pos;
            return;
        }
        if let Some(press) = &mut self.press {
            press.pointer = pos;
            if press.origin.distance(pos) > DRAG_MOVE_TOLERANCE {
                self.press = None;
            }
        }
    }

    /// Promote a held press into a drag. Returns true the moment the
    /// entry lifts.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(press) = self.press else {
            return false;
        };
        if now.saturating_duration_since(press.started) < Duration::from_millis(DRAG_HOLD_MS) {
            return false;
        }
        debug!("drag started on entry {}", press.index);
        self.press = None;
        self.drag = Some(ActiveDrag {
            index: press.index,
            pointer: press.pointer,
        });
        true
    }

    pub fn cancel(&mut self) {
        self.press = None;
        self.drag = None;
    }

    /// Pointer released. Classifies the gesture against the entry
    /// sequence; indices that no longer fit the sequence abort silently.
    pub fn release(&mut self, target: DropTarget, entries: &[Entry]) -> Option<DragOutcome> {
        if let Some(drag) = self.drag.take() {
            self.press = None;
            return classify_drop(drag.index, target, entries);
        }
        let press = self.press.take()?;
        if press.origin.distance(press.pointer) <= TAP_TOLERANCE {
            return Some(DragOutcome::Tap { index: press.index });
        }
        None
    }
}

fn classify_drop(from: usize, target: DropTarget, entries: &[Entry]) -> Option<DragOutcome> {
    if from >= entries.len() {
        debug!("drop aborted, stale source index {from}");
        return None;
    }
    match target {
        DropTarget::Outside => Some(DragOutcome::DragOut { from }),
        DropTarget::Empty => {
            let to = entries.len() - 1;
            (to != from).then_some(DragOutcome::Reorder { from, to })
        }
        DropTarget::Occupied(to) => {
            if to >= entries.len() {
                debug!("drop aborted, stale target index {to}");
                return None;
            }
            if to == from {
                return None;
            }
            match (&entries[from], &entries[to]) {
                (Entry::App(_), Entry::App(_)) => Some(DragOutcome::MergeApps { from, to }),
                (Entry::App(_), Entry::Folder(_)) => Some(DragOutcome::AddToFolder { from, to }),
                (Entry::Folder(_), _) => Some(DragOutcome::Reorder { from, to }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apps::AppInfo;
    use crate::drawer::entry::Folder;

    fn app(id: &str) -> Entry {
        Entry::App(AppInfo {
            name: id.to_string(),
            id: id.to_string(),
            exec: id.to_string(),
            icon: None,
        })
    }

    fn folder(id: &str) -> Entry {
        Entry::Folder(Folder {
            name: "Folder".into(),
            apps: vec![AppInfo {
                name: id.to_string(),
                id: id.to_string(),
                exec: id.to_string(),
                icon: None,
            }],
        })
    }

    fn hold() -> Duration {
        Duration::from_millis(DRAG_HOLD_MS + 10)
    }

    #[test]
    fn quick_release_is_a_tap() {
        let mut drag = DragCoordinator::new();
        let t0 = Instant::now();
        drag.note_press(3, Pos2::new(10.0, 10.0), t0);
        assert!(!drag.tick(t0 + Duration::from_millis(50)));
        let outcome = drag.release(DropTarget::Occupied(3), &[app("a")]);
        assert_eq!(outcome, Some(DragOutcome::Tap { index: 3 }));
        assert!(drag.is_idle());
    }

    #[test]
    fn held_press_lifts_into_a_drag() {
        let mut drag = DragCoordinator::new();
        let t0 = Instant::now();
        drag.note_press(1, Pos2::new(10.0, 10.0), t0);
        assert!(drag.tick(t0 + hold()));
        assert_eq!(drag.dragging(), Some(1));
        // Already lifted; tick reports the start only once.
        assert!(!drag.tick(t0 + hold()));
    }

    #[test]
    fn wandering_press_becomes_a_swipe_not_a_drag() {
        let mut drag = DragCoordinator::new();
        let t0 = Instant::now();
        drag.note_press(1, Pos2::new(10.0, 10.0), t0);
        drag.note_move(Pos2::new(40.0, 10.0));
        assert!(!drag.tick(t0 + hold()));
        assert!(drag.is_idle());
    }

    #[test]
    fn drop_classification() {
        let entries = vec![app("a"), app("b"), folder("f")];
        let lift = |from: usize| {
            let mut drag = DragCoordinator::new();
            let t0 = Instant::now();
            drag.note_press(from, Pos2::ZERO, t0);
            drag.tick(t0 + hold());
            drag
        };

        let mut d = lift(0);
        assert_eq!(
            d.release(DropTarget::Occupied(1), &entries),
            Some(DragOutcome::MergeApps { from: 0, to: 1 })
        );
        let mut d = lift(0);
        assert_eq!(
            d.release(DropTarget::Occupied(2), &entries),
            Some(DragOutcome::AddToFolder { from: 0, to: 2 })
        );
        let mut d = lift(2);
        assert_eq!(
            d.release(DropTarget::Occupied(0), &entries),
            Some(DragOutcome::Reorder { from: 2, to: 0 })
        );
        let mut d = lift(0);
        assert_eq!(
            d.release(DropTarget::Empty, &entries),
            Some(DragOutcome::Reorder { from: 0, to: 2 })
        );
        let mut d = lift(1);
        assert_eq!(d.release(DropTarget::Outside, &entries), Some(DragOutcome::DragOut { from: 1 }));
    }

    #[test]
    fn same_slot_and_stale_indices_abort() {
        let entries = vec![app("a"), app("b")];
        let t0 = Instant::now();

        let mut d = DragCoordinator::new();
        d.note_press(1, Pos2::ZERO, t0);
        d.tick(t0 + hold());
        assert_eq!(d.release(DropTarget::Occupied(1), &entries), None);

        let mut d = DragCoordinator::new();
        d.note_press(5, Pos2::ZERO, t0);
        d.tick(t0 + hold());
        assert_eq!(d.release(DropTarget::Occupied(0), &entries), None);

        let mut d = DragCoordinator::new();
        d.note_press(0, Pos2::ZERO, t0);
        d.tick(t0 + hold());
        assert_eq!(d.release(DropTarget::Occupied(7), &entries), None);
    }
}
