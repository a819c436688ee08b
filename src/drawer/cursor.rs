use super::grid::{PageEvent, PagingContainer, ScrollState};
use log::debug;
use std::time::{Duration, Instant};

/// Delay between a page settling and the cursor highlight reappearing.
pub const FOCUS_APPLY_DELAY_MS: u64 = 100;
/// Delay after focus apply before d-pad input unlocks again.
pub const LOCK_RELEASE_DELAY_MS: u64 = 100;
/// Retry delay when the focus target page has not been drawn yet.
pub const FOCUS_RETRY_DELAY_MS: u64 = 50;
/// Delay before the cursor first appears after the drawer loads.
pub const INITIAL_FOCUS_DELAY_MS: u64 = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Touch,
    Dpad,
}

/// Transition lock. Anything other than Idle drops incoming d-pad input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    TransitioningUser,
    TransitioningProgrammatic,
}

/// Cross-page move waiting for its target page to be selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingNav {
    pub direction: Direction,
    pub source_row: usize,
    pub source_col: usize,
    pub target_page: usize,
    pub target_global: usize,
}

#[derive(Debug, Clone, Copy)]
enum TimerAction {
    ApplyFocus { retry: bool },
    ReleaseLock,
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    fire_at: Instant,
    epoch: u64,
    action: TimerAction,
}

/// The single authoritative cursor over the paged grid.
///
/// All deferred work (focus apply, focus retry, lock release) lives in a
/// small timer list tagged with an epoch; starting a new transition bumps
/// the epoch so timers from the superseded transition fizzle in `tick`.
pub struct CursorController {
    cursor: usize,
    mode: InputMode,
    phase: Phase,
    pending_nav: Option<PendingNav>,
    pre_transition: Option<(usize, usize)>,
    epoch: u64,
    timers: Vec<Timer>,
}

impl CursorController {
    pub fn new(mode: InputMode) -> Self {
        Self {
            cursor: 0,
            mode,
            phase: Phase::Idle,
            pending_nav: None,
            pre_transition: None,
            epoch: 0,
            timers: Vec::new(),
        }
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn input_mode(&self) -> InputMode {
        self.mode
    }

    pub fn is_locked(&self) -> bool {
        self.phase != Phase::Idle
    }

    pub fn pending_nav(&self) -> Option<PendingNav> {
        self.pending_nav
    }

    /// Index the cursor highlights, if the cursor is active at all.
    pub fn focused_index(&self, paging: &PagingContainer) -> Option<usize> {
        if self.mode == InputMode::Touch || paging.item_count() == 0 {
            return None;
        }
        Some(self.cursor.min(paging.item_count() - 1))
    }

    /// Called once the freshly loaded entry sequence is in place.
    pub fn reset_after_load(&mut self, paging: &mut PagingContainer, now: Instant) {
        self.cursor = 0;
        self.pending_nav = None;
        self.pre_transition = None;
        self.phase = Phase::Idle;
        self.epoch += 1;
        paging.clear_focus_all();
        if self.mode == InputMode::Dpad {
            self.schedule(
                TimerAction::ApplyFocus { retry: true },
                INITIAL_FOCUS_DELAY_MS,
                now,
            );
        }
    }

    /// Any touch contact hides the cursor and puts the drawer in touch
    /// mode until the next d-pad key.
    pub fn note_touch_down(&mut self, paging: &mut PagingContainer) {
        if self.mode != InputMode::Touch {
            self.mode = InputMode::Touch;
            paging.clear_focus_all();
        }
    }

    /// One d-pad key. Dropped while a transition lock is held. In touch
    /// mode the cursor first snaps to the top-left of the visible page,
    /// then the move applies from there.
    pub fn handle_direction(
        &mut self,
        direction: Direction,
        paging: &mut PagingContainer,
        now: Instant,
    ) {
        if self.phase != Phase::Idle {
            debug!("d-pad {direction:?} dropped while locked");
            return;
        }
        let count = paging.item_count();
        if count == 0 {
            return;
        }
        if self.mode == InputMode::Touch {
            self.mode = InputMode::Dpad;
            let start = paging
                .page(paging.current_page())
                .map(|p| p.start())
                .unwrap_or(0);
            self.cursor = start.min(count - 1);
            self.apply_focus(paging, true, now);
        }
        self.move_cursor(direction, paging, now);
    }

    fn move_cursor(&mut self, direction: Direction, paging: &mut PagingContainer, now: Instant) {
        let g = paging.geometry();
        let count = paging.item_count();
        let cursor = self.cursor.min(count - 1);
        let page = g.page_of(cursor);
        let local = g.local_of(cursor);
        let row = g.row_of(local);
        let col = g.col_of(local);
        let page_len = paging.items_on_page(page);

        match direction {
            Direction::Left => {
                if col > 0 {
                    self.set_cursor(cursor - 1, paging, now);
                } else if page > 0 {
                    self.start_cross_page(direction, page - 1, row, col, paging, now);
                }
            }
            Direction::Right => {
                if col + 1 < g.columns && local + 1 < page_len {
                    self.set_cursor(cursor + 1, paging, now);
                } else if page + 1 < paging.page_count() {
                    self.start_cross_page(direction, page + 1, row, col, paging, now);
                }
            }
            Direction::Up => {
                if row > 0 {
                    self.set_cursor(cursor - g.columns, paging, now);
                }
            }
            Direction::Down => {
                if row + 1 < g.rows && local + g.columns < page_len {
                    self.set_cursor(cursor + g.columns, paging, now);
                }
            }
        }
    }

    fn set_cursor(&mut self, global: usize, paging: &mut PagingContainer, now: Instant) {
        self.cursor = global;
        self.pending_nav = None;
        self.apply_focus(paging, true, now);
    }

    /// Phase one of a cross-page move: record where the cursor should land
    /// and start the page animation. Phase two happens when the target
    /// page's selection event arrives.
    fn start_cross_page(
        &mut self,
        direction: Direction,
        target_page: usize,
        source_row: usize,
        source_col: usize,
        paging: &mut PagingContainer,
        now: Instant,
    ) {
        let g = paging.geometry();
        let seed_col = match direction {
            Direction::Left => g.columns - 1,
            Direction::Right => 0,
            _ => return,
        };
        let Some(target_global) =
            resolve_equivalent_position(paging, target_page, source_row, seed_col)
        else {
            return;
        };
        self.pending_nav = Some(PendingNav {
            direction,
            source_row,
            source_col,
            target_page,
            target_global,
        });
        debug!("cross-page {direction:?} to page {target_page}, landing at {target_global}");
        self.begin_transition(Phase::TransitioningProgrammatic, paging);
        paging.clear_focus_all();
        paging.set_current_page(target_page, true, now);
    }

    fn begin_transition(&mut self, phase: Phase, paging: &PagingContainer) {
        self.pre_transition = Some((paging.current_page(), self.cursor));
        self.phase = phase;
        self.epoch += 1;
    }

    /// Feed the container's page events through the state machine. Must
    /// run every frame, after the container has been ticked.
    pub fn on_page_events(
        &mut self,
        events: &[PageEvent],
        paging: &mut PagingContainer,
        now: Instant,
    ) {
        for &event in events {
            match event {
                PageEvent::ScrollStateChanged(ScrollState::Dragging) => {
                    // A swipe always means a finger on the glass.
                    self.mode = InputMode::Touch;
                    self.pending_nav = None;
                    self.begin_transition(Phase::TransitioningUser, paging);
                    paging.clear_focus_all();
                }
                PageEvent::ScrollStateChanged(ScrollState::Settling) => {
                    if self.phase == Phase::Idle {
                        self.begin_transition(Phase::TransitioningUser, paging);
                    }
                }
                PageEvent::PageSelected(page) => {
                    paging.clear_focus_all();
                    if self.mode != InputMode::Dpad {
                        continue;
                    }
                    match self.pending_nav {
                        Some(nav) if nav.target_page == page => {
                            self.cursor = nav.target_global;
                            self.pending_nav = None;
                        }
                        _ => {
                            // Page changed without an intent; carry the
                            // cursor to the equivalent slot.
                            if let Some((from_page, old_global)) = self.pre_transition {
                                if from_page != page {
                                    let g = paging.geometry();
                                    let local = g.local_of(old_global);
                                    if let Some(resolved) = resolve_equivalent_position(
                                        paging,
                                        page,
                                        g.row_of(local),
                                        g.col_of(local),
                                    ) {
                                        self.cursor = resolved;
                                    }
                                }
                            }
                        }
                    }
                }
                PageEvent::ScrollStateChanged(ScrollState::Idle) => {
                    self.pre_transition = None;
                    if self.mode == InputMode::Dpad {
                        self.schedule(
                            TimerAction::ApplyFocus { retry: true },
                            FOCUS_APPLY_DELAY_MS,
                            now,
                        );
                        self.schedule(
                            TimerAction::ReleaseLock,
                            FOCUS_APPLY_DELAY_MS + LOCK_RELEASE_DELAY_MS,
                            now,
                        );
                    } else {
                        paging.clear_focus_all();
                        self.schedule(TimerAction::ReleaseLock, LOCK_RELEASE_DELAY_MS, now);
                    }
                }
            }
        }
    }

    /// Drain due timers. Timers whose epoch predates the newest transition
    /// are dropped unfired.
    pub fn tick(&mut self, paging: &mut PagingContainer, now: Instant) {
        if self.timers.is_empty() {
            return;
        }
        let mut due = Vec::new();
        self.timers.retain(|timer| {
            if timer.fire_at <= now {
                due.push(*timer);
                false
            } else {
                true
            }
        });
        for timer in due {
            if timer.epoch != self.epoch {
                continue;
            }
            match timer.action {
                TimerAction::ApplyFocus { retry } => self.apply_focus(paging, retry, now),
                TimerAction::ReleaseLock => self.phase = Phase::Idle,
            }
        }
    }

    /// Earliest pending deadline, for repaint scheduling.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers
            .iter()
            .filter(|t| t.epoch == self.epoch)
            .map(|t| t.fire_at)
            .min()
    }

    /// Re-seat the focus after the entry sequence changed underneath.
    pub fn refresh_focus(&mut self, paging: &mut PagingContainer, now: Instant) {
        self.apply_focus(paging, true, now);
    }

    fn apply_focus(&mut self, paging: &mut PagingContainer, allow_retry: bool, now: Instant) {
        let count = paging.item_count();
        if self.mode == InputMode::Touch || count == 0 {
            paging.clear_focus_all();
            return;
        }
        self.cursor = self.cursor.min(count - 1);
        let g = paging.geometry();
        let page = g.page_of(self.cursor);
        let local = g.local_of(self.cursor);
        if !paging.set_focus(page, local) && allow_retry {
            // Target page not drawn yet; one retry, then give up. The
            // cursor value stays correct either way.
            self.schedule(
                TimerAction::ApplyFocus { retry: false },
                FOCUS_RETRY_DELAY_MS,
                now,
            );
        }
    }

    fn schedule(&mut self, action: TimerAction, delay_ms: u64, now: Instant) {
        self.timers.push(Timer {
            fire_at: now + Duration::from_millis(delay_ms),
            epoch: self.epoch,
            action,
        });
    }
}

/// Map a (row, col) position onto `page`, clamping the row into the page's
/// occupied rows and the column onto that row's occupied slots. Used both
/// for cross-page landing targets and for carrying the cursor across page
/// changes that happened without an intent.
pub fn resolve_equivalent_position(
    paging: &PagingContainer,
    page: usize,
    row: usize,
    col: usize,
) -> Option<usize> {
    let g = paging.geometry();
    let grid = paging.page(page)?;
    if grid.is_empty() {
        return None;
    }
    let row = row.min(grid.rows_used(g.columns) - 1);
    let col = col.min(grid.last_col_in_row(row, g.columns)?);
    Some(g.global_at(page, row * g.columns + col))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawer::grid::GridGeometry;

    // 3 columns x 2 rows, 10 items: page 0 holds 0..=5, page 1 holds 6..=9.
    fn setup(count: usize) -> (PagingContainer, CursorController, Instant) {
        let mut paging = PagingContainer::new(GridGeometry::new(3, 2), count);
        for page in 0..paging.page_count() {
            paging.mark_bound(page);
        }
        (paging, CursorController::new(InputMode::Dpad), Instant::now())
    }

    fn pump(ctrl: &mut CursorController, paging: &mut PagingContainer, now: Instant) {
        let events = paging.take_events();
        ctrl.on_page_events(&events, paging, now);
    }

    fn settle(
        ctrl: &mut CursorController,
        paging: &mut PagingContainer,
        now: Instant,
    ) -> Instant {
        let mut t = now;
        for _ in 0..8 {
            t += Duration::from_millis(120);
            paging.tick(t);
            pump(ctrl, paging, t);
            ctrl.tick(paging, t);
        }
        t
    }

    fn move_to(ctrl: &mut CursorController, global: usize) {
        ctrl.cursor = global;
    }

    #[test]
    fn right_from_slot_five_lands_on_nine() {
        let (mut paging, mut ctrl, t0) = setup(10);
        move_to(&mut ctrl, 5);
        ctrl.handle_direction(Direction::Right, &mut paging, t0);
        assert!(ctrl.is_locked());
        let nav = ctrl.pending_nav();
        pump(&mut ctrl, &mut paging, t0);
        assert_eq!(
            nav,
            Some(PendingNav {
                direction: Direction::Right,
                source_row: 1,
                source_col: 2,
                target_page: 1,
                target_global: 9,
            })
        );
        assert_eq!(ctrl.position(), 9);
        assert!(ctrl.pending_nav().is_none());
        let _ = settle(&mut ctrl, &mut paging, t0);
        assert!(!ctrl.is_locked());
        assert_eq!(paging.current_page(), 1);
        assert_eq!(paging.page(1).unwrap().focused(), Some(3));
    }

    #[test]
    fn left_from_shorter_page_targets_last_occupied_column() {
        let (mut paging, mut ctrl, t0) = setup(10);
        paging.set_current_page(1, false, t0);
        let _ = paging.take_events();
        move_to(&mut ctrl, 9);
        ctrl.handle_direction(Direction::Left, &mut paging, t0);
        pump(&mut ctrl, &mut paging, t0);
        // Row 1 on page 0 is fully occupied, so the landing column is 2.
        assert_eq!(ctrl.position(), 5);
        let _ = settle(&mut ctrl, &mut paging, t0);
        assert_eq!(paging.current_page(), 0);
        assert_eq!(paging.page(0).unwrap().focused(), Some(5));
    }

    #[test]
    fn edge_moves_are_no_ops() {
        let (mut paging, mut ctrl, t0) = setup(10);
        // Top-left corner of the first page.
        ctrl.handle_direction(Direction::Left, &mut paging, t0);
        ctrl.handle_direction(Direction::Up, &mut paging, t0);
        assert_eq!(ctrl.position(), 0);
        assert!(!ctrl.is_locked());

        // Last item overall: right and down have nowhere to go.
        move_to(&mut ctrl, 9);
        paging.set_current_page(1, false, t0);
        let _ = paging.take_events();
        ctrl.handle_direction(Direction::Down, &mut paging, t0);
        assert_eq!(ctrl.position(), 9);
        move_to(&mut ctrl, 8);
        ctrl.handle_direction(Direction::Right, &mut paging, t0);
        assert_eq!(ctrl.position(), 8);
        assert!(ctrl.pending_nav().is_none());
    }

    #[test]
    fn down_into_a_missing_slot_is_a_no_op() {
        // 8 items: page 0 is full, so down from slot 1 works but down
        // from slot 4 would leave the page.
        let (mut paging, mut ctrl, t0) = setup(8);
        move_to(&mut ctrl, 1);
        ctrl.handle_direction(Direction::Down, &mut paging, t0);
        assert_eq!(ctrl.position(), 4);
        ctrl.handle_direction(Direction::Down, &mut paging, t0);
        assert_eq!(ctrl.position(), 4);
    }

    #[test]
    fn input_is_dropped_while_locked() {
        let (mut paging, mut ctrl, t0) = setup(10);
        move_to(&mut ctrl, 5);
        ctrl.handle_direction(Direction::Right, &mut paging, t0);
        pump(&mut ctrl, &mut paging, t0);
        assert!(ctrl.is_locked());
        ctrl.handle_direction(Direction::Up, &mut paging, t0);
        assert_eq!(ctrl.position(), 9);
        let _ = settle(&mut ctrl, &mut paging, t0);
        assert!(!ctrl.is_locked());
        ctrl.handle_direction(Direction::Up, &mut paging, t0 + Duration::from_secs(2));
        assert_eq!(ctrl.position(), 6);
    }

    #[test]
    fn touch_down_hides_cursor_and_first_key_snaps_to_page_start() {
        let (mut paging, mut ctrl, t0) = setup(10);
        move_to(&mut ctrl, 4);
        ctrl.note_touch_down(&mut paging);
        assert_eq!(ctrl.input_mode(), InputMode::Touch);
        assert!(ctrl.focused_index(&paging).is_none());

        paging.set_current_page(1, false, t0);
        let _ = paging.take_events();
        ctrl.handle_direction(Direction::Right, &mut paging, t0);
        assert_eq!(ctrl.input_mode(), InputMode::Dpad);
        // Snapped to slot 6, then moved right once.
        assert_eq!(ctrl.position(), 7);
    }

    #[test]
    fn swipe_forces_touch_mode_and_unlocks_after_idle() {
        let (mut paging, mut ctrl, t0) = setup(10);
        paging.begin_user_drag();
        paging.update_user_drag(-0.6);
        paging.end_user_drag(t0);
        pump(&mut ctrl, &mut paging, t0);
        assert_eq!(ctrl.input_mode(), InputMode::Touch);
        assert!(ctrl.is_locked());
        let _ = settle(&mut ctrl, &mut paging, t0);
        assert!(!ctrl.is_locked());
        assert!(ctrl.focused_index(&paging).is_none());
    }

    #[test]
    fn stale_timers_do_not_fire_after_a_new_transition() {
        let (mut paging, mut ctrl, t0) = setup(20);
        move_to(&mut ctrl, 5);
        ctrl.handle_direction(Direction::Right, &mut paging, t0);
        pump(&mut ctrl, &mut paging, t0);

        // Let the page settle; the idle handler queues focus apply and
        // lock release for the current epoch.
        let t1 = t0 + Duration::from_millis(250);
        paging.tick(t1);
        pump(&mut ctrl, &mut paging, t1);
        assert!(ctrl.is_locked());

        // The user grabs the pager before those timers fire.
        paging.begin_user_drag();
        pump(&mut ctrl, &mut paging, t1);
        assert!(ctrl.is_locked());

        // The superseded release timer comes due but must not unlock.
        ctrl.tick(&mut paging, t1 + Duration::from_millis(300));
        assert!(ctrl.is_locked());

        // Releasing the drag settles back and unlocks normally.
        let t2 = t1 + Duration::from_millis(310);
        paging.end_user_drag(t2);
        pump(&mut ctrl, &mut paging, t2);
        let _ = settle(&mut ctrl, &mut paging, t2);
        assert!(!ctrl.is_locked());
    }

    #[test]
    fn focus_on_unbound_page_retries_once() {
        let mut paging = PagingContainer::new(GridGeometry::new(3, 2), 10);
        paging.mark_bound(0);
        let mut ctrl = CursorController::new(InputMode::Dpad);
        let t0 = Instant::now();
        ctrl.reset_after_load(&mut paging, t0);
        let t1 = t0 + Duration::from_millis(INITIAL_FOCUS_DELAY_MS + 1);
        ctrl.tick(&mut paging, t1);
        assert_eq!(paging.page(0).unwrap().focused(), Some(0));

        // Jump the cursor onto the unbound page and re-apply.
        move_to(&mut ctrl, 8);
        ctrl.handle_direction(Direction::Left, &mut paging, t1);
        assert_eq!(ctrl.position(), 7);
        assert_eq!(paging.page(1).unwrap().focused(), None);
        // The retry lands once the page has been drawn.
        paging.mark_bound(1);
        let t2 = t1 + Duration::from_millis(FOCUS_RETRY_DELAY_MS + 1);
        ctrl.tick(&mut paging, t2);
        assert_eq!(paging.page(1).unwrap().focused(), Some(1));
    }

    #[test]
    fn empty_sequence_never_moves_or_panics() {
        let (mut paging, mut ctrl, t0) = setup(0);
        ctrl.reset_after_load(&mut paging, t0);
        for dir in [
            Direction::Left,
            Direction::Right,
            Direction::Up,
            Direction::Down,
        ] {
            ctrl.handle_direction(dir, &mut paging, t0);
        }
        assert_eq!(ctrl.position(), 0);
        assert!(ctrl.focused_index(&paging).is_none());
        ctrl.tick(&mut paging, t0 + Duration::from_secs(1));
    }

    #[test]
    fn resolve_clamps_row_then_column() {
        let (paging, _, _) = setup(10);
        // Page 1 has 4 items in rows [3 wide, 1 wide].
        assert_eq!(resolve_equivalent_position(&paging, 1, 0, 2), Some(8));
        assert_eq!(resolve_equivalent_position(&paging, 1, 1, 2), Some(9));
        assert_eq!(resolve_equivalent_position(&paging, 1, 5, 1), Some(9));
        assert_eq!(resolve_equivalent_position(&paging, 2, 0, 0), None);
    }
}
