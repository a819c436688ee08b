use std::time::{Duration, Instant};

/// Page settle animation length.
pub const PAGE_SETTLE_MS: u64 = 220;

/// Fraction of a page width a drag must cover to land on the next page.
const FLING_THRESHOLD: f32 = 0.3;

/// Fixed grid dimensions for one drawer session, derived from the display
/// size when the drawer opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGeometry {
    pub columns: usize,
    pub rows: usize,
}

impl GridGeometry {
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns: columns.max(1),
            rows: rows.max(1),
        }
    }

    /// Wider displays get a fourth column, taller ones a fifth row.
    pub fn for_display(width: f32, height: f32) -> Self {
        let columns = if width > 520.0 { 4 } else { 3 };
        let rows = if height > 700.0 { 5 } else { 4 };
        Self::new(columns, rows)
    }

    pub fn items_per_page(&self) -> usize {
        self.columns * self.rows
    }

    pub fn page_of(&self, global: usize) -> usize {
        global / self.items_per_page()
    }

    pub fn local_of(&self, global: usize) -> usize {
        global % self.items_per_page()
    }

    pub fn global_at(&self, page: usize, local: usize) -> usize {
        page * self.items_per_page() + local
    }

    pub fn row_of(&self, local: usize) -> usize {
        local / self.columns
    }

    pub fn col_of(&self, local: usize) -> usize {
        local % self.columns
    }

    pub fn page_count(&self, item_count: usize) -> usize {
        item_count.div_ceil(self.items_per_page())
    }
}

/// One page of the paged grid: a window into the entry sequence plus the
/// per-page view state (whether the UI has drawn it, and the focus slot).
#[derive(Debug, Clone)]
pub struct GridPage {
    start: usize,
    len: usize,
    focused: Option<usize>,
    bound: bool,
}

impl GridPage {
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    pub fn focused(&self) -> Option<usize> {
        self.focused
    }

    pub fn global_at(&self, local: usize) -> Option<usize> {
        (local < self.len).then_some(self.start + local)
    }

    pub fn rows_used(&self, columns: usize) -> usize {
        self.len.div_ceil(columns)
    }

    /// Last occupied column in `row`. Full rows end at `columns - 1`; the
    /// final partial row ends wherever the items run out.
    pub fn last_col_in_row(&self, row: usize, columns: usize) -> Option<usize> {
        let rows = self.rows_used(columns);
        if row >= rows {
            return None;
        }
        if row + 1 < rows {
            Some(columns - 1)
        } else {
            Some((self.len - 1) % columns)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollState {
    Idle,
    Dragging,
    Settling,
}

/// Raised by the container and drained once per frame by the cursor
/// controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    ScrollStateChanged(ScrollState),
    PageSelected(usize),
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    from_pos: f32,
    target: usize,
    started: Instant,
}

/// Paged container over a flat entry sequence.
///
/// Owns the scroll state machine and the page-change event queue. All page
/// data is plain state here; the UI reads pages directly and reports back
/// which ones it has drawn via `mark_bound`.
pub struct PagingContainer {
    geometry: GridGeometry,
    pages: Vec<GridPage>,
    current: usize,
    scroll: ScrollState,
    drag_delta: f32,
    transition: Option<Transition>,
    events: Vec<PageEvent>,
}

impl PagingContainer {
    pub fn new(geometry: GridGeometry, item_count: usize) -> Self {
        let mut container = Self {
            geometry,
            pages: Vec::new(),
            current: 0,
            scroll: ScrollState::Idle,
            drag_delta: 0.0,
            transition: None,
            events: Vec::new(),
        };
        container.rebind(item_count);
        container
    }

    pub fn geometry(&self) -> GridGeometry {
        self.geometry
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn current_page(&self) -> usize {
        self.current
    }

    pub fn scroll_state(&self) -> ScrollState {
        self.scroll
    }

    pub fn page(&self, index: usize) -> Option<&GridPage> {
        self.pages.get(index)
    }

    pub fn items_on_page(&self, index: usize) -> usize {
        self.pages.get(index).map(|p| p.len()).unwrap_or(0)
    }

    pub fn item_count(&self) -> usize {
        self.pages.last().map(|p| p.start() + p.len()).unwrap_or(0)
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some() || self.scroll == ScrollState::Dragging
    }

    /// Rebuild every page for a new item count. View state is reset; the
    /// current page is clamped into range.
    pub fn rebind(&mut self, item_count: usize) {
        self.rebuild_pages(item_count, 0);
        self.drag_delta = 0.0;
        self.transition = None;
        self.scroll = ScrollState::Idle;
    }

    /// Rebuild pages, keeping the view state of pages before
    /// `first_affected` whose contents cannot have changed.
    pub fn refresh_from(&mut self, item_count: usize, first_affected: usize) {
        self.rebuild_pages(item_count, first_affected);
    }

    fn rebuild_pages(&mut self, item_count: usize, keep_before: usize) {
        let per_page = self.geometry.items_per_page();
        let page_count = self.geometry.page_count(item_count);
        let mut pages = Vec::with_capacity(page_count);
        for index in 0..page_count {
            let start = index * per_page;
            let len = per_page.min(item_count - start);
            let (focused, bound) = if index < keep_before {
                match self.pages.get(index) {
                    Some(old) if old.start == start && old.len == len => (old.focused, old.bound),
                    _ => (None, false),
                }
            } else {
                (None, false)
            };
            pages.push(GridPage {
                start,
                len,
                focused,
                bound,
            });
        }
        self.pages = pages;
        self.current = self.current.min(self.pages.len().saturating_sub(1));
    }

    /// The UI calls this for each page it laid out this frame.
    pub fn mark_bound(&mut self, index: usize) {
        if let Some(page) = self.pages.get_mut(index) {
            page.bound = true;
        }
    }

    pub fn clear_focus_all(&mut self) {
        for page in &mut self.pages {
            page.focused = None;
        }
    }

    /// Focus exactly one slot. Fails when the page is missing, not yet
    /// drawn, or the slot is past the page's items; focus is cleared
    /// everywhere either way.
    pub fn set_focus(&mut self, page: usize, local: usize) -> bool {
        self.clear_focus_all();
        match self.pages.get_mut(page) {
            Some(p) if p.bound && local < p.len => {
                p.focused = Some(local);
                true
            }
            _ => false,
        }
    }

    /// Visual scroll position in page units, for rendering.
    pub fn visual_pos(&self, now: Instant) -> f32 {
        if self.scroll == ScrollState::Dragging {
            let max = self.pages.len().saturating_sub(1) as f32;
            return (self.current as f32 - self.drag_delta).clamp(0.0, max);
        }
        match &self.transition {
            Some(t) => {
                let elapsed = now.saturating_duration_since(t.started);
                let frac =
                    (elapsed.as_secs_f32() / settle_duration().as_secs_f32()).clamp(0.0, 1.0);
                let eased = ease_out_cubic(frac);
                t.from_pos + (t.target as f32 - t.from_pos) * eased
            }
            None => self.current as f32,
        }
    }

    pub fn begin_user_drag(&mut self) {
        if self.pages.is_empty() || self.scroll == ScrollState::Dragging {
            return;
        }
        // Grabbing a settling pager lands it on its target immediately.
        if let Some(t) = self.transition.take() {
            self.current = t.target;
        }
        self.drag_delta = 0.0;
        self.scroll = ScrollState::Dragging;
        self.events.push(PageEvent::ScrollStateChanged(ScrollState::Dragging));
    }

    /// Accumulated horizontal drag in page widths; positive means the
    /// finger moved right (toward the previous page).
    pub fn update_user_drag(&mut self, delta_pages: f32) {
        if self.scroll == ScrollState::Dragging {
            self.drag_delta = delta_pages;
        }
    }

    pub fn end_user_drag(&mut self, now: Instant) {
        if self.scroll != ScrollState::Dragging {
            return;
        }
        let target = if self.drag_delta <= -FLING_THRESHOLD {
            (self.current + 1).min(self.pages.len().saturating_sub(1))
        } else if self.drag_delta >= FLING_THRESHOLD {
            self.current.saturating_sub(1)
        } else {
            self.current
        };
        let from_pos = self.current as f32 - self.drag_delta;
        self.drag_delta = 0.0;
        self.scroll = ScrollState::Settling;
        self.events.push(PageEvent::ScrollStateChanged(ScrollState::Settling));
        if target != self.current {
            self.events.push(PageEvent::PageSelected(target));
        }
        self.transition = Some(Transition {
            from_pos,
            target,
            started: now,
        });
    }

    /// Programmatic page change. Animated changes go through
    /// Settling/Idle like a user fling; instant ones only select.
    pub fn set_current_page(&mut self, target: usize, animate: bool, now: Instant) {
        if target >= self.pages.len()
            || target == self.current
            || self.scroll == ScrollState::Dragging
        {
            return;
        }
        if !animate {
            self.current = target;
            self.transition = None;
            self.scroll = ScrollState::Idle;
            self.events.push(PageEvent::PageSelected(target));
            return;
        }
        let from_pos = self.visual_pos(now);
        self.scroll = ScrollState::Settling;
        self.events.push(PageEvent::ScrollStateChanged(ScrollState::Settling));
        self.events.push(PageEvent::PageSelected(target));
        self.transition = Some(Transition {
            from_pos,
            target,
            started: now,
        });
    }

    /// Advance the settle animation; emits Idle when it completes.
    pub fn tick(&mut self, now: Instant) {
        let Some(t) = self.transition else {
            return;
        };
        if now.saturating_duration_since(t.started) >= settle_duration() {
            self.current = t.target;
            self.transition = None;
            self.scroll = ScrollState::Idle;
            self.events.push(PageEvent::ScrollStateChanged(ScrollState::Idle));
        }
    }

    pub fn take_events(&mut self) -> Vec<PageEvent> {
        std::mem::take(&mut self.events)
    }
}

fn settle_duration() -> Duration {
    Duration::from_millis(PAGE_SETTLE_MS)
}

fn ease_out_cubic(t: f32) -> f32 {
    let inv = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inv * inv * inv
}
