mod state;
mod style;
mod ui;

use crate::apps::{self, AppInfo, AppRepository};
use crate::drawer::entry::Entry;
use crate::drawer::grid::GridGeometry;
use crate::drawer::{DrawerEvent, DrawerState};
use crate::events::{IconRequest, LoadedLayout, UserEvent};
use crate::icons::{self, ICON_SIZE};
use crate::store::{LayoutStore, MAX_PINNED_ITEMS};
use crate::system;
use eframe::egui;
use log::{info, warn};
use state::{IconSlot, Surface, SwipeState};
use std::collections::HashMap;
use std::sync::mpsc::{Receiver, Sender};
use std::time::Instant;
use style::LauncherTheme;

pub const WINDOW_WIDTH: f32 = 360.0;
pub const WINDOW_HEIGHT: f32 = 640.0;

pub struct LauncherApp {
    rx: Receiver<UserEvent>,
    icon_req_tx: Sender<IconRequest>,
    store: LayoutStore,
    repo: AppRepository,
    theme: LauncherTheme,
    surface: Surface,
    loading: bool,
    apps: Vec<AppInfo>,
    drawer_entries: Vec<Entry>,
    pinned: Vec<Entry>,
    drawer: Option<DrawerState>,
    icons: HashMap<String, IconSlot>,
    swipe: Option<SwipeState>,
    pointer_down_at: Option<egui::Pos2>,
}

impl LauncherApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let (tx, rx) = std::sync::mpsc::channel();
        let (icon_req_tx, icon_req_rx) = std::sync::mpsc::channel();
        icons::spawn_icon_worker(icon_req_rx, tx.clone(), cc.egui_ctx.clone());
        spawn_layout_loader(tx, cc.egui_ctx.clone());

        Self {
            rx,
            icon_req_tx,
            store: LayoutStore::new(),
            repo: AppRepository::new(),
            theme: LauncherTheme::default(),
            surface: Surface::Home,
            loading: true,
            apps: Vec::new(),
            drawer_entries: Vec::new(),
            pinned: Vec::new(),
            drawer: None,
            icons: HashMap::new(),
            swipe: None,
            pointer_down_at: None,
        }
    }

    /// Drain the worker channel. The initial load arrives as one event so
    /// the drawer never renders a half-resolved layout.
    fn process_events(&mut self, ctx: &egui::Context, now: Instant) {
        while let Ok(event) = self.rx.try_recv() {
            match event {
                UserEvent::DrawerLoaded(LoadedLayout {
                    apps,
                    drawer,
                    pinned,
                }) => {
                    info!("layout loaded: {} apps, {} drawer entries", apps.len(), drawer.len());
                    self.repo.prime(apps.clone());
                    self.apps = apps;
                    self.drawer_entries = drawer;
                    self.pinned = pinned;
                    self.loading = false;
                    if let Some(drawer) = &mut self.drawer {
                        drawer.reset(self.drawer_entries.clone(), now);
                    }
                }
                UserEvent::IconReady(result) => {
                    let slot = self.icons.entry(result.app_id.clone()).or_default();
                    if let Some(image) = result.image {
                        slot.texture = Some(ctx.load_texture(
                            format!("icon-{}", result.app_id),
                            image,
                            egui::TextureOptions::LINEAR,
                        ));
                    }
                }
            }
        }
    }

    /// Fetch the texture for an app, kicking off a worker request the
    /// first time it is seen.
    fn icon_texture(&mut self, app: &AppInfo) -> Option<egui::TextureHandle> {
        let slot = self.icons.entry(app.id.clone()).or_default();
        if !slot.requested {
            slot.requested = true;
            let request = IconRequest {
                app_id: app.id.clone(),
                icon_name: app.icon.clone(),
                size: ICON_SIZE,
            };
            if self.icon_req_tx.send(request).is_err() {
                warn!("icon worker is gone");
            }
        }
        slot.texture.clone()
    }

    fn open_drawer(&mut self, ctx: &egui::Context, by_touch: bool, now: Instant) {
        if !self.loading {
            // The repository's TTL keeps this a cache hit in the common
            // case; an expired cache picks up installs and removals.
            let apps = self.repo.list_apps();
            if apps != self.apps {
                self.apps = apps;
                self.drawer_entries = self.store.load_drawer(&self.apps);
                self.pinned = self.store.load_pinned(&self.apps);
            }
        }
        let screen = ctx.screen_rect();
        let geometry = GridGeometry::for_display(screen.width(), screen.height());
        let mut drawer = DrawerState::new(self.drawer_entries.clone(), geometry, by_touch);
        drawer.cursor.reset_after_load(&mut drawer.paging, now);
        self.drawer = Some(drawer);
        self.surface = Surface::Drawer;
        self.swipe = None;
        self.pointer_down_at = None;
    }

    fn close_drawer(&mut self) {
        self.drawer = None;
        self.surface = Surface::Home;
        self.swipe = None;
        self.pointer_down_at = None;
    }

    /// React to what the drawer session reported. Layout mutations are
    /// mirrored into the host copy and persisted here.
    fn handle_drawer_event(&mut self, event: DrawerEvent, now: Instant) {
        match event {
            DrawerEvent::ItemActivated(Entry::App(app)) => {
                if system::launch_app(&app) {
                    self.close_drawer();
                }
            }
            DrawerEvent::ItemActivated(Entry::Folder(_)) => {}
            DrawerEvent::FolderRequested(index) => {
                info!("folder dialog opened for entry {index}");
            }
            DrawerEvent::ReorderCommitted
            | DrawerEvent::FolderCreated { .. }
            | DrawerEvent::FolderMerged { .. } => {
                self.sync_drawer_entries();
            }
            DrawerEvent::DraggedOut { entry, from } => {
                if absorb_dragged_out(&mut self.pinned, self.drawer.as_mut(), entry, from, now) {
                    self.store.save_pinned(&self.pinned);
                }
                self.sync_drawer_entries();
            }
            DrawerEvent::Dismissed => self.close_drawer(),
        }
    }

    fn sync_drawer_entries(&mut self) {
        if let Some(drawer) = &self.drawer {
            self.drawer_entries = drawer.entries().to_vec();
            self.store.save_drawer(&self.drawer_entries);
        }
    }

    /// Hide an app from the drawer for good (context-menu action).
    fn hide_app(&mut self, index: usize, now: Instant) {
        let Some(drawer) = &mut self.drawer else {
            return;
        };
        let Some(Entry::App(app)) = drawer.entry(index).cloned() else {
            return;
        };
        self.store.hide_app(&app.id);
        drawer.remove_index(index, now);
        self.sync_drawer_entries();
    }

    fn unpin(&mut self, index: usize) {
        if index < self.pinned.len() {
            self.pinned.remove(index);
            self.store.save_pinned(&self.pinned);
        }
    }
}

/// A drawer entry was dragged out toward the pinned row. Returns true when
/// it was pinned; a full row puts the entry back where it came from, so a
/// dragged-out folder is never lost.
fn absorb_dragged_out(
    pinned: &mut Vec<Entry>,
    drawer: Option<&mut DrawerState>,
    entry: Entry,
    from: usize,
    now: Instant,
) -> bool {
    if pinned.len() < MAX_PINNED_ITEMS {
        info!("pinning {}", entry.label());
        pinned.push(entry);
        return true;
    }
    warn!("pinned row is full, {} stays in the drawer", entry.label());
    if let Some(drawer) = drawer {
        drawer.insert_index(from, entry, now);
    }
    false
}

/// Initial load, off the UI thread: scan apps, resolve both layouts,
/// deliver everything in one message.
fn spawn_layout_loader(tx: Sender<UserEvent>, ctx: egui::Context) {
    std::thread::spawn(move || {
        let store = LayoutStore::new();
        let apps = apps::scan_installed_apps();
        let drawer = store.load_drawer(&apps);
        let pinned = store.load_pinned(&apps);
        let layout = LoadedLayout {
            apps,
            drawer,
            pinned,
        };
        if tx.send(UserEvent::DrawerLoaded(layout)).is_ok() {
            ctx.request_repaint();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawer::drag::DragOutcome;
    use crate::drawer::entry::Folder;

    fn app(id: &str) -> AppInfo {
        AppInfo {
            name: id.to_string(),
            id: id.to_string(),
            exec: id.to_string(),
            icon: None,
        }
    }

    fn folder(name: &str, ids: &[&str]) -> Entry {
        Entry::Folder(Folder {
            name: name.to_string(),
            apps: ids.iter().map(|id| app(id)).collect(),
        })
    }

    #[test]
    fn dragged_out_entry_is_pinned_while_the_row_has_room() {
        let mut drawer = DrawerState::new(
            vec![Entry::App(app("a")), Entry::App(app("b"))],
            GridGeometry::new(3, 2),
            true,
        );
        let mut pinned = vec![Entry::App(app("p0"))];
        let now = Instant::now();

        let event = drawer.apply_outcome(DragOutcome::DragOut { from: 1 }, now);
        let Some(DrawerEvent::DraggedOut { entry, from }) = event else {
            panic!("expected a drag-out");
        };
        assert!(absorb_dragged_out(&mut pinned, Some(&mut drawer), entry, from, now));
        assert_eq!(pinned.len(), 2);
        assert_eq!(pinned[1], Entry::App(app("b")));
        assert_eq!(drawer.entries(), [Entry::App(app("a"))]);
    }

    #[test]
    fn full_pinned_row_returns_the_entry_to_its_slot() {
        let mut drawer = DrawerState::new(
            vec![
                Entry::App(app("a")),
                folder("Tools", &["x", "y"]),
                Entry::App(app("c")),
            ],
            GridGeometry::new(3, 2),
            true,
        );
        let pinned_before: Vec<Entry> = (0..MAX_PINNED_ITEMS)
            .map(|i| Entry::App(app(&format!("p{i}"))))
            .collect();
        let mut pinned = pinned_before.clone();
        let now = Instant::now();

        let event = drawer.apply_outcome(DragOutcome::DragOut { from: 1 }, now);
        let Some(DrawerEvent::DraggedOut { entry, from }) = event else {
            panic!("expected a drag-out");
        };
        assert_eq!(drawer.entries().len(), 2);

        assert!(!absorb_dragged_out(&mut pinned, Some(&mut drawer), entry, from, now));
        assert_eq!(pinned, pinned_before);
        assert_eq!(drawer.entries().len(), 3);
        assert_eq!(drawer.entries()[1], folder("Tools", &["x", "y"]));
        assert_eq!(drawer.paging.item_count(), 3);
    }
}
