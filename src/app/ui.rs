use super::state::{Surface, SwipeState};
use super::style::{
    LauncherTheme, CELL_ROUNDING, CONTENT_PADDING, HEADER_HEIGHT, ICON_SIDE, INDICATOR_RADIUS,
    PINNED_SLOT,
};
use super::LauncherApp;
use crate::drawer::cursor::{Direction, InputMode};
use crate::drawer::drag::{DropTarget, DRAG_MOVE_TOLERANCE};
use crate::drawer::entry::{self, Entry};
use crate::drawer::DrawerEvent;
use crate::system;
use chrono::Local;
use eframe::egui;
use std::time::{Duration, Instant};

const INDICATOR_STRIP: f32 = 26.0;

impl eframe::App for LauncherApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.process_events(ctx, now);
        match self.surface {
            Surface::Home => self.draw_home(ctx, now),
            Surface::Drawer => self.draw_drawer(ctx, now),
        }
    }
}

impl LauncherApp {
    fn draw_home(&mut self, ctx: &egui::Context, now: Instant) {
        let theme = self.theme;

        // Any d-pad key re-enters the drawer cursor-first.
        let dpad_pressed = ctx.input(|i| {
            i.key_pressed(egui::Key::ArrowLeft)
                || i.key_pressed(egui::Key::ArrowRight)
                || i.key_pressed(egui::Key::ArrowUp)
                || i.key_pressed(egui::Key::ArrowDown)
                || i.key_pressed(egui::Key::Enter)
        });
        if dpad_pressed && !self.loading {
            self.open_drawer(ctx, false, now);
            return;
        }

        let mut launch: Option<crate::apps::AppInfo> = None;
        let mut unpin: Option<usize> = None;
        let mut reorder: Option<(usize, usize)> = None;
        let mut open_apps = false;
        let pinned = self.pinned.clone();

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(theme.home_bg))
            .show(ctx, |ui| {
                ui.add_space(ui.available_height() * 0.18);
                ui.vertical_centered(|ui| {
                    ui.label(
                        egui::RichText::new(Local::now().format("%H:%M").to_string())
                            .size(64.0)
                            .color(theme.header_text),
                    );
                    ui.label(
                        egui::RichText::new(Local::now().format("%A, %B %d").to_string())
                            .size(16.0)
                            .color(theme.label_dim),
                    );
                });

                let bottom = ui.available_height();
                ui.add_space((bottom - PINNED_SLOT - 72.0).max(12.0));

                ui.horizontal(|ui| {
                    let total = pinned.len() as f32 * (PINNED_SLOT + 8.0);
                    ui.add_space(((ui.available_width() - total) * 0.5).max(0.0));
                    for (index, entry) in pinned.iter().enumerate() {
                        // Each slot doubles as a drag source so the row
                        // can be rearranged by hand.
                        let slot = ui.dnd_drag_source(
                            egui::Id::new(("pinned-slot", index)),
                            index,
                            |ui| match entry {
                                Entry::App(app) => {
                                    let texture = self.icon_texture(app);
                                    let button = match &texture {
                                        Some(tex) => egui::Button::image(
                                            egui::Image::new(tex).fit_to_exact_size(egui::vec2(
                                                ICON_SIDE, ICON_SIDE,
                                            )),
                                        ),
                                        None => egui::Button::new(
                                            egui::RichText::new(initial_of(&app.name))
                                                .size(22.0)
                                                .color(theme.label_color),
                                        ),
                                    };
                                    let resp = ui
                                        .add_sized([PINNED_SLOT, PINNED_SLOT], button)
                                        .on_hover_text(&app.name);
                                    if resp.clicked() {
                                        launch = Some(app.clone());
                                    }
                                    resp.context_menu(|ui| {
                                        if ui.button("Unpin").clicked() {
                                            unpin = Some(index);
                                            ui.close_menu();
                                        }
                                    });
                                }
                                Entry::Folder(folder) => {
                                    let resp = ui.menu_button(
                                        egui::RichText::new(&folder.name)
                                            .color(theme.label_color),
                                        |ui| {
                                            for app in &folder.apps {
                                                if ui.button(&app.name).clicked() {
                                                    launch = Some(app.clone());
                                                    ui.close_menu();
                                                }
                                            }
                                        },
                                    );
                                    resp.response.context_menu(|ui| {
                                        if ui.button("Unpin").clicked() {
                                            unpin = Some(index);
                                            ui.close_menu();
                                        }
                                    });
                                }
                            },
                        );
                        if let Some(from) = slot.response.dnd_release_payload::<usize>() {
                            if *from != index {
                                reorder = Some((*from, index));
                            }
                        }
                        ui.add_space(8.0);
                    }
                });

                ui.add_space(12.0);
                ui.vertical_centered(|ui| {
                    let label = if self.loading { "Loading..." } else { "Apps" };
                    let button = egui::Button::new(
                        egui::RichText::new(label).size(18.0).color(theme.header_text),
                    )
                    .min_size(egui::vec2(160.0, 40.0));
                    if ui.add_enabled(!self.loading, button).clicked() {
                        open_apps = true;
                    }
                });
            });

        if let Some(app) = launch {
            system::launch_app(&app);
        }
        if let Some(index) = unpin {
            self.unpin(index);
        }
        if let Some((from, to)) = reorder {
            if entry::reorder(&mut self.pinned, from, to) {
                self.store.save_pinned(&self.pinned);
            }
        }
        if open_apps {
            self.open_drawer(ctx, true, now);
        }

        // Keep the clock honest.
        ctx.request_repaint_after(Duration::from_secs(1));
    }

    fn draw_drawer(&mut self, ctx: &egui::Context, now: Instant) {
        let theme = self.theme;
        let Some(mut drawer) = self.drawer.take() else {
            self.surface = Surface::Home;
            return;
        };

        drawer.tick(now);

        let mut events: Vec<DrawerEvent> = Vec::new();
        let mut hide_request: Option<usize> = None;

        // D-pad first; pointer input may override the mode below.
        ctx.input(|i| {
            let mut key = |k: egui::Key, d: Direction| {
                if i.key_pressed(k) {
                    drawer.handle_direction(d, now);
                }
            };
            key(egui::Key::ArrowLeft, Direction::Left);
            key(egui::Key::ArrowRight, Direction::Right);
            key(egui::Key::ArrowUp, Direction::Up);
            key(egui::Key::ArrowDown, Direction::Down);
        });
        if ctx.input(|i| i.key_pressed(egui::Key::Enter)) {
            if let Some(event) = drawer.activate_focused() {
                events.push(event);
            }
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Escape) || i.key_pressed(egui::Key::Backspace)) {
            if let Some(event) = drawer.back() {
                events.push(event);
            }
        }

        let pointer_pos = ctx.input(|i| i.pointer.interact_pos());
        let primary_pressed = ctx.input(|i| i.pointer.primary_pressed());
        let primary_down = ctx.input(|i| i.pointer.primary_down());
        let primary_released = ctx.input(|i| i.pointer.primary_released());
        let dialog_open = drawer.open_folder().is_some();

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(theme.drawer_bg))
            .show(ctx, |ui| {
                let panel_rect = ui.max_rect();
                let painter = ui.painter();

                let header_rect = egui::Rect::from_min_max(
                    panel_rect.min,
                    egui::pos2(panel_rect.max.x, panel_rect.min.y + HEADER_HEIGHT),
                );
                painter.text(
                    egui::pos2(header_rect.min.x + CONTENT_PADDING, header_rect.center().y),
                    egui::Align2::LEFT_CENTER,
                    "Apps",
                    egui::FontId::proportional(20.0),
                    theme.header_text,
                );
                if drawer.paging.page_count() > 1 {
                    painter.text(
                        egui::pos2(header_rect.max.x - CONTENT_PADDING, header_rect.center().y),
                        egui::Align2::RIGHT_CENTER,
                        format!(
                            "{}/{}",
                            drawer.paging.current_page() + 1,
                            drawer.paging.page_count()
                        ),
                        egui::FontId::proportional(14.0),
                        theme.label_dim,
                    );
                }

                let grid_rect = egui::Rect::from_min_max(
                    egui::pos2(panel_rect.min.x, header_rect.max.y),
                    egui::pos2(panel_rect.max.x, panel_rect.max.y - INDICATOR_STRIP),
                );

                let geometry = drawer.paging.geometry();
                let cell_w = (grid_rect.width() - CONTENT_PADDING * 2.0) / geometry.columns as f32;
                let cell_h = (grid_rect.height() - CONTENT_PADDING * 2.0) / geometry.rows as f32;
                let visual = drawer.paging.visual_pos(now);

                // Pointer bookkeeping before painting so the ghost and
                // hint reflect this frame's state.
                if !dialog_open {
                    if primary_pressed {
                        if let Some(pos) = pointer_pos {
                            if panel_rect.contains(pos) {
                                drawer.cursor.note_touch_down(&mut drawer.paging);
                                self.pointer_down_at = Some(pos);
                                if let Some(DropTarget::Occupied(global)) = hit_test(
                                    &drawer,
                                    grid_rect,
                                    cell_w,
                                    cell_h,
                                    pos,
                                ) {
                                    drawer.drag.note_press(global, pos, now);
                                }
                            }
                        }
                    }
                    if primary_down {
                        if let Some(pos) = pointer_pos {
                            drawer.drag.note_move(pos);
                            if drawer.drag.dragging().is_none() {
                                if let Some(swipe) = self.swipe {
                                    let delta = (pos.x - swipe.start_x) / grid_rect.width();
                                    drawer.paging.update_user_drag(delta);
                                } else if let Some(down_at) = self.pointer_down_at {
                                    if (pos.x - down_at.x).abs() > DRAG_MOVE_TOLERANCE {
                                        drawer.paging.begin_user_drag();
                                        self.swipe = Some(SwipeState { start_x: down_at.x });
                                    }
                                }
                            }
                        }
                        drawer.drag.tick(now);
                    }
                    if primary_released {
                        if self.swipe.take().is_some() {
                            drawer.paging.end_user_drag(now);
                            drawer.drag.cancel();
                        } else {
                            let target = pointer_pos
                                .map(|pos| {
                                    if !panel_rect.contains(pos) || pos.y < grid_rect.min.y {
                                        DropTarget::Outside
                                    } else {
                                        hit_test(&drawer, grid_rect, cell_w, cell_h, pos)
                                            .unwrap_or(DropTarget::Empty)
                                    }
                                })
                                .unwrap_or(DropTarget::Outside);
                            let entries = drawer.entries().to_vec();
                            if let Some(outcome) = drawer.drag.release(target, &entries) {
                                if let Some(event) = drawer.apply_outcome(outcome, now) {
                                    events.push(event);
                                }
                            }
                        }
                        self.pointer_down_at = None;
                    }
                }

                // Visible pages: the one under the viewport plus its
                // neighbor while scrolling.
                let first = visual.floor().max(0.0) as usize;
                let grid_painter = ui.painter_at(grid_rect);
                for page_index in first..=(first + 1).min(drawer.paging.page_count().saturating_sub(1))
                {
                    let Some(page) = drawer.paging.page(page_index) else {
                        continue;
                    };
                    let page_dx = (page_index as f32 - visual) * grid_rect.width();
                    if page_dx.abs() >= grid_rect.width() {
                        continue;
                    }
                    let focused = page.focused();
                    let start = page.start();
                    let len = page.len();
                    drawer.paging.mark_bound(page_index);

                    for local in 0..len {
                        let global = start + local;
                        let rect = cell_rect(grid_rect, cell_w, cell_h, geometry.columns, local)
                            .translate(egui::vec2(page_dx, 0.0));
                        let entry = match drawer.entry(global) {
                            Some(entry) => entry.clone(),
                            None => continue,
                        };

                        let is_focused = focused == Some(local);
                        let hovered = pointer_pos.map(|p| rect.contains(p)).unwrap_or(false)
                            && page_index == drawer.paging.current_page();
                        let fill = if is_focused {
                            theme.cell_focused
                        } else if hovered && !dialog_open {
                            theme.cell_hover
                        } else {
                            theme.cell_bg
                        };
                        let cell = rect.shrink(4.0);
                        grid_painter.rect_filled(cell, CELL_ROUNDING, fill);
                        grid_painter.rect_stroke(
                            cell,
                            CELL_ROUNDING,
                            egui::Stroke::new(
                                if is_focused { 2.0 } else { 1.0 },
                                if is_focused {
                                    theme.focus_ring
                                } else {
                                    theme.cell_border
                                },
                            ),
                        );

                        let icon_rect = egui::Rect::from_center_size(
                            egui::pos2(cell.center().x, cell.min.y + 10.0 + ICON_SIDE * 0.5),
                            egui::vec2(ICON_SIDE, ICON_SIDE),
                        );
                        match &entry {
                            Entry::App(app) => {
                                if let Some(tex) = self.icon_texture(app) {
                                    grid_painter.image(
                                        tex.id(),
                                        icon_rect,
                                        egui::Rect::from_min_max(
                                            egui::pos2(0.0, 0.0),
                                            egui::pos2(1.0, 1.0),
                                        ),
                                        egui::Color32::WHITE,
                                    );
                                } else {
                                    grid_painter.rect_filled(
                                        icon_rect,
                                        6.0,
                                        theme.icon_placeholder,
                                    );
                                    grid_painter.text(
                                        icon_rect.center(),
                                        egui::Align2::CENTER_CENTER,
                                        initial_of(&app.name),
                                        egui::FontId::proportional(22.0),
                                        theme.label_color,
                                    );
                                }
                            }
                            Entry::Folder(folder) => {
                                self.paint_folder_tile(&grid_painter, icon_rect, folder, &theme);
                            }
                        }

                        grid_painter.text(
                            egui::pos2(cell.center().x, cell.max.y - 12.0),
                            egui::Align2::CENTER_CENTER,
                            truncate_label(entry.label()),
                            egui::FontId::proportional(12.0),
                            theme.label_color,
                        );

                        // Context menu lives on a plain click response so
                        // the raw gesture handling above stays in charge
                        // of taps and drags.
                        if page_index == drawer.paging.current_page() && !dialog_open {
                            let resp = ui.interact(
                                rect,
                                egui::Id::new(("drawer-cell", page_index, local)),
                                egui::Sense::click(),
                            );
                            resp.context_menu(|ui| {
                                if matches!(entry, Entry::App(_)) && ui.button("Hide").clicked() {
                                    hide_request = Some(global);
                                    ui.close_menu();
                                }
                            });
                        }
                    }
                }

                // Drop hint under an active drag.
                if drawer.drag.dragging().is_some() {
                    if let Some(pos) = pointer_pos {
                        if grid_rect.contains(pos) {
                            let local = local_under(grid_rect, cell_w, cell_h, geometry.columns, pos);
                            if let Some(local) = local {
                                let rect =
                                    cell_rect(grid_rect, cell_w, cell_h, geometry.columns, local)
                                        .shrink(4.0);
                                grid_painter.rect_stroke(
                                    rect,
                                    CELL_ROUNDING,
                                    egui::Stroke::new(2.0, theme.drop_hint),
                                );
                            }
                        }
                    }
                }

                self.paint_indicators(ui, panel_rect, &drawer, visual, &theme);
                self.paint_drag_ghost(ctx, &drawer, &theme);
                if let Some(folder_index) = drawer.open_folder() {
                    self.draw_folder_dialog(ctx, &mut drawer, folder_index, &mut events, &theme);
                }
            });

        // Repaint pacing: animations and pending cursor timers both need
        // frames to land on time.
        if drawer.paging.is_animating() || drawer.drag.dragging().is_some() {
            ctx.request_repaint_after(Duration::from_millis(16));
        } else if let Some(deadline) = drawer.cursor.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(now));
        }

        self.drawer = Some(drawer);
        if let Some(index) = hide_request {
            self.hide_app(index, now);
        }
        for event in events {
            self.handle_drawer_event(event, now);
        }
    }

    fn paint_folder_tile(
        &mut self,
        painter: &egui::Painter,
        rect: egui::Rect,
        folder: &crate::drawer::entry::Folder,
        theme: &LauncherTheme,
    ) {
        painter.rect_filled(rect, 8.0, theme.folder_bg);
        let mini = (rect.width() - 12.0) * 0.5;
        for (slot, app) in folder.apps.iter().take(4).enumerate() {
            let col = (slot % 2) as f32;
            let row = (slot / 2) as f32;
            let mini_rect = egui::Rect::from_min_size(
                egui::pos2(
                    rect.min.x + 4.0 + col * (mini + 4.0),
                    rect.min.y + 4.0 + row * (mini + 4.0),
                ),
                egui::vec2(mini, mini),
            );
            if let Some(tex) = self.icon_texture(app) {
                painter.image(
                    tex.id(),
                    mini_rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            } else {
                painter.rect_filled(mini_rect, 3.0, theme.icon_placeholder);
            }
        }
    }

    fn paint_indicators(
        &self,
        ui: &egui::Ui,
        panel_rect: egui::Rect,
        drawer: &crate::drawer::DrawerState,
        visual: f32,
        theme: &LauncherTheme,
    ) {
        let count = drawer.paging.page_count();
        if count < 2 {
            return;
        }
        let painter = ui.painter();
        let spacing = INDICATOR_RADIUS * 5.0;
        let total = count as f32 * spacing;
        let y = panel_rect.max.y - INDICATOR_STRIP * 0.5;
        let left = panel_rect.center().x - total * 0.5 + spacing * 0.5;
        let active = visual.round().max(0.0) as usize;
        for i in 0..count {
            let center = egui::pos2(left + i as f32 * spacing, y);
            let (radius, color) = if i == active {
                (INDICATOR_RADIUS + 1.0, theme.indicator_active)
            } else {
                (INDICATOR_RADIUS, theme.indicator)
            };
            painter.circle_filled(center, radius, color);
        }
    }

    fn paint_drag_ghost(
        &mut self,
        ctx: &egui::Context,
        drawer: &crate::drawer::DrawerState,
        theme: &LauncherTheme,
    ) {
        let Some(drag_index) = drawer.drag.dragging() else {
            return;
        };
        let Some(pos) = drawer.drag.drag_pointer() else {
            return;
        };
        let Some(entry) = drawer.entry(drag_index) else {
            return;
        };
        let entry = entry.clone();
        let ghost = egui::Rect::from_center_size(pos, egui::vec2(ICON_SIDE + 16.0, ICON_SIDE + 16.0));
        let painter = ctx.layer_painter(egui::LayerId::new(
            egui::Order::Foreground,
            egui::Id::new("drawer_drag_ghost"),
        ));
        painter.rect_filled(
            ghost.expand(6.0),
            CELL_ROUNDING + 4.0,
            egui::Color32::from_rgba_premultiplied(0, 0, 0, 40),
        );
        painter.rect_filled(ghost, CELL_ROUNDING, theme.cell_focused);
        painter.rect_stroke(ghost, CELL_ROUNDING, egui::Stroke::new(1.0, theme.drop_hint));
        let icon_rect = egui::Rect::from_center_size(ghost.center(), egui::vec2(ICON_SIDE, ICON_SIDE));
        match &entry {
            Entry::App(app) => {
                if let Some(tex) = self.icon_texture(app) {
                    painter.image(
                        tex.id(),
                        icon_rect,
                        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                        theme.drag_ghost_tint,
                    );
                } else {
                    painter.rect_filled(icon_rect, 6.0, theme.icon_placeholder);
                }
            }
            Entry::Folder(folder) => {
                self.paint_folder_tile(&painter, icon_rect, folder, theme);
            }
        }
        ctx.request_repaint();
    }

    fn draw_folder_dialog(
        &mut self,
        ctx: &egui::Context,
        drawer: &mut crate::drawer::DrawerState,
        folder_index: usize,
        events: &mut Vec<DrawerEvent>,
        theme: &LauncherTheme,
    ) {
        let Some(Entry::Folder(folder)) = drawer.entry(folder_index).cloned() else {
            return;
        };
        let dpad = drawer.cursor.input_mode() == InputMode::Dpad;
        let focus = drawer.folder_focus();
        let mut activate: Option<usize> = None;

        egui::Window::new(&folder.name)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .frame(
                egui::Frame::window(&ctx.style())
                    .fill(theme.dialog_bg)
                    .rounding(CELL_ROUNDING),
            )
            .show(ctx, |ui| {
                egui::Grid::new("folder-grid").num_columns(3).show(ui, |ui| {
                    for (slot, app) in folder.apps.iter().enumerate() {
                        let texture = self.icon_texture(app);
                        let button = match &texture {
                            Some(tex) => egui::Button::image_and_text(
                                egui::Image::new(tex)
                                    .fit_to_exact_size(egui::vec2(24.0, 24.0)),
                                &app.name,
                            ),
                            None => egui::Button::new(&app.name),
                        };
                        let mut resp = ui.add_sized([110.0, 40.0], button);
                        if dpad && slot == focus {
                            resp = resp.highlight();
                        }
                        if resp.clicked() {
                            activate = Some(slot);
                        }
                        if slot % 3 == 2 {
                            ui.end_row();
                        }
                    }
                });
            });

        if let Some(slot) = activate {
            if let Some(event) = drawer.activate_folder_slot(slot) {
                events.push(event);
            }
        }
    }
}

fn cell_rect(
    grid_rect: egui::Rect,
    cell_w: f32,
    cell_h: f32,
    columns: usize,
    local: usize,
) -> egui::Rect {
    let col = (local % columns) as f32;
    let row = (local / columns) as f32;
    egui::Rect::from_min_size(
        egui::pos2(
            grid_rect.min.x + CONTENT_PADDING + col * cell_w,
            grid_rect.min.y + CONTENT_PADDING + row * cell_h,
        ),
        egui::vec2(cell_w, cell_h),
    )
}

/// Which slot of the current page the pointer is over, occupied or not.
fn local_under(
    grid_rect: egui::Rect,
    cell_w: f32,
    cell_h: f32,
    columns: usize,
    pos: egui::Pos2,
) -> Option<usize> {
    let x = pos.x - grid_rect.min.x - CONTENT_PADDING;
    let y = pos.y - grid_rect.min.y - CONTENT_PADDING;
    if x < 0.0 || y < 0.0 {
        return None;
    }
    let col = (x / cell_w) as usize;
    let row = (y / cell_h) as usize;
    if col >= columns {
        return None;
    }
    Some(row * columns + col)
}

/// Hit test against the current page. `None` means the pointer missed the
/// grid entirely.
fn hit_test(
    drawer: &crate::drawer::DrawerState,
    grid_rect: egui::Rect,
    cell_w: f32,
    cell_h: f32,
    pos: egui::Pos2,
) -> Option<DropTarget> {
    if !grid_rect.contains(pos) {
        return None;
    }
    let geometry = drawer.paging.geometry();
    let local = local_under(grid_rect, cell_w, cell_h, geometry.columns, pos)?;
    if local >= geometry.items_per_page() {
        return Some(DropTarget::Empty);
    }
    let page = drawer.paging.page(drawer.paging.current_page())?;
    match page.global_at(local) {
        Some(global) => Some(DropTarget::Occupied(global)),
        None => Some(DropTarget::Empty),
    }
}

fn initial_of(name: &str) -> String {
    name.chars()
        .next()
        .map(|c| c.to_uppercase().to_string())
        .unwrap_or_else(|| "?".to_string())
}

fn truncate_label(label: &str) -> String {
    const MAX: usize = 14;
    if label.chars().count() <= MAX {
        return label.to_string();
    }
    let mut out: String = label.chars().take(MAX - 1).collect();
    out.push('…');
    out
}
