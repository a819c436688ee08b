use eframe::egui;

/// Which surface owns the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Home,
    Drawer,
}

/// Per-app icon cache slot. `requested` keeps the worker from being asked
/// twice; a slot with no texture renders as the placeholder tile.
#[derive(Default)]
pub struct IconSlot {
    pub texture: Option<egui::TextureHandle>,
    pub requested: bool,
}

/// Horizontal swipe in progress on the drawer grid.
#[derive(Debug, Clone, Copy)]
pub struct SwipeState {
    pub start_x: f32,
}
