use eframe::egui::Color32;

pub const HEADER_HEIGHT: f32 = 48.0;
pub const CONTENT_PADDING: f32 = 12.0;
pub const ICON_SIDE: f32 = 48.0;
pub const CELL_ROUNDING: f32 = 10.0;
pub const INDICATOR_RADIUS: f32 = 3.5;
pub const PINNED_SLOT: f32 = 58.0;

#[derive(Clone, Copy)]
pub struct LauncherTheme {
    pub home_bg: Color32,
    pub drawer_bg: Color32,
    pub header_text: Color32,
    pub cell_bg: Color32,
    pub cell_hover: Color32,
    pub cell_focused: Color32,
    pub cell_border: Color32,
    pub focus_ring: Color32,
    pub label_color: Color32,
    pub label_dim: Color32,
    pub icon_placeholder: Color32,
    pub folder_bg: Color32,
    pub drop_hint: Color32,
    pub drag_ghost_tint: Color32,
    pub indicator: Color32,
    pub indicator_active: Color32,
    pub dialog_bg: Color32,
}

impl Default for LauncherTheme {
    fn default() -> Self {
        Self {
            home_bg: Color32::from_rgb(10, 12, 16),
            drawer_bg: Color32::from_rgba_premultiplied(13, 16, 22, 247),
            header_text: Color32::from_rgb(240, 244, 250),
            cell_bg: Color32::from_rgba_premultiplied(28, 33, 42, 140),
            cell_hover: Color32::from_rgba_premultiplied(40, 48, 61, 170),
            cell_focused: Color32::from_rgba_premultiplied(46, 84, 120, 200),
            cell_border: Color32::from_rgba_premultiplied(130, 146, 168, 56),
            focus_ring: Color32::from_rgb(110, 178, 255),
            label_color: Color32::from_rgb(228, 233, 240),
            label_dim: Color32::from_rgb(150, 158, 170),
            icon_placeholder: Color32::from_rgba_premultiplied(188, 201, 219, 96),
            folder_bg: Color32::from_rgba_premultiplied(52, 60, 75, 180),
            drop_hint: Color32::from_rgba_premultiplied(96, 205, 180, 180),
            drag_ghost_tint: Color32::from_rgba_premultiplied(255, 255, 255, 180),
            indicator: Color32::from_rgba_premultiplied(150, 160, 175, 90),
            indicator_active: Color32::from_rgb(225, 232, 242),
            dialog_bg: Color32::from_rgba_premultiplied(22, 27, 35, 248),
        }
    }
}
