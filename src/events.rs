use crate::apps::AppInfo;
use crate::drawer::entry::Entry;
use eframe::egui;

/// Messages delivered to the UI thread over the app channel.
pub enum UserEvent {
    /// The background loader finished: installed snapshot plus the
    /// resolved drawer and pinned layouts, delivered as one unit.
    DrawerLoaded(LoadedLayout),
    IconReady(IconResult),
}

#[derive(Debug)]
pub struct LoadedLayout {
    pub apps: Vec<AppInfo>,
    pub drawer: Vec<Entry>,
    pub pinned: Vec<Entry>,
}

pub struct IconRequest {
    pub app_id: String,
    pub icon_name: Option<String>,
    pub size: u32,
}

pub struct IconResult {
    pub app_id: String,
    pub image: Option<egui::ColorImage>,
}
