use crate::apps::AppInfo;
use crate::drawer::entry::{Entry, Folder};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

pub const DRAWER_KEY: &str = "drawer";
pub const PINNED_KEY: &str = "pinned";
const HIDDEN_KEY: &str = "hidden";

/// Upper bound on the home screen's pinned row.
pub const MAX_PINNED_ITEMS: usize = 6;

/// On-disk form of one drawer slot.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StoredEntry {
    App { package: String },
    Folder { name: String, apps: Vec<String> },
}

/// JSON layout persistence under the platform config directory, one file
/// per key. Saves are fire-and-forget; loads resolve stored identifiers
/// against the current installed-app snapshot.
pub struct LayoutStore {
    dir: Option<PathBuf>,
}

impl Default for LayoutStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutStore {
    pub fn new() -> Self {
        let dir = directories::ProjectDirs::from("com", "padhome", "padhome")
            .map(|dirs| dirs.config_dir().to_path_buf());
        if dir.is_none() {
            warn!("no config directory available, layout will not persist");
        }
        Self { dir }
    }

    #[cfg(test)]
    fn with_dir(dir: PathBuf) -> Self {
        Self { dir: Some(dir) }
    }

    fn path_for(&self, key: &str) -> Option<PathBuf> {
        self.dir.as_ref().map(|dir| dir.join(format!("{key}.json")))
    }

    /// Drawer layout: the saved arrangement resolved against `installed`,
    /// minus hidden apps, with apps the layout has never seen appended at
    /// the end. With no usable saved layout every visible app is listed
    /// in scan order (the repository sorts by name).
    pub fn load_drawer(&self, installed: &[AppInfo]) -> Vec<Entry> {
        let hidden = self.hidden_apps();
        let visible: Vec<AppInfo> = installed
            .iter()
            .filter(|app| !hidden.contains(&app.id))
            .cloned()
            .collect();
        let mut entries = match self.load_entries(DRAWER_KEY, &visible) {
            Some(entries) => entries,
            None => return visible.into_iter().map(Entry::App).collect(),
        };
        let referenced: HashSet<&str> = entries
            .iter()
            .flat_map(|entry| match entry {
                Entry::App(app) => vec![app.id.as_str()],
                Entry::Folder(folder) => folder.apps.iter().map(|a| a.id.as_str()).collect(),
            })
            .collect();
        let new_apps: Vec<AppInfo> = visible
            .iter()
            .filter(|app| !referenced.contains(app.id.as_str()))
            .cloned()
            .collect();
        entries.extend(new_apps.into_iter().map(Entry::App));
        entries
    }

    pub fn save_drawer(&self, entries: &[Entry]) {
        self.save_entries(DRAWER_KEY, entries);
    }

    pub fn load_pinned(&self, installed: &[AppInfo]) -> Vec<Entry> {
        let mut pinned = self.load_entries(PINNED_KEY, installed).unwrap_or_default();
        pinned.truncate(MAX_PINNED_ITEMS);
        pinned
    }

    pub fn save_pinned(&self, entries: &[Entry]) {
        let bounded = &entries[..entries.len().min(MAX_PINNED_ITEMS)];
        self.save_entries(PINNED_KEY, bounded);
    }

    fn load_entries(&self, key: &str, installed: &[AppInfo]) -> Option<Vec<Entry>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return None;
        }
        let file = std::fs::File::open(&path).ok()?;
        let stored: Vec<StoredEntry> = match serde_json::from_reader(file) {
            Ok(stored) => stored,
            Err(err) => {
                warn!("failed to parse {key} layout: {err}");
                return None;
            }
        };
        Some(resolve_entries(stored, installed))
    }

    fn save_entries(&self, key: &str, entries: &[Entry]) {
        let Some(path) = self.path_for(key) else {
            return;
        };
        let stored: Vec<StoredEntry> = entries.iter().map(encode_entry).collect();
        let Some(dir) = path.parent() else {
            return;
        };
        if let Err(err) = std::fs::create_dir_all(dir) {
            warn!("cannot create config dir: {err}");
            return;
        }
        match std::fs::File::create(&path) {
            Ok(file) => {
                if let Err(err) = serde_json::to_writer_pretty(file, &stored) {
                    warn!("failed to write {key} layout: {err}");
                }
            }
            Err(err) => warn!("failed to write {key} layout: {err}"),
        }
    }

    pub fn hidden_apps(&self) -> HashSet<String> {
        let Some(path) = self.path_for(HIDDEN_KEY) else {
            return HashSet::new();
        };
        if !path.exists() {
            return HashSet::new();
        }
        std::fs::File::open(&path)
            .ok()
            .and_then(|file| serde_json::from_reader(file).ok())
            .unwrap_or_default()
    }

    pub fn hide_app(&self, id: &str) {
        let mut hidden = self.hidden_apps();
        if hidden.insert(id.to_string()) {
            self.save_hidden(&hidden);
        }
    }

    pub fn unhide_app(&self, id: &str) {
        let mut hidden = self.hidden_apps();
        if hidden.remove(id) {
            self.save_hidden(&hidden);
        }
    }

    fn save_hidden(&self, hidden: &HashSet<String>) {
        let Some(path) = self.path_for(HIDDEN_KEY) else {
            return;
        };
        let Some(dir) = path.parent() else {
            return;
        };
        if std::fs::create_dir_all(dir).is_err() {
            return;
        }
        let mut sorted: Vec<&String> = hidden.iter().collect();
        sorted.sort();
        if let Ok(file) = std::fs::File::create(&path) {
            let _ = serde_json::to_writer_pretty(file, &sorted);
        }
    }
}

fn encode_entry(entry: &Entry) -> StoredEntry {
    match entry {
        Entry::App(app) => StoredEntry::App {
            package: app.id.clone(),
        },
        Entry::Folder(folder) => StoredEntry::Folder {
            name: folder.name.clone(),
            apps: folder.apps.iter().map(|app| app.id.clone()).collect(),
        },
    }
}

/// Turn stored identifiers back into entries. References to apps that are
/// no longer installed vanish, and folders left empty vanish with them.
fn resolve_entries(stored: Vec<StoredEntry>, installed: &[AppInfo]) -> Vec<Entry> {
    let find = |id: &str| installed.iter().find(|app| app.id == id).cloned();
    let mut entries = Vec::with_capacity(stored.len());
    for item in stored {
        match item {
            StoredEntry::App { package } => {
                if let Some(app) = find(&package) {
                    entries.push(Entry::App(app));
                }
            }
            StoredEntry::Folder { name, apps } => {
                let resolved: Vec<AppInfo> = apps.iter().filter_map(|id| find(id)).collect();
                if !resolved.is_empty() {
                    entries.push(Entry::Folder(Folder {
                        name,
                        apps: resolved,
                    }));
                }
            }
        }
    }
    entries
}
