use log::{debug, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// How long a scan result stays fresh before `list_apps` rescans.
pub const CACHE_TTL: Duration = Duration::from_secs(60);

/// One launchable application from a freedesktop .desktop file.
///
/// Identity is the desktop-file stem (`id`); two records with the same id
/// are the same app no matter what the other fields say.
#[derive(Debug, Clone)]
pub struct AppInfo {
    pub name: String,
    pub id: String,
    pub exec: String,
    pub icon: Option<String>,
}

impl PartialEq for AppInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AppInfo {}

impl std::hash::Hash for AppInfo {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Installed-app snapshot with a short TTL cache.
///
/// Scanning walks the usual application directories; callers that need a
/// guaranteed-fresh list call `invalidate` first.
pub struct AppRepository {
    cached: Option<Vec<AppInfo>>,
    loaded_at: Option<Instant>,
}

impl Default for AppRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl AppRepository {
    pub fn new() -> Self {
        Self {
            cached: None,
            loaded_at: None,
        }
    }

    pub fn list_apps(&mut self) -> Vec<AppInfo> {
        let fresh = self
            .loaded_at
            .map(|t| t.elapsed() < CACHE_TTL)
            .unwrap_or(false);
        if fresh {
            if let Some(apps) = &self.cached {
                return apps.clone();
            }
        }
        let apps = scan_installed_apps();
        if apps.is_empty() && self.cached.is_some() {
            // A failed rescan should not wipe a usable snapshot.
            return self.cached.clone().unwrap_or_default();
        }
        self.cached = Some(apps.clone());
        self.loaded_at = Some(Instant::now());
        apps
    }

    /// Seed the cache with a snapshot scanned elsewhere.
    pub fn prime(&mut self, apps: Vec<AppInfo>) {
        self.cached = Some(apps);
        self.loaded_at = Some(Instant::now());
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
        self.loaded_at = None;
    }

    pub fn cached_app(&self, id: &str) -> Option<&AppInfo> {
        self.cached.as_ref()?.iter().find(|app| app.id == id)
    }
}

/// Scan every application directory and return a deduplicated,
/// name-sorted list. Safe to call from a worker thread.
pub fn scan_installed_apps() -> Vec<AppInfo> {
    let mut apps = Vec::new();
    let mut seen = HashSet::new();

    for dir in application_dirs() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("desktop") {
                continue;
            }
            let Some(app) = parse_desktop_file(&path) else {
                continue;
            };
            // User dirs come first, so the first hit per id wins.
            if seen.insert(app.id.clone()) {
                apps.push(app);
            }
        }
    }

    apps.retain(|app| app.id != "padhome");
    apps.sort_by_key(|app| app.name.to_lowercase());
    debug!("scanned {} launchable apps", apps.len());
    apps
}

fn application_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(home) = std::env::var_os("HOME") {
        dirs.push(PathBuf::from(home).join(".local/share/applications"));
    }
    dirs.push(PathBuf::from("/usr/local/share/applications"));
    dirs.push(PathBuf::from("/usr/share/applications"));
    dirs
}

fn parse_desktop_file(path: &Path) -> Option<AppInfo> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            warn!("unreadable desktop file {}: {err}", path.display());
            return None;
        }
    };
    let id = path.file_stem()?.to_str()?.to_string();
    parse_desktop_entry(&id, &content)
}

/// Parse the `[Desktop Entry]` section. Returns None for entries that are
/// hidden, not meant for menus, or missing a name/command.
fn parse_desktop_entry(id: &str, content: &str) -> Option<AppInfo> {
    let mut in_entry_section = false;
    let mut name = None;
    let mut exec = None;
    let mut icon = None;
    let mut hidden = false;

    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            in_entry_section = line == "[Desktop Entry]";
            continue;
        }
        if !in_entry_section {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        match key.trim() {
            "Name" if name.is_none() => name = Some(value.trim().to_string()),
            "Exec" if exec.is_none() => exec = Some(strip_field_codes(value.trim())),
            "Icon" if icon.is_none() => icon = Some(value.trim().to_string()),
            "NoDisplay" | "Hidden" if value.trim() == "true" => hidden = true,
            _ => {}
        }
    }

    if hidden {
        return None;
    }
    let exec = exec?;
    if exec.is_empty() {
        return None;
    }
    Some(AppInfo {
        name: name.unwrap_or_else(|| id.to_string()),
        id: id.to_string(),
        exec,
        icon,
    })
}

/// Drop `%f`/`%U`-style placeholders; we never launch with arguments.
fn strip_field_codes(exec: &str) -> String {
    exec.split_whitespace()
        .filter(|token| !token.starts_with('%'))
        .collect::<Vec<_>>()
        .join(" ")
}
