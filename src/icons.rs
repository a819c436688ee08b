use crate::events::{IconRequest, IconResult, UserEvent};
use eframe::egui;
use log::warn;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, Sender};

/// Square side the worker normalizes every icon to.
pub const ICON_SIZE: u32 = 64;

const THEMES: [&str; 3] = ["hicolor", "Adwaita", "breeze"];
const SIZE_DIRS: [&str; 5] = ["128x128", "96x96", "64x64", "48x48", "32x32"];

/// Resolve and decode icons off the UI thread. Each answer pokes the
/// context so the frame showing it gets painted promptly.
pub fn spawn_icon_worker(rx: Receiver<IconRequest>, tx: Sender<UserEvent>, ctx: egui::Context) {
    std::thread::spawn(move || {
        while let Ok(request) = rx.recv() {
            let image = load_icon(&request);
            let result = IconResult {
                app_id: request.app_id,
                image,
            };
            if tx.send(UserEvent::IconReady(result)).is_err() {
                break;
            }
            ctx.request_repaint();
        }
    });
}

fn load_icon(request: &IconRequest) -> Option<egui::ColorImage> {
    let name = request.icon_name.as_deref()?;
    let path = if Path::new(name).is_absolute() {
        PathBuf::from(name)
    } else {
        find_icon_path(name)?
    };
    decode_icon(&path, request.size)
}

/// Walk the icon theme directories largest-first, then the flat pixmap
/// dirs. PNG only.
fn find_icon_path(name: &str) -> Option<PathBuf> {
    let file_name = format!("{name}.png");
    let mut roots = Vec::new();
    if let Some(home) = std::env::var_os("HOME") {
        roots.push(PathBuf::from(home).join(".local/share/icons"));
    }
    roots.push(PathBuf::from("/usr/share/icons"));
    roots.push(PathBuf::from("/usr/local/share/icons"));

    for root in &roots {
        for theme in THEMES {
            for size in SIZE_DIRS {
                let candidate = root.join(theme).join(size).join("apps").join(&file_name);
                if candidate.exists() {
                    return Some(candidate);
                }
            }
        }
    }
    for dir in ["/usr/share/pixmaps", "/usr/local/share/pixmaps"] {
        let candidate = Path::new(dir).join(&file_name);
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

fn decode_icon(path: &Path, size: u32) -> Option<egui::ColorImage> {
    let data = std::fs::read(path).ok()?;
    let decoded = match image::load_from_memory(&data) {
        Ok(img) => img.to_rgba8(),
        Err(err) => {
            warn!("undecodable icon {}: {err}", path.display());
            return None;
        }
    };
    let resized = if decoded.width() == size && decoded.height() == size {
        decoded
    } else {
        image::imageops::resize(&decoded, size, size, image::imageops::FilterType::Lanczos3)
    };
    Some(egui::ColorImage::from_rgba_unmultiplied(
        [size as usize, size as usize],
        resized.as_raw(),
    ))
}
