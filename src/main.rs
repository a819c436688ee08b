mod app;
mod apps;
mod drawer;
mod events;
mod icons;
mod store;
mod system;

use crate::app::{LauncherApp, WINDOW_HEIGHT, WINDOW_WIDTH};
use eframe::egui;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([WINDOW_WIDTH, WINDOW_HEIGHT])
            .with_min_inner_size([WINDOW_WIDTH, WINDOW_HEIGHT])
            .with_resizable(true)
            .with_title("padhome"),
        ..Default::default()
    };

    eframe::run_native(
        "padhome",
        options,
        Box::new(|cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Ok(Box::new(LauncherApp::new(cc)))
        }),
    )
}
