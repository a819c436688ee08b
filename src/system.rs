use crate::apps::AppInfo;
use log::{info, warn};
use std::process::Command;

/// Launch an app's Exec line. Tries a direct spawn first, then once more
/// through the shell for exec lines that need it. Never fatal; the caller
/// only learns whether anything started.
pub fn launch_app(app: &AppInfo) -> bool {
    let mut parts = app.exec.split_whitespace();
    let Some(program) = parts.next() else {
        warn!("app {} has an empty exec line", app.id);
        return false;
    };
    let args: Vec<&str> = parts.collect();
    match Command::new(program).args(&args).spawn() {
        Ok(_) => {
            info!("launched {}", app.name);
            true
        }
        Err(err) => {
            warn!("spawn of {program} failed ({err}), retrying via shell");
            match Command::new("/bin/sh").arg("-c").arg(&app.exec).spawn() {
                Ok(_) => true,
                Err(err) => {
                    warn!("failed to launch {}: {err}", app.name);
                    false
                }
            }
        }
    }
}
