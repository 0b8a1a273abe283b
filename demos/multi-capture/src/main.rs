mod capture_state;
mod commands;
mod roll;

use std::path::PathBuf;

use camera_capture_core::{FlashMode, LightingCondition, PrepareOutcome};
use camera_capture_virtual::{Scene, VirtualCamera};

use commands::CaptureScreen;

fn caches_root() -> PathBuf {
    dirs_next::cache_dir().unwrap_or_else(std::env::temp_dir)
}

/// One visit to the capture screen, as a user would make it.
fn run() -> Result<(), String> {
    let camera = VirtualCamera::builtin().with_scene(Scene::daylight());
    let screen = CaptureScreen::open(caches_root(), camera)?;

    match screen.prepare()? {
        PrepareOutcome::Denied | PrepareOutcome::PendingThenDenied | PrepareOutcome::Restricted => {
            return Err("camera access was not granted".into());
        }
        outcome => log::info!("Camera ready ({:?})", outcome),
    }

    // Rapid taps land within the same second.
    screen.capture_burst(3)?;

    screen.look_at(Scene::dim(), LightingCondition::LowLight)?;
    if screen.select_flash(FlashMode::On)? {
        screen.capture_burst(1)?;
    }
    screen.look_at(Scene::backlit(), LightingCondition::Backlit)?;
    screen.capture_burst(1)?;

    screen.switch_camera()?;
    screen.look_at(Scene::daylight(), LightingCondition::Normal)?;
    screen.capture_burst(1)?;

    screen.delete_item(1)?;
    let last = screen.roll_len().saturating_sub(1);
    screen.move_item(last, 0)?;

    let manifest = screen.close()?;
    let json = serde_json::to_string_pretty(&manifest).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("multi-capture demo failed: {}", e);
        std::process::exit(1);
    }
}
