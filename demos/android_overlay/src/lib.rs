#![cfg(target_os = "android")]
use log::LevelFilter;
use textlay_core::Color;
use textlay_platform::android::{AndroidOptions, run_android_app};
use textlay_text::CosmicMeasurer;
use textlay_ui::TextOverlay;
use winit::platform::android::activity::AndroidApp;

const SYSTEM_FONT: &str = "/system/fonts/Roboto-Regular.ttf";

#[unsafe(no_mangle)]
pub extern "C" fn android_main(android_app: AndroidApp) {
    android_logger::init_once(android_logger::Config::default().with_max_level(LevelFilter::Debug));

    // Some images keep the default face out of fontdb's search path.
    match std::fs::read(SYSTEM_FONT) {
        Ok(data) => {
            textlay_text::load_font_data(data);
        }
        Err(e) => log::warn!("{SYSTEM_FONT}: {e}"),
    }

    let mut overlay = TextOverlay::new(CosmicMeasurer);
    overlay.add_text("Hello", 96.0, 0xFFFF_5252u32);
    overlay.add_text("Drag with one finger", 56.0, Color::WHITE);
    overlay.add_text("Pinch to resize", 56.0, 0xFF44_AAFFu32);

    if let Err(e) = run_android_app(android_app, overlay, AndroidOptions::default()) {
        log::error!("runner exited: {e:?}");
    }
}
