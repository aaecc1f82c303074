use textlay_core::Color;
use textlay_platform::{DesktopOptions, run_desktop_app};
use textlay_text::CosmicMeasurer;
use textlay_ui::TextOverlay;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    if let Ok(path) = std::env::var("TEXTLAY_FONT") {
        let data = std::fs::read(&path)?;
        let faces = textlay_text::load_font_data(data);
        log::info!("{path}: {faces} font faces");
    }

    let mut overlay = TextOverlay::new(CosmicMeasurer);
    let labels: Vec<String> = std::env::args().skip(1).collect();
    if labels.is_empty() {
        overlay.add_text("Drag me", 48.0, Color::from_hex("#FFCC00"));
        overlay.add_text("Ctrl+wheel to resize", 32.0, Color::WHITE);
        overlay.add_text("F12 for the HUD", 24.0, Color::from_hex("#44AAFF"));
    } else {
        for label in labels {
            overlay.add_text(label, 40.0, Color::WHITE);
        }
    }
    log::info!("{} labels", overlay.items().len());

    run_desktop_app(
        overlay,
        DesktopOptions {
            title: "Textlay overlay".to_string(),
            ..Default::default()
        },
    )
}
