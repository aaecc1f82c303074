use web_time::Instant;

use textlay_core::{Color, Rect, Scene, SceneNode, Vec2};

pub struct Hud {
    pub show_bounds: bool,
    frame_count: u64,
    last_frame: Option<Instant>,
    fps_smooth: f32,
}

impl Default for Hud {
    fn default() -> Self {
        Self::new()
    }
}

impl Hud {
    pub fn new() -> Self {
        Self {
            show_bounds: true,
            frame_count: 0,
            last_frame: None,
            fps_smooth: 0.0,
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn tick(&mut self, now: Instant) {
        self.frame_count += 1;
        if let Some(prev) = self.last_frame.replace(now) {
            let dt = (now - prev).as_secs_f32();
            if dt > 0.0 {
                let fps = 1.0 / dt;
                // simple EMA
                let a = 0.2;
                self.fps_smooth = if self.fps_smooth == 0.0 {
                    fps
                } else {
                    (1.0 - a) * self.fps_smooth + a * fps
                };
            }
        }
    }

    /// Appends the status line and, with `show_bounds`, a box around every
    /// item; the active one also gets a translucent fill drawn first.
    pub fn overlay(&mut self, scene: &mut Scene, boxes: &[Rect], active: Option<usize>) {
        self.tick(Instant::now());

        if self.show_bounds {
            let fills: Vec<SceneNode> = active
                .and_then(|i| boxes.get(i))
                .map(|r| SceneNode::Rect {
                    rect: r.inflate(2.0),
                    color: Color::from_hex("#44AAFF").with_alpha(48),
                    radius: 4.0,
                })
                .into_iter()
                .collect();
            // fill goes under the text, borders on top
            scene.nodes.splice(0..0, fills);

            for (i, r) in boxes.iter().enumerate() {
                let color = if Some(i) == active {
                    Color::from_hex("#44AAFF")
                } else {
                    Color::from_hex("#AAAAAA").with_alpha(160)
                };
                scene.nodes.push(SceneNode::Border {
                    rect: r.inflate(2.0),
                    color,
                    width: 1.5,
                    radius: 4.0,
                });
            }
        }

        let active_label = active.map_or_else(|| "-".to_string(), |i| i.to_string());
        let text = format!(
            "frame: {}  |  fps: {:.1}  |  items: {}  |  active: {}",
            self.frame_count,
            self.fps_smooth,
            boxes.len(),
            active_label
        );
        scene.nodes.push(SceneNode::Text {
            origin: Vec2::new(8.0, 22.0),
            text,
            color: Color::from_hex("#AAAAAA"),
            size: 14.0,
        });
    }
}

pub struct Inspector {
    pub hud: Hud,
    pub enabled: bool,
}

impl Default for Inspector {
    fn default() -> Self {
        Self::new()
    }
}

impl Inspector {
    pub fn new() -> Self {
        Self {
            hud: Hud::new(),
            enabled: false,
        }
    }

    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
        log::info!("inspector {}", if self.enabled { "on" } else { "off" });
    }

    pub fn frame(&mut self, scene: &mut Scene, boxes: &[Rect], active: Option<usize>) {
        if self.enabled {
            self.hud.overlay(scene, boxes, active);
        }
    }
}
