use textlay_core::*;

/// Records draw commands for one frame in surface coordinates.
pub struct DrawScope {
    pub commands: Vec<DrawCommand>,
    pub size: Size,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Rect {
        rect: Rect,
        color: Color,
        radius: f32,
        stroke: Option<(f32, Color)>,
    },
    Text {
        text: String,
        /// Left end of the baseline.
        pos: Vec2,
        color: Color,
        size: f32,
    },
}

impl DrawScope {
    pub fn new(size: Size) -> Self {
        Self {
            commands: Vec::new(),
            size,
        }
    }

    pub fn draw_rect(&mut self, rect: Rect, color: Color, radius: f32) {
        self.commands.push(DrawCommand::Rect {
            rect,
            color,
            radius,
            stroke: None,
        });
    }
    pub fn draw_rect_stroke(&mut self, rect: Rect, color: Color, radius: f32, width: f32) {
        self.commands.push(DrawCommand::Rect {
            rect,
            color: Color::TRANSPARENT,
            radius,
            stroke: Some((width, color)),
        });
    }
    pub fn draw_text(&mut self, text: impl Into<String>, pos: Vec2, color: Color, size: f32) {
        self.commands.push(DrawCommand::Text {
            text: text.into(),
            pos,
            color,
            size,
        });
    }

    /// Lowers the recorded commands into scene nodes, in recording order.
    pub fn paint(&self, scene: &mut Scene) {
        for cmd in &self.commands {
            match cmd {
                DrawCommand::Rect {
                    rect,
                    color,
                    radius,
                    stroke,
                } => {
                    if color.3 > 0 {
                        scene.nodes.push(SceneNode::Rect {
                            rect: *rect,
                            color: *color,
                            radius: *radius,
                        });
                    }
                    if let Some((w, c)) = stroke {
                        scene.nodes.push(SceneNode::Border {
                            rect: *rect,
                            color: *c,
                            width: *w,
                            radius: *radius,
                        });
                    }
                }
                DrawCommand::Text {
                    text,
                    pos,
                    color,
                    size,
                } => {
                    scene.nodes.push(SceneNode::Text {
                        origin: *pos,
                        text: text.clone(),
                        color: *color,
                        size: *size,
                    });
                }
            }
        }
    }

    pub fn into_scene(self, clear_color: Color) -> Scene {
        let mut scene = Scene::new(clear_color);
        self.paint(&mut scene);
        scene
    }
}
