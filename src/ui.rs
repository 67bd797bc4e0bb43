// src/ui.rs - Theme and painters for the control panel
use eframe::egui::{self, Color32, Pos2, Rect, Stroke};
use image::DynamicImage;

use crate::gesture::GestureLabel;
use crate::landmarks::{HandLandmarks, FINGERTIPS, HAND_CONNECTIONS};

#[derive(Debug, Clone)]
pub struct Theme {
    pub primary: Color32,
    pub secondary: Color32,
    pub error: Color32,
    pub warning: Color32,
    pub success: Color32,
    pub text_primary: Color32,
    pub text_secondary: Color32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: Color32::from_rgb(70, 130, 240),
            secondary: Color32::from_rgb(255, 152, 0),
            error: Color32::from_rgb(244, 67, 54),
            warning: Color32::from_rgb(255, 152, 0),
            success: Color32::from_rgb(76, 175, 80),
            text_primary: Color32::WHITE,
            text_secondary: Color32::from_rgb(200, 200, 200),
        }
    }
}

impl Theme {
    pub fn gesture_color(&self, label: GestureLabel) -> Color32 {
        match label {
            GestureLabel::NoHands => self.text_secondary,
            GestureLabel::Unrecognized | GestureLabel::TwoHands => self.warning,
            GestureLabel::Heart => self.error,
            _ => self.success,
        }
    }

    /// Hands are colored by detection order.
    pub fn hand_color(&self, hand_index: usize) -> Color32 {
        if hand_index == 0 {
            self.primary
        } else {
            self.secondary
        }
    }
}

pub fn visuals() -> egui::Visuals {
    let mut visuals = egui::Visuals::dark();

    visuals.widgets.noninteractive.bg_fill = Color32::from_rgb(30, 30, 35);
    visuals.widgets.inactive.bg_fill = Color32::from_rgb(45, 45, 52);
    visuals.widgets.hovered.bg_fill = Color32::from_rgb(55, 55, 65);
    visuals.widgets.active.bg_fill = Color32::from_rgb(70, 130, 240);

    visuals.widgets.noninteractive.rounding = egui::Rounding::same(8.0);
    visuals.widgets.inactive.rounding = egui::Rounding::same(8.0);
    visuals.widgets.hovered.rounding = egui::Rounding::same(8.0);
    visuals.widgets.active.rounding = egui::Rounding::same(8.0);
    visuals.window_rounding = egui::Rounding::same(12.0);

    visuals
}

/// Maps a normalized landmark into `rect`.
pub fn to_screen(rect: Rect, x: f64, y: f64) -> Pos2 {
    Pos2::new(
        rect.left() + x as f32 * rect.width(),
        rect.top() + y as f32 * rect.height(),
    )
}

/// Draws bones, joints and highlighted fingertips for one hand over `rect`.
pub fn draw_hand_skeleton(painter: &egui::Painter, rect: Rect, hand: &HandLandmarks, color: Color32, theme: &Theme) {
    let points: Vec<Pos2> = hand.points().iter().map(|p| to_screen(rect, p.x, p.y)).collect();

    for (from, to) in HAND_CONNECTIONS {
        painter.line_segment([points[from], points[to]], Stroke::new(2.0, color));
    }

    for (i, pos) in points.iter().enumerate() {
        if FINGERTIPS.contains(&i) {
            painter.circle_filled(*pos, 5.0, color);
            painter.circle_stroke(*pos, 7.0, Stroke::new(1.5, theme.text_primary));
        } else {
            painter.circle_filled(*pos, 3.0, theme.text_primary);
        }
    }
}

/// Holds the GPU texture of the latest camera frame.
pub struct VideoWidget {
    texture: Option<egui::TextureHandle>,
    aspect_ratio: f32,
}

impl VideoWidget {
    pub fn new() -> Self {
        Self {
            texture: None,
            aspect_ratio: 4.0 / 3.0,
        }
    }

    pub fn update_frame(&mut self, ctx: &egui::Context, frame: &DynamicImage) {
        let size = [frame.width() as usize, frame.height() as usize];
        let rgba = frame.to_rgba8();
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_flat_samples().as_slice());

        if frame.height() > 0 {
            self.aspect_ratio = frame.width() as f32 / frame.height() as f32;
        }

        match self.texture.as_mut() {
            Some(texture) => texture.set(color_image, egui::TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture("video_frame", color_image, egui::TextureOptions::LINEAR));
            }
        }
    }

    pub fn clear(&mut self) {
        self.texture = None;
    }

    /// Paints the frame, or a placeholder, and returns the area it occupies.
    pub fn show(&self, ui: &mut egui::Ui, placeholder: &str) -> Rect {
        let available = ui.available_size();
        let mut width = available.x;
        let mut height = width / self.aspect_ratio;
        if height > available.y {
            height = available.y;
            width = height * self.aspect_ratio;
        }

        let (rect, _response) = ui.allocate_exact_size(egui::vec2(width, height), egui::Sense::hover());

        if let Some(texture) = &self.texture {
            ui.painter().image(
                texture.id(),
                rect,
                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        } else {
            ui.painter().rect_filled(rect, egui::Rounding::same(4.0), Color32::from_rgb(50, 50, 55));
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                placeholder,
                egui::FontId::proportional(16.0),
                Color32::from_rgb(150, 150, 155),
            );
        }

        rect
    }
}

impl Default for VideoWidget {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landmarks_scale_into_rect() {
        let rect = Rect::from_min_size(Pos2::new(10.0, 20.0), egui::vec2(200.0, 100.0));
        assert_eq!(to_screen(rect, 0.0, 0.0), Pos2::new(10.0, 20.0));
        assert_eq!(to_screen(rect, 0.5, 1.0), Pos2::new(110.0, 120.0));
    }

    #[test]
    fn gesture_colors() {
        let theme = Theme::default();
        assert_eq!(theme.gesture_color(GestureLabel::Fist), theme.success);
        assert_eq!(theme.gesture_color(GestureLabel::NoHands), theme.text_secondary);
        assert_ne!(theme.hand_color(0), theme.hand_color(1));
    }
}
