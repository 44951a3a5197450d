use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

use orbitview::NodeCategory;
use orbitview::graph::LoadState;

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (64.0 * zoom.clamp(0.5, 2.0)).max(20.0);
    let origin = rect.center() + pan;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 60));

    let mut x = origin.x.rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = origin.y.rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Pos2) -> Pos2 {
    rect.center() + pan + world.to_vec2() * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Pos2 {
    ((screen - rect.center() - pan) / zoom).to_pos2()
}

/// Pan that puts `world` at the center of the canvas.
pub(super) fn pan_to_center(world: Pos2, zoom: f32) -> Vec2 {
    -world.to_vec2() * zoom
}

pub(super) fn category_color(category: NodeCategory) -> Color32 {
    match category {
        NodeCategory::Project => Color32::from_rgb(236, 178, 82),
        NodeCategory::Directory => Color32::from_rgb(96, 156, 214),
        NodeCategory::File => Color32::from_rgb(110, 190, 160),
        NodeCategory::Module => Color32::from_rgb(152, 128, 214),
        NodeCategory::Symbol => Color32::from_rgb(214, 120, 140),
        NodeCategory::Dependency => Color32::from_rgb(170, 170, 120),
        NodeCategory::Other => Color32::from_rgb(130, 138, 150),
    }
}

pub(super) fn state_stroke(state: &LoadState) -> Option<Color32> {
    match state {
        LoadState::Ready => None,
        LoadState::Loading => Some(Color32::from_rgb(103, 196, 255)),
        LoadState::Error(_) => Some(Color32::from_rgb(235, 87, 87)),
    }
}
