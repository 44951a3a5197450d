use eframe::egui::{Pos2, Vec2};

use orbitview::LayoutPositions;

fn ease_out_cubic(t: f32) -> f32 {
    let inverse = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inverse * inverse * inverse
}

/// Interpolates rendered positions toward a freshly applied layout. Time
/// only advances through `advance`, so a caller that stops calling it (while
/// a drag owns the positions) pauses the transition in place.
pub(super) struct LayoutTransition {
    from: LayoutPositions,
    to: LayoutPositions,
    elapsed: f32,
    duration: f32,
}

impl LayoutTransition {
    pub(super) fn new(from: LayoutPositions, to: LayoutPositions, duration: f32) -> Self {
        Self {
            from,
            to,
            elapsed: 0.0,
            duration: duration.max(f32::EPSILON),
        }
    }

    /// Writes the interpolated frame into `rendered`; returns false once done.
    pub(super) fn advance(&mut self, dt: f32, rendered: &mut LayoutPositions) -> bool {
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
        let t = ease_out_cubic(self.elapsed / self.duration);

        rendered.clear();
        for (id, target) in &self.to {
            let start = self.from.get(id).copied().unwrap_or(*target);
            rendered.insert(id.clone(), start.lerp(*target, t));
        }

        self.elapsed < self.duration
    }
}

/// Pan animation used to bring a node to the center of the canvas.
pub(super) struct CameraAnimation {
    from: Vec2,
    to: Vec2,
    elapsed: f32,
    duration: f32,
}

impl CameraAnimation {
    pub(super) fn new(from: Vec2, to: Vec2, duration: f32) -> Self {
        Self {
            from,
            to,
            elapsed: 0.0,
            duration: duration.max(f32::EPSILON),
        }
    }

    pub(super) fn advance(&mut self, dt: f32, pan: &mut Vec2) -> bool {
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
        let t = ease_out_cubic(self.elapsed / self.duration);
        *pan = self.from + (self.to - self.from) * t;
        self.elapsed < self.duration
    }
}

/// Where a node that just became visible starts its transition: on its
/// parent's current spot when the parent is on screen, else at its target.
pub(super) fn entry_position(
    id: &str,
    target: Pos2,
    parent: Option<&str>,
    current: &LayoutPositions,
) -> Pos2 {
    current
        .get(id)
        .or_else(|| parent.and_then(|parent| current.get(parent)))
        .copied()
        .unwrap_or(target)
}
