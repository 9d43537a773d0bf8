//! Pan/zoom camera and the screen <-> camera mapping used by every phase.

use eframe::egui;

/// Pan offset plus a clamped zoom factor.
///
/// `offset` is expressed in inverse-scaled screen units, so a drag of N
/// pixels at zoom `s` moves it by `N / s`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub offset: egui::Vec2,
    scale: f32,
    pub scale_step: f32,
    pub scale_min: f32,
    pub scale_max: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: egui::Vec2::ZERO,
            scale: 1.0,
            scale_step: 0.2,
            scale_min: 0.2,
            scale_max: 10.0,
        }
    }
}

impl Camera {
    /// Builds a camera with the given zoom limits. Bounds are sanitised so the
    /// scale can never reach zero.
    pub fn new(scale_step: f32, scale_min: f32, scale_max: f32) -> Self {
        let scale_min = if scale_min.is_finite() && scale_min > 0.0 {
            scale_min
        } else {
            f32::EPSILON
        };
        let scale_max = scale_max.max(scale_min);
        Self {
            offset: egui::Vec2::ZERO,
            scale: 1.0_f32.clamp(scale_min, scale_max),
            scale_step: scale_step.abs(),
            scale_min,
            scale_max,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Sets the zoom factor, clamped to `[scale_min, scale_max]`.
    pub fn set_scale(&mut self, scale: f32) {
        if scale.is_finite() {
            self.scale = scale.clamp(self.scale_min, self.scale_max);
        }
    }

    /// Maps a fixed screen anchor to the camera-space point sitting there.
    pub fn screen_to_camera(&self, p: egui::Pos2) -> egui::Pos2 {
        egui::pos2(
            (p.x + self.offset.x) * self.scale,
            (p.y + self.offset.y) * self.scale,
        )
    }

    /// Exact inverse of [`Camera::screen_to_camera`].
    pub fn camera_to_screen(&self, p: egui::Pos2) -> egui::Pos2 {
        egui::pos2(
            p.x / self.scale - self.offset.x,
            p.y / self.scale - self.offset.y,
        )
    }

    /// Drag the view by a screen-pixel delta. The content follows the cursor
    /// by the same visual distance at every zoom level.
    pub fn pan(&mut self, screen_delta: egui::Vec2) {
        self.offset += screen_delta / self.scale;
    }

    /// One wheel notch, anchored at `anchor` (screen pixels): the point under
    /// the pointer maps to the same place before and after the scale change.
    pub fn zoom_at(&mut self, anchor: egui::Pos2, wheel_delta: f32) {
        if wheel_delta == 0.0 || !wheel_delta.is_finite() {
            return;
        }

        let before = self.camera_to_screen(anchor);
        let step = if wheel_delta > 0.0 {
            self.scale_step
        } else {
            -self.scale_step
        };
        self.set_scale(self.scale + step);
        let after = self.camera_to_screen(anchor);

        self.offset += after - before;
    }

    pub fn reset(&mut self) {
        self.offset = egui::Vec2::ZERO;
        self.set_scale(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() <= 1e-3 * (1.0 + a.abs().max(b.abs()))
    }

    #[test]
    fn mapping_is_inverse_for_many_states() {
        let offsets = [(0.0, 0.0), (13.5, -42.0), (-640.0, 360.0)];
        let scales = [0.2, 0.6, 1.0, 3.4, 10.0];
        let points = [(0.0, 0.0), (640.0, 360.0), (-12.25, 999.0)];

        for &(ox, oy) in &offsets {
            for &s in &scales {
                let mut cam = Camera::default();
                cam.offset = egui::vec2(ox, oy);
                cam.set_scale(s);
                for &(x, y) in &points {
                    let p = egui::pos2(x, y);
                    let back = cam.camera_to_screen(cam.screen_to_camera(p));
                    assert!(close(back.x, x) && close(back.y, y), "{p:?} -> {back:?} at s={s}");
                }
            }
        }
    }

    #[test]
    fn wheel_zoom_keeps_point_under_cursor() {
        let mut cam = Camera::default();
        cam.offset = egui::vec2(25.0, -10.0);
        let mouse = egui::pos2(300.0, 200.0);

        for delta in [1.0, 1.0, -1.0, 1.0, -1.0, -1.0, -1.0] {
            let before = cam.camera_to_screen(mouse);
            cam.zoom_at(mouse, delta);
            let after = cam.camera_to_screen(mouse);
            assert!(close(before.x, after.x), "{before:?} vs {after:?}");
            assert!(close(before.y, after.y), "{before:?} vs {after:?}");
        }
    }

    #[test]
    fn scale_stays_within_bounds() {
        let mut cam = Camera::default();
        let mouse = egui::pos2(10.0, 10.0);
        for _ in 0..200 {
            cam.zoom_at(mouse, 120.0);
            assert!(cam.scale() <= cam.scale_max);
        }
        assert_eq!(cam.scale(), cam.scale_max);
        for _ in 0..200 {
            cam.zoom_at(mouse, -3.0);
            assert!(cam.scale() >= cam.scale_min);
            assert!(cam.scale() > 0.0);
        }
        assert_eq!(cam.scale(), cam.scale_min);
    }

    #[test]
    fn zero_wheel_delta_is_ignored() {
        let mut cam = Camera::default();
        let before = cam;
        cam.zoom_at(egui::pos2(5.0, 5.0), 0.0);
        assert_eq!(cam, before);
    }

    #[test]
    fn drag_is_divided_by_scale() {
        let mut cam = Camera::default();
        cam.set_scale(2.0);
        cam.offset = egui::vec2(7.0, 3.0);
        cam.pan(egui::vec2(100.0, 0.0));
        assert!(close(cam.offset.x - 7.0, 50.0));
        assert!(close(cam.offset.y, 3.0));
    }

    #[test]
    fn new_rejects_non_positive_minimum() {
        let cam = Camera::new(0.2, 0.0, 4.0);
        assert!(cam.scale_min > 0.0);
        let cam = Camera::new(0.2, 5.0, 1.0);
        assert!(cam.scale_min <= cam.scale_max);
        assert!(cam.scale() >= cam.scale_min);
    }

    #[test]
    fn reset_restores_identity_view() {
        let mut cam = Camera::default();
        cam.pan(egui::vec2(30.0, 30.0));
        cam.zoom_at(egui::pos2(0.0, 0.0), 1.0);
        cam.reset();
        assert_eq!(cam.offset, egui::Vec2::ZERO);
        assert_eq!(cam.scale(), 1.0);
    }
}
