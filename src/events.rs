//! Platform-neutral input events and the input phase that applies them.

use crate::app_state::AppState;
use crate::canvas::overlay;
use crate::fonts::TextMetrics;
use eframe::egui::{self, Key, PointerButton};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerEvent {
    Quit,
    KeyDown { key: Key, ctrl: bool },
    PointerDown { pos: egui::Pos2, button: PointerButton },
    PointerUp { pos: egui::Pos2, button: PointerButton },
    PointerMove { pos: egui::Pos2 },
    Wheel { delta: f32 },
    Resized { size: egui::Vec2 },
}

/// Requests raised while draining one frame's events.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InputRequests {
    pub quit: bool,
    pub export: bool,
}

pub fn handle_input(
    state: &mut AppState,
    events: &[ViewerEvent],
    font: &dyn TextMetrics,
) -> InputRequests {
    let mut requests = InputRequests::default();

    for event in events {
        match *event {
            ViewerEvent::Quit => {
                requests.quit = true;
                return requests;
            }
            ViewerEvent::PointerDown { pos, button } => {
                if button == PointerButton::Primary
                    && state.show_controls
                    && overlay::save_button_rect(font).contains(pos)
                {
                    requests.export = true;
                    continue;
                }
                if matches!(button, PointerButton::Primary | PointerButton::Middle) {
                    state.track_mouse = true;
                    state.mouse = pos;
                }
            }
            ViewerEvent::PointerUp { .. } => state.track_mouse = false,
            ViewerEvent::PointerMove { pos } => {
                if state.track_mouse {
                    state.camera.pan(pos - state.mouse);
                }
                state.mouse = pos;
            }
            ViewerEvent::Wheel { delta } => {
                let anchor = state.mouse;
                state.camera.zoom_at(anchor, delta);
            }
            ViewerEvent::Resized { size } => state.on_resize(size),
            ViewerEvent::KeyDown { key, ctrl } => match (key, ctrl) {
                (Key::S, true) => requests.export = true,
                (Key::Tab, false) => state.show_slider_control = !state.show_slider_control,
                (Key::Num0, false) => state.camera.reset(),
                (Key::L, false) => state.light_mode = !state.light_mode,
                (Key::A, false) => state.grid.auto_scale = !state.grid.auto_scale,
                _ => {}
            },
        }
    }
    requests
}

/// Translates this frame's egui input into [`ViewerEvent`]s. A `Resized`
/// event is emitted whenever the screen size differs from `last_size`.
pub fn collect(ctx: &egui::Context, last_size: &mut Option<egui::Vec2>) -> Vec<ViewerEvent> {
    let mut out = Vec::new();

    let size = ctx.screen_rect().size();
    if *last_size != Some(size) {
        *last_size = Some(size);
        out.push(ViewerEvent::Resized { size });
    }

    ctx.input(|i| {
        if i.viewport().close_requested() {
            out.push(ViewerEvent::Quit);
        }
        translate(&i.events, &mut out);
    });
    out
}

/// Maps raw egui events onto [`ViewerEvent`]s in arrival order. Every
/// scroll event becomes its own `Wheel`, so each notch zooms one step.
pub fn translate(raw: &[egui::Event], out: &mut Vec<ViewerEvent>) {
    for event in raw {
        match event {
            egui::Event::Key {
                key,
                pressed: true,
                modifiers,
                ..
            } => out.push(ViewerEvent::KeyDown {
                key: *key,
                ctrl: modifiers.ctrl || modifiers.command,
            }),
            egui::Event::PointerButton {
                pos,
                button,
                pressed,
                ..
            } => out.push(if *pressed {
                ViewerEvent::PointerDown {
                    pos: *pos,
                    button: *button,
                }
            } else {
                ViewerEvent::PointerUp {
                    pos: *pos,
                    button: *button,
                }
            }),
            egui::Event::PointerMoved(pos) => out.push(ViewerEvent::PointerMove { pos: *pos }),
            egui::Event::Scroll(delta) if delta.y != 0.0 => {
                out.push(ViewerEvent::Wheel { delta: delta.y })
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::FixedAdvance;
    use egui::{pos2, vec2};

    fn font() -> FixedAdvance {
        FixedAdvance::new(16.0, 8.0)
    }

    #[test]
    fn drag_pans_with_grab_semantics() {
        let mut state = AppState::default();
        state.camera.set_scale(2.0);
        let events = [
            ViewerEvent::PointerDown {
                pos: pos2(100.0, 300.0),
                button: PointerButton::Primary,
            },
            ViewerEvent::PointerMove { pos: pos2(200.0, 300.0) },
            ViewerEvent::PointerUp {
                pos: pos2(200.0, 300.0),
                button: PointerButton::Primary,
            },
            ViewerEvent::PointerMove { pos: pos2(400.0, 300.0) },
        ];
        let requests = handle_input(&mut state, &events, &font());
        assert_eq!(requests, InputRequests::default());
        assert_eq!(state.camera.offset, vec2(50.0, 0.0));
        assert!(!state.track_mouse);
        assert_eq!(state.mouse, pos2(400.0, 300.0));
    }

    #[test]
    fn secondary_button_does_not_drag() {
        let mut state = AppState::default();
        let events = [
            ViewerEvent::PointerDown {
                pos: pos2(100.0, 300.0),
                button: PointerButton::Secondary,
            },
            ViewerEvent::PointerMove { pos: pos2(150.0, 300.0) },
        ];
        handle_input(&mut state, &events, &font());
        assert_eq!(state.camera.offset, egui::Vec2::ZERO);
    }

    #[test]
    fn wheel_zooms_around_last_pointer() {
        let mut state = AppState::default();
        let anchor = pos2(300.0, 200.0);
        let before = state.camera.camera_to_screen(anchor);
        let events = [
            ViewerEvent::PointerMove { pos: anchor },
            ViewerEvent::Wheel { delta: 1.0 },
        ];
        handle_input(&mut state, &events, &font());
        assert!((state.camera.scale() - 1.2).abs() < 1e-6);
        let after = state.camera.camera_to_screen(anchor);
        assert!((after - before).length() < 1e-3);
    }

    #[test]
    fn each_scroll_event_zooms_one_step() {
        let raw = [
            egui::Event::PointerMoved(pos2(300.0, 200.0)),
            egui::Event::Scroll(vec2(0.0, 50.0)),
            egui::Event::Scroll(vec2(0.0, 50.0)),
            egui::Event::Scroll(vec2(30.0, 0.0)),
        ];
        let mut events = Vec::new();
        translate(&raw, &mut events);
        let wheels = events
            .iter()
            .filter(|e| matches!(e, ViewerEvent::Wheel { .. }))
            .count();
        assert_eq!(wheels, 2);

        let mut state = AppState::default();
        handle_input(&mut state, &events, &font());
        assert!((state.camera.scale() - 1.4).abs() < 1e-6);
    }

    #[test]
    fn keys_toggle_view_flags() {
        let mut state = AppState::default();
        state.camera.pan(vec2(30.0, 0.0));
        let key = |key| ViewerEvent::KeyDown { key, ctrl: false };
        let events = [key(Key::Tab), key(Key::L), key(Key::A), key(Key::Num0)];
        let requests = handle_input(&mut state, &events, &font());
        assert!(!requests.export);
        assert!(state.show_slider_control);
        assert!(state.light_mode);
        assert!(!state.grid.auto_scale);
        assert_eq!(state.camera.offset, egui::Vec2::ZERO);
    }

    #[test]
    fn ctrl_s_and_save_click_request_export() {
        let mut state = AppState::default();
        let requests = handle_input(
            &mut state,
            &[ViewerEvent::KeyDown { key: Key::S, ctrl: true }],
            &font(),
        );
        assert!(requests.export);

        let plain_s = handle_input(
            &mut state,
            &[ViewerEvent::KeyDown { key: Key::S, ctrl: false }],
            &font(),
        );
        assert!(!plain_s.export);

        let click = handle_input(
            &mut state,
            &[ViewerEvent::PointerDown {
                pos: pos2(20.0, 16.0),
                button: PointerButton::Primary,
            }],
            &font(),
        );
        assert!(click.export);
        assert!(!state.track_mouse);
    }

    #[test]
    fn quit_stops_draining() {
        let mut state = AppState::default();
        let events = [
            ViewerEvent::Quit,
            ViewerEvent::KeyDown { key: Key::L, ctrl: false },
        ];
        let requests = handle_input(&mut state, &events, &font());
        assert!(requests.quit);
        assert!(!state.light_mode);
    }

    #[test]
    fn resize_moves_origin() {
        let mut state = AppState::default();
        handle_input(
            &mut state,
            &[ViewerEvent::Resized { size: vec2(640.0, 360.0) }],
            &font(),
        );
        assert_eq!(state.grid.origin, pos2(320.0, 180.0));
    }
}
