use crate::config::GameConfig;
use crate::physics::PhysicsConfig;
use crate::MainCamera;
use bevy::input::mouse::MouseButtonInput;
use bevy::input::ButtonState;
use bevy::prelude::*;
use bevy::window::CursorMoved;

/// Pointer moved, in playfield coordinates.
#[derive(Event, Clone, Copy, Debug, PartialEq)]
pub struct PointerMove {
    pub position: Vec2,
}

/// Primary button pressed or a touch started, in playfield coordinates.
#[derive(Event, Clone, Copy, Debug, PartialEq)]
pub struct PointerDown {
    pub position: Vec2,
}

pub struct PointerPlugin;
impl Plugin for PointerPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<PointerMove>()
            .add_event::<PointerDown>()
            .add_systems(
                PreUpdate,
                (mouse_pointer, touch_pointer).after(bevy::input::InputSystem),
            )
            .add_systems(Update, debug_toggle);
    }
}

fn cursor_playfield(
    cursor_pos: Vec2,
    cam: (&Camera, &GlobalTransform),
    config: &GameConfig,
) -> Option<Vec2> {
    cam.0
        .viewport_to_world_2d(cam.1, cursor_pos)
        .map(|world| config.to_playfield(world))
}

fn mouse_pointer(
    windows: Query<&Window>,
    q_cam: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    config: Res<GameConfig>,
    mut cursor_evr: EventReader<CursorMoved>,
    mut mousebtn_evr: EventReader<MouseButtonInput>,
    mut ev_move: EventWriter<PointerMove>,
    mut ev_down: EventWriter<PointerDown>,
) {
    let Ok(cam) = q_cam.get_single() else {
        return;
    };

    for ev in cursor_evr.read() {
        if let Some(position) = cursor_playfield(ev.position, cam, &config) {
            ev_move.send(PointerMove { position });
        }
    }

    for ev in mousebtn_evr.read() {
        if ev.state != ButtonState::Pressed || ev.button != MouseButton::Left {
            continue;
        }
        let Ok(win) = windows.get(ev.window) else {
            continue;
        };
        let Some(cursor) = win.cursor_position() else {
            continue;
        };
        if let Some(position) = cursor_playfield(cursor, cam, &config) {
            ev_down.send(PointerDown { position });
        }
    }
}

fn touch_pointer(
    touches: Res<Touches>,
    q_cam: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    config: Res<GameConfig>,
    mut ev_move: EventWriter<PointerMove>,
    mut ev_down: EventWriter<PointerDown>,
) {
    let Ok(cam) = q_cam.get_single() else {
        return;
    };

    for touch in touches.iter_just_pressed() {
        if let Some(position) = cursor_playfield(touch.position(), cam, &config) {
            ev_down.send(PointerDown { position });
            ev_move.send(PointerMove { position });
        }
    }
    for touch in touches.iter() {
        if touch.delta() == Vec2::ZERO {
            continue;
        }
        if let Some(position) = cursor_playfield(touch.position(), cam, &config) {
            ev_move.send(PointerMove { position });
        }
    }
}

fn debug_toggle(mut physics: ResMut<PhysicsConfig>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::F3) {
        physics.debug = !physics.debug;
        debug!("physics debug: {}", physics.debug);
    }
}
