use bevy::diagnostic::{DiagnosticsStore, EntityCountDiagnosticsPlugin, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPlugin};

use crate::physics::{PhysicsConfig, Velocity};
use crate::scene::{Ball, BallSpeed, Brick, SceneState};

pub struct UiPlugin;
impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin)
            .add_systems(Update, debug_window.run_if(debug_enabled));
    }
}

fn debug_enabled(physics: Res<PhysicsConfig>) -> bool {
    physics.debug
}

fn debug_window(
    mut contexts: EguiContexts,
    diagnostics: Res<DiagnosticsStore>,
    state: Res<SceneState>,
    speed: Res<BallSpeed>,
    bricks: Query<(), With<Brick>>,
    ball_q: Query<&Velocity, With<Ball>>,
) {
    egui::Window::new("Debug").show(contexts.ctx_mut(), |ui| {
        if let Some(fps) = diagnostics.get(&FrameTimeDiagnosticsPlugin::FPS) {
            if let Some(value) = fps.smoothed() {
                ui.label(format!("FPS: {:.1}", value));
            }
        }
        if let Some(entity_count) = diagnostics.get(&EntityCountDiagnosticsPlugin::ENTITY_COUNT) {
            if let Some(value) = entity_count.value() {
                ui.label(format!("Entities: {}", value));
            }
        }

        ui.separator();

        ui.label(format!("Score: {}", state.score));
        ui.label(format!("Bricks left: {}", bricks.iter().count()));
        ui.label(format!("Base speed: {:.1}", speed.0));
        if let Ok(vel) = ball_q.get_single() {
            ui.label(format!("Ball velocity: ({:.1}, {:.1})", vel.x, vel.y));
        }
        if state.game_over {
            ui.label("Game over");
        }

        ui.separator();
        ui.label("F3: Toggle Debug");
    });
}
