mod config;
mod input;
mod loading;
mod physics;
mod render;
mod scene;
mod ui;

use bevy::diagnostic::{EntityCountDiagnosticsPlugin, FrameTimeDiagnosticsPlugin};
use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;
use bevy::render::camera::ScalingMode;
use bevy::window::WindowResizeConstraints;
use config::GameConfig;
use input::PointerPlugin;
use loading::LoadingPlugin;
use physics::ArcadePhysicsPlugin;
use render::RenderPlugin;
use scene::ScenePlugin;
use ui::UiPlugin;

fn main() {
    let config = GameConfig::default();

    App::new()
        .insert_resource(ClearColor(Color::BLACK))
        .insert_resource(Msaa::Sample4)
        .add_plugins(FrameTimeDiagnosticsPlugin)
        .add_plugins(EntityCountDiagnosticsPlugin)
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Pirate Breakout".into(),
                        resolution: (config.width, config.height).into(),
                        resize_constraints: WindowResizeConstraints {
                            min_width: config.width,
                            min_height: config.height,
                            max_width: config.max_width,
                            max_height: config.max_height,
                        },
                        ..default()
                    }),
                    ..default()
                })
                .set(LogPlugin {
                    level: Level::INFO,
                    filter: "wgpu=error,naga=warn,pirate_breakout=debug".into(),
                    ..default()
                }),
        )
        .insert_resource(config)
        .add_plugins((
            ArcadePhysicsPlugin,
            ScenePlugin,
            LoadingPlugin,
            PointerPlugin,
            RenderPlugin,
            UiPlugin,
        ))
        .add_systems(Startup, setup_camera)
        .run();
}

/// Centres the camera on the playfield and letterboxes it into the window.
fn setup_camera(mut commands: Commands, config: Res<GameConfig>) {
    let mut camera = Camera2dBundle::default();
    camera.projection.scaling_mode = ScalingMode::AutoMin {
        min_width: config.width,
        min_height: config.height,
    };
    camera.transform.translation.x = config.width * 0.5;
    camera.transform.translation.y = config.height * 0.5;
    commands.spawn((camera, MainCamera));
}

#[derive(Component)]
pub struct MainCamera;
