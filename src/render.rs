use bevy::prelude::*;
use bevy::sprite::Mesh2dHandle;

use crate::config::GameConfig;
use crate::loading::SceneAssets;
use crate::physics::{Collider, Immovable, PhysicsConfig, Sensor};
use crate::scene::{Ball, ScenePhase, SceneEntity};

pub struct RenderPlugin;
impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, create_ball_visuals)
            .add_systems(OnEnter(ScenePhase::Running), spawn_background)
            .add_systems(Update, (attach_ball_visuals, draw_colliders));
    }
}

#[derive(Resource)]
struct BallVisuals {
    mesh: Mesh2dHandle,
    material: Handle<ColorMaterial>,
}

/// Scale that makes an image of `image` size cover `viewport` entirely while
/// keeping its aspect ratio.
pub fn cover_scale(viewport: Vec2, image: Vec2) -> f32 {
    (viewport.x / image.x).max(viewport.y / image.y)
}

fn create_ball_visuals(
    mut commands: Commands,
    config: Res<GameConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    commands.insert_resource(BallVisuals {
        mesh: Mesh2dHandle(meshes.add(Circle::new(config.ball_radius))),
        material: materials.add(ColorMaterial::from(config.ball_color)),
    });
}

fn spawn_background(
    mut commands: Commands,
    config: Res<GameConfig>,
    assets: Option<Res<SceneAssets>>,
    images: Res<Assets<Image>>,
) {
    let Some(assets) = assets else {
        return;
    };
    let Some(image) = images.get(&assets.background) else {
        return;
    };

    let image_size = image.size_f32();
    let size = image_size * cover_scale(config.size(), image_size);
    commands.spawn((
        SceneEntity,
        SpriteBundle {
            texture: assets.background.clone(),
            sprite: Sprite {
                // drawn over a black clear colour, so alpha darkens it
                color: Color::srgba(1.0, 1.0, 1.0, config.background_alpha),
                custom_size: Some(size),
                ..default()
            },
            transform: Transform::from_translation(config.to_world(config.center()).extend(-10.0)),
            ..default()
        },
    ));
}

fn attach_ball_visuals(
    mut commands: Commands,
    visuals: Res<BallVisuals>,
    balls: Query<Entity, Added<Ball>>,
) {
    for e in &balls {
        commands
            .entity(e)
            .insert((visuals.mesh.clone(), visuals.material.clone()));
    }
}

fn draw_colliders(
    mut gizmos: Gizmos,
    physics: Res<PhysicsConfig>,
    q: Query<(&Transform, &Collider, Has<Immovable>, Has<Sensor>)>,
) {
    if !physics.debug {
        return;
    }
    for (t, collider, immovable, sensor) in &q {
        let color = if sensor {
            Color::srgb(1.0, 0.2, 0.2)
        } else if immovable {
            Color::srgb(0.2, 1.0, 0.4)
        } else {
            Color::srgb(1.0, 0.0, 1.0)
        };
        let pos = t.translation.truncate();
        match *collider {
            Collider::Circle { radius } => {
                gizmos.circle_2d(pos, radius, color);
            }
            Collider::Rect { half_size } => {
                gizmos.rect_2d(pos, Rot2::IDENTITY, half_size * 2.0, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cover_scale_fills_the_wider_axis() {
        let viewport = Vec2::new(800.0, 600.0);
        // tall image: width decides
        assert_eq!(cover_scale(viewport, Vec2::new(400.0, 600.0)), 2.0);
        // wide image: height decides
        assert_eq!(cover_scale(viewport, Vec2::new(1600.0, 300.0)), 2.0);
        assert_eq!(cover_scale(viewport, viewport), 1.0);
    }

    #[test]
    fn covered_image_is_never_smaller_than_the_viewport() {
        let viewport = Vec2::new(800.0, 600.0);
        for image in [Vec2::new(1024.0, 768.0), Vec2::new(300.0, 900.0), Vec2::new(2000.0, 100.0)] {
            let size = image * cover_scale(viewport, image);
            assert!(size.x >= viewport.x - 1e-3 && size.y >= viewport.y - 1e-3);
        }
    }
}
