use std::cmp::Ordering;

use bevy::ecs::entity::EntityHashSet;
use bevy::prelude::*;
use bevy::sprite::Anchor;
use rand::Rng;

use crate::config::GameConfig;
use crate::input::{PointerDown, PointerMove};
use crate::physics::{
    ArcadeBody, Collider, Collision, Immovable, Overlap, PhysicsSet, Sensor, Velocity, WorldBounds,
};

/// Scene lifecycle. `Restarting` exists only so that leaving and re-entering
/// `Running` tears the scene down and builds it again.
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScenePhase {
    #[default]
    Preload,
    Running,
    Restarting,
}

/// Per-scene bookkeeping, rebuilt from scratch on every setup.
#[derive(Resource, Debug, Default, Clone, PartialEq, Eq)]
pub struct SceneState {
    pub score: u32,
    pub game_over: bool,
}

/// Base ball speed. Outlives the scene so a cleared board can speed up the
/// next one.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct BallSpeed(pub f32);

#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestartScene {
    /// Every brick destroyed.
    Cleared,
    /// Clicked after game over.
    Lost,
}

/// Despawned on teardown.
#[derive(Component, Debug, Default)]
pub struct SceneEntity;

#[derive(Component, Debug)]
pub struct Paddle;

#[derive(Component, Debug)]
pub struct Ball;

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Brick {
    pub row: usize,
    pub col: usize,
}

#[derive(Component, Debug)]
pub struct DeathZone;

#[derive(Component, Debug)]
pub struct ScoreText;

#[derive(Component, Debug)]
pub struct GameOverText;

pub struct ScenePlugin;
impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GameConfig>();
        let initial_speed = app.world().resource::<GameConfig>().initial_ball_speed;

        app.init_state::<ScenePhase>()
            .init_resource::<SceneState>()
            .insert_resource(BallSpeed(initial_speed))
            .add_event::<RestartScene>()
            .add_event::<PointerMove>()
            .add_event::<PointerDown>()
            .add_systems(OnEnter(ScenePhase::Running), setup_scene)
            .add_systems(OnExit(ScenePhase::Running), teardown_scene)
            .add_systems(
                Update,
                finish_restart.run_if(in_state(ScenePhase::Restarting)),
            )
            // pointer input lands before the physics step, contact rules after
            .add_systems(
                FixedUpdate,
                (track_pointer, restart_on_pointer_down)
                    .chain()
                    .before(PhysicsSet)
                    .run_if(in_state(ScenePhase::Running)),
            )
            .add_systems(
                FixedUpdate,
                (hit_paddle, hit_brick, enter_death_zone, handle_restart)
                    .chain()
                    .after(PhysicsSet)
                    .after(restart_on_pointer_down)
                    .run_if(in_state(ScenePhase::Running)),
            );
    }
}

pub fn score_label(score: u32) -> String {
    format!("Score: {score}")
}

pub fn paddle_x(pointer_x: f32, config: &GameConfig) -> f32 {
    pointer_x.clamp(config.paddle_min_x, config.paddle_max_x)
}

/// New horizontal ball velocity after touching the paddle. The further from
/// the centre, the sharper the angle; a dead-centre hit gets a small kick.
pub fn deflect_velocity_x(
    ball_x: f32,
    paddle_x: f32,
    config: &GameConfig,
    rng: &mut impl Rng,
) -> f32 {
    match ball_x.partial_cmp(&paddle_x) {
        Some(Ordering::Less) => -config.deflect_factor * (paddle_x - ball_x),
        Some(Ordering::Greater) => config.deflect_factor * (ball_x - paddle_x),
        _ => rng.gen_range(config.center_kick_min..config.center_kick_max),
    }
}

pub fn next_ball_speed(current: f32, reason: RestartScene, config: &GameConfig) -> f32 {
    match reason {
        RestartScene::Cleared => current * config.speed_up_factor,
        RestartScene::Lost => config.initial_ball_speed,
    }
}

fn setup_scene(
    mut commands: Commands,
    config: Res<GameConfig>,
    speed: Res<BallSpeed>,
    mut state: ResMut<SceneState>,
    mut bounds: ResMut<WorldBounds>,
) {
    *state = SceneState::default();

    bounds.rect = Rect::from_corners(Vec2::ZERO, config.size());
    // the ball has to be able to fall out of the bottom
    bounds.set_collision(true, true, true, false);

    commands.spawn((
        Paddle,
        Immovable,
        Collider::rect(config.paddle_size),
        SceneEntity,
        SpriteBundle {
            sprite: Sprite {
                color: config.paddle_color,
                custom_size: Some(config.paddle_size),
                ..default()
            },
            transform: Transform::from_translation(config.to_world(config.paddle_pos).extend(0.0)),
            ..default()
        },
    ));

    // Up and to the right. The mesh is attached by the render plugin.
    commands.spawn((
        Ball,
        Velocity(Vec2::new(speed.0, speed.0)),
        ArcadeBody {
            bounce: Vec2::ONE,
            collide_world_bounds: true,
            ..default()
        },
        Collider::Circle {
            radius: config.ball_radius,
        },
        SceneEntity,
        SpatialBundle::from_transform(Transform::from_translation(
            config.to_world(config.ball_pos).extend(1.0),
        )),
    ));

    for row in 0..config.brick_rows {
        for col in 0..config.brick_cols {
            let pos = config.to_world(config.brick_pos(row, col));
            commands.spawn((
                Brick { row, col },
                Immovable,
                Collider::rect(config.brick_size),
                SceneEntity,
                SpriteBundle {
                    sprite: Sprite {
                        color: config.brick_color(row, col),
                        custom_size: Some(config.brick_size),
                        ..default()
                    },
                    transform: Transform::from_translation(pos.extend(0.0)),
                    ..default()
                },
            ));
        }
    }

    commands.spawn((
        DeathZone,
        Sensor,
        Collider::rect(config.death_zone_size),
        SceneEntity,
        TransformBundle::from_transform(Transform::from_translation(
            config.to_world(config.death_zone_pos).extend(0.0),
        )),
    ));

    commands.spawn((
        GameOverText,
        SceneEntity,
        Text2dBundle {
            text: Text::from_section(
                "Game Over\nClick to Restart",
                TextStyle {
                    font_size: config.game_over_font_size,
                    color: config.text_color,
                    ..default()
                },
            )
            .with_justify(JustifyText::Center),
            transform: Transform::from_translation(config.to_world(config.center()).extend(10.0)),
            visibility: Visibility::Hidden,
            ..default()
        },
    ));

    commands.spawn((
        ScoreText,
        SceneEntity,
        Text2dBundle {
            text: Text::from_section(
                score_label(0),
                TextStyle {
                    font_size: config.score_font_size,
                    color: config.text_color,
                    ..default()
                },
            )
            .with_justify(JustifyText::Left),
            text_anchor: Anchor::TopLeft,
            transform: Transform::from_translation(
                config.to_world(config.score_text_pos).extend(10.0),
            ),
            ..default()
        },
    ));

    info!(
        "scene ready: {} bricks, ball speed {:.1}",
        config.brick_count(),
        speed.0
    );
}

fn teardown_scene(mut commands: Commands, q: Query<Entity, With<SceneEntity>>) {
    for e in &q {
        commands.entity(e).despawn_recursive();
    }
}

fn finish_restart(mut next_phase: ResMut<NextState<ScenePhase>>) {
    next_phase.set(ScenePhase::Running);
}

fn track_pointer(
    mut ev_move: EventReader<PointerMove>,
    config: Res<GameConfig>,
    mut paddles: Query<&mut Transform, With<Paddle>>,
) {
    let Some(ev) = ev_move.read().last() else {
        return;
    };
    let Ok(mut t) = paddles.get_single_mut() else {
        return;
    };
    t.translation.x = paddle_x(ev.position.x, &config);
}

fn hit_paddle(
    mut ev_collision: EventReader<Collision>,
    config: Res<GameConfig>,
    paddles: Query<&Transform, With<Paddle>>,
    mut balls: Query<(&Transform, &mut Velocity), With<Ball>>,
) {
    let mut rng = rand::thread_rng();
    for ev in ev_collision.read() {
        let Ok(paddle_t) = paddles.get(ev.other) else {
            continue;
        };
        let Ok((ball_t, mut vel)) = balls.get_mut(ev.body) else {
            continue;
        };
        vel.x = deflect_velocity_x(
            ball_t.translation.x,
            paddle_t.translation.x,
            &config,
            &mut rng,
        );
        debug!(
            "paddle hit at offset {:.1}, vx {:.1}",
            ball_t.translation.x - paddle_t.translation.x,
            vel.x
        );
    }
}

fn hit_brick(
    mut commands: Commands,
    mut ev_collision: EventReader<Collision>,
    config: Res<GameConfig>,
    mut state: ResMut<SceneState>,
    balls: Query<(), With<Ball>>,
    bricks: Query<(Entity, &Brick)>,
    mut score_text: Query<&mut Text, With<ScoreText>>,
    mut ev_restart: EventWriter<RestartScene>,
) {
    // a ball can report the same brick more than once before despawn lands
    let mut destroyed = EntityHashSet::default();
    for ev in ev_collision.read() {
        if !balls.contains(ev.body) {
            continue;
        }
        let Ok((entity, brick)) = bricks.get(ev.other) else {
            continue;
        };
        if !destroyed.insert(entity) {
            continue;
        }
        commands.entity(entity).despawn_recursive();
        state.score += config.score_per_brick;
        debug!(
            "brick ({}, {}) destroyed, score {}",
            brick.row, brick.col, state.score
        );
    }

    if destroyed.is_empty() {
        return;
    }

    if let Ok(mut text) = score_text.get_single_mut() {
        text.sections[0].value = score_label(state.score);
    }

    let remaining = bricks
        .iter()
        .filter(|(e, _)| !destroyed.contains(e))
        .count();
    if remaining == 0 {
        info!("board cleared with score {}", state.score);
        ev_restart.send(RestartScene::Cleared);
    }
}

fn enter_death_zone(
    mut ev_overlap: EventReader<Overlap>,
    mut state: ResMut<SceneState>,
    zones: Query<(), With<DeathZone>>,
    mut balls: Query<(&mut Velocity, &mut ArcadeBody), With<Ball>>,
    mut game_over_text: Query<&mut Visibility, With<GameOverText>>,
) {
    for ev in ev_overlap.read() {
        if state.game_over || !zones.contains(ev.other) {
            continue;
        }
        let Ok((mut vel, mut body)) = balls.get_mut(ev.body) else {
            continue;
        };

        vel.0 = Vec2::ZERO;
        body.collide_world_bounds = false;
        if let Ok(mut visibility) = game_over_text.get_single_mut() {
            *visibility = Visibility::Visible;
        }
        state.game_over = true;
        info!("game over with score {}", state.score);
    }
}

fn restart_on_pointer_down(
    mut ev_down: EventReader<PointerDown>,
    state: Res<SceneState>,
    mut ev_restart: EventWriter<RestartScene>,
) {
    if ev_down.read().count() == 0 || !state.game_over {
        return;
    }
    ev_restart.send(RestartScene::Lost);
}

fn handle_restart(
    mut ev_restart: EventReader<RestartScene>,
    config: Res<GameConfig>,
    mut speed: ResMut<BallSpeed>,
    mut next_phase: ResMut<NextState<ScenePhase>>,
) {
    let Some(&reason) = ev_restart.read().last() else {
        return;
    };
    speed.0 = next_ball_speed(speed.0, reason, &config);
    info!("restarting scene ({:?}), ball speed {:.1}", reason, speed.0);
    next_phase.set(ScenePhase::Restarting);
}
