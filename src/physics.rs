//! Arcade-style physics: velocity integration, world bounds, circle vs box
//! contact against immovable colliders and sensor overlaps.
//!
//! The scene never inspects contacts directly; it listens for [`Collision`]
//! and [`Overlap`] events raised here.

use bevy::math::bounding::{Aabb2d, BoundingCircle, BoundingVolume, IntersectsVolume};
use bevy::prelude::*;

pub struct ArcadePhysicsPlugin;
impl Plugin for ArcadePhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PhysicsConfig>();
        let steps_per_second = app.world().resource::<PhysicsConfig>().steps_per_second;

        app.insert_resource(Time::<Fixed>::from_hz(steps_per_second))
            .init_resource::<WorldBounds>()
            .add_event::<Collision>()
            .add_event::<Overlap>()
            .add_systems(
                FixedUpdate,
                (integrate, collide_world_bounds, collide_solids, detect_overlaps)
                    .chain()
                    .in_set(PhysicsSet),
            );
    }
}

#[derive(SystemSet, Debug, Hash, Eq, PartialEq, Clone)]
pub struct PhysicsSet;

#[derive(Resource, Debug, Clone)]
pub struct PhysicsConfig {
    pub gravity: Vec2,
    /// Rate of the fixed physics step.
    pub steps_per_second: f64,
    /// Draw collider outlines and the debug window.
    pub debug: bool,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::ZERO,
            steps_per_second: 60.0,
            debug: false,
        }
    }
}

/// The rectangle dynamic bodies bounce inside of, with a switch per edge.
/// Empty until the scene sizes it.
#[derive(Resource, Debug, Clone)]
pub struct WorldBounds {
    pub rect: Rect,
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self::new(Rect::default())
    }
}

impl WorldBounds {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            left: true,
            right: true,
            top: true,
            bottom: true,
        }
    }

    pub fn set_collision(&mut self, left: bool, right: bool, top: bool, bottom: bool) {
        self.left = left;
        self.right = right;
        self.top = top;
        self.bottom = bottom;
    }
}

#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Deref, DerefMut)]
pub struct Velocity(pub Vec2);

/// Marks a moving body. Anything with a [`Collider`] but without this is
/// either [`Immovable`] or a [`Sensor`].
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct ArcadeBody {
    /// Fraction of velocity kept on each axis after a bounce.
    pub bounce: Vec2,
    pub collide_world_bounds: bool,
    pub allow_gravity: bool,
}

impl Default for ArcadeBody {
    fn default() -> Self {
        Self {
            bounce: Vec2::ZERO,
            collide_world_bounds: false,
            allow_gravity: true,
        }
    }
}

#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub enum Collider {
    Circle { radius: f32 },
    Rect { half_size: Vec2 },
}

impl Collider {
    pub fn rect(size: Vec2) -> Self {
        Collider::Rect {
            half_size: size * 0.5,
        }
    }

    pub fn half_extents(&self) -> Vec2 {
        match *self {
            Collider::Circle { radius } => Vec2::splat(radius),
            Collider::Rect { half_size } => half_size,
        }
    }
}

/// Solid that bodies bounce off without ever being pushed.
#[derive(Component, Debug, Default)]
pub struct Immovable;

/// Zone that reports overlaps but never blocks.
#[derive(Component, Debug, Default)]
pub struct Sensor;

/// A body touched an immovable collider this frame.
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Collision {
    pub body: Entity,
    pub other: Entity,
}

/// A body is inside a sensor this frame. Raised every frame it stays there.
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Overlap {
    pub body: Entity,
    pub other: Entity,
}

/// Which face of the box the body hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

/// Semi-implicit Euler step.
pub fn integrate_step(pos: Vec2, vel: Vec2, accel: Vec2, dt: f32) -> (Vec2, Vec2) {
    let vel = vel + accel * dt;
    (pos + vel * dt, vel)
}

/// Keeps a body of half extents `half` inside the enabled edges of `bounds`,
/// reflecting the velocity on contact.
pub fn bounce_in_bounds(
    mut pos: Vec2,
    mut vel: Vec2,
    half: Vec2,
    bounds: &WorldBounds,
    bounce: Vec2,
) -> (Vec2, Vec2) {
    let r = bounds.rect;
    if bounds.left && pos.x - half.x < r.min.x {
        pos.x = r.min.x + half.x;
        if vel.x < 0.0 {
            vel.x = -vel.x * bounce.x;
        }
    }
    if bounds.right && pos.x + half.x > r.max.x {
        pos.x = r.max.x - half.x;
        if vel.x > 0.0 {
            vel.x = -vel.x * bounce.x;
        }
    }
    // world y points up, so "top" is the max edge
    if bounds.top && pos.y + half.y > r.max.y {
        pos.y = r.max.y - half.y;
        if vel.y > 0.0 {
            vel.y = -vel.y * bounce.y;
        }
    }
    if bounds.bottom && pos.y - half.y < r.min.y {
        pos.y = r.min.y + half.y;
        if vel.y < 0.0 {
            vel.y = -vel.y * bounce.y;
        }
    }
    (pos, vel)
}

/// Face of `aabb` the circle touches. `vel` breaks the tie when the centre
/// has already tunnelled inside: only faces the body is moving into count.
pub fn contact_side(ball: BoundingCircle, aabb: Aabb2d, vel: Vec2) -> Option<Side> {
    if !ball.intersects(&aabb) {
        return None;
    }

    let center = ball.center();
    let closest = aabb.closest_point(center);
    let offset = center - closest;

    if offset == Vec2::ZERO {
        // leave through the shallowest face the body entered by
        let depths = [
            (center.x - aabb.min.x, Side::Left, vel.x > 0.0),
            (aabb.max.x - center.x, Side::Right, vel.x < 0.0),
            (aabb.max.y - center.y, Side::Top, vel.y < 0.0),
            (center.y - aabb.min.y, Side::Bottom, vel.y > 0.0),
        ];
        return depths
            .into_iter()
            .filter(|d| d.2 || vel == Vec2::ZERO)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|d| d.1);
    }

    let side = if offset.x.abs() > offset.y.abs() {
        if offset.x < 0.0 {
            Side::Left
        } else {
            Side::Right
        }
    } else if offset.y > 0.0 {
        Side::Top
    } else {
        Side::Bottom
    };
    Some(side)
}

/// Pushes a circle out of `aabb` through `side` and reflects the velocity
/// component heading into the box.
pub fn separate(
    mut center: Vec2,
    radius: f32,
    mut vel: Vec2,
    aabb: Aabb2d,
    side: Side,
    bounce: Vec2,
) -> (Vec2, Vec2) {
    match side {
        Side::Left => {
            center.x = aabb.min.x - radius;
            if vel.x > 0.0 {
                vel.x = -vel.x * bounce.x;
            }
        }
        Side::Right => {
            center.x = aabb.max.x + radius;
            if vel.x < 0.0 {
                vel.x = -vel.x * bounce.x;
            }
        }
        Side::Top => {
            center.y = aabb.max.y + radius;
            if vel.y < 0.0 {
                vel.y = -vel.y * bounce.y;
            }
        }
        Side::Bottom => {
            center.y = aabb.min.y - radius;
            if vel.y > 0.0 {
                vel.y = -vel.y * bounce.y;
            }
        }
    }
    (center, vel)
}

pub fn overlaps(a_pos: Vec2, a: Collider, b_pos: Vec2, b: Collider) -> bool {
    match (a, b) {
        (Collider::Circle { radius: ra }, Collider::Circle { radius: rb }) => {
            BoundingCircle::new(a_pos, ra).intersects(&BoundingCircle::new(b_pos, rb))
        }
        (Collider::Circle { radius }, Collider::Rect { half_size }) => {
            BoundingCircle::new(a_pos, radius).intersects(&Aabb2d::new(b_pos, half_size))
        }
        (Collider::Rect { half_size }, Collider::Circle { radius }) => {
            Aabb2d::new(a_pos, half_size).intersects(&BoundingCircle::new(b_pos, radius))
        }
        (Collider::Rect { half_size: ha }, Collider::Rect { half_size: hb }) => {
            Aabb2d::new(a_pos, ha).intersects(&Aabb2d::new(b_pos, hb))
        }
    }
}

fn integrate(
    time: Res<Time>,
    config: Res<PhysicsConfig>,
    mut q: Query<(&mut Transform, &mut Velocity, &ArcadeBody)>,
) {
    let dt = time.delta_seconds();
    for (mut t, mut vel, body) in &mut q {
        let accel = if body.allow_gravity {
            config.gravity
        } else {
            Vec2::ZERO
        };
        let (p, v) = integrate_step(t.translation.truncate(), vel.0, accel, dt);
        t.translation.x = p.x;
        t.translation.y = p.y;
        vel.0 = v;
    }
}

fn collide_world_bounds(
    bounds: Res<WorldBounds>,
    mut q: Query<(&mut Transform, &mut Velocity, &ArcadeBody, &Collider)>,
) {
    for (mut t, mut vel, body, collider) in &mut q {
        if !body.collide_world_bounds {
            continue;
        }
        let (p, v) = bounce_in_bounds(
            t.translation.truncate(),
            vel.0,
            collider.half_extents(),
            &bounds,
            body.bounce,
        );
        t.translation.x = p.x;
        t.translation.y = p.y;
        vel.0 = v;
    }
}

fn collide_solids(
    mut bodies: Query<
        (Entity, &mut Transform, &mut Velocity, &ArcadeBody, &Collider),
        Without<Immovable>,
    >,
    solids: Query<(Entity, &Transform, &Collider), With<Immovable>>,
    mut ev_collision: EventWriter<Collision>,
) {
    for (body_entity, mut t, mut vel, body, collider) in &mut bodies {
        let Collider::Circle { radius } = *collider else {
            continue;
        };
        for (solid_entity, solid_t, solid_collider) in &solids {
            let Collider::Rect { half_size } = *solid_collider else {
                continue;
            };
            let aabb = Aabb2d::new(solid_t.translation.truncate(), half_size);
            let center = t.translation.truncate();
            let Some(side) = contact_side(BoundingCircle::new(center, radius), aabb, vel.0)
            else {
                continue;
            };

            let (p, v) = separate(center, radius, vel.0, aabb, side, body.bounce);
            t.translation.x = p.x;
            t.translation.y = p.y;
            vel.0 = v;

            ev_collision.send(Collision {
                body: body_entity,
                other: solid_entity,
            });
        }
    }
}

fn detect_overlaps(
    bodies: Query<(Entity, &Transform, &Collider), With<ArcadeBody>>,
    sensors: Query<(Entity, &Transform, &Collider), With<Sensor>>,
    mut ev_overlap: EventWriter<Overlap>,
) {
    for (body_entity, t, collider) in &bodies {
        for (sensor_entity, sensor_t, sensor_collider) in &sensors {
            if overlaps(
                t.translation.truncate(),
                *collider,
                sensor_t.translation.truncate(),
                *sensor_collider,
            ) {
                ev_overlap.send(Overlap {
                    body: body_entity,
                    other: sensor_entity,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::time::TimeUpdateStrategy;
    use std::time::Duration;

    fn one_step() -> Duration {
        Time::<Fixed>::from_hz(PhysicsConfig::default().steps_per_second).timestep()
    }

    /// Every `update` after the first advances the clock by `frame`.
    fn physics_app(frame: Duration) -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(TimeUpdateStrategy::ManualDuration(frame))
            .add_plugins(ArcadePhysicsPlugin)
            .insert_resource(WorldBounds::new(Rect::new(0.0, 0.0, 800.0, 600.0)));
        // the first frame only starts the clock
        app.update();
        app
    }

    fn playfield_bounds() -> WorldBounds {
        let mut bounds = WorldBounds::new(Rect::new(0.0, 0.0, 800.0, 600.0));
        bounds.set_collision(true, true, true, false);
        bounds
    }

    fn paddle(app: &mut App) -> Entity {
        app.world_mut()
            .spawn((
                Transform::from_xyz(400.0, 50.0, 0.0),
                Collider::rect(Vec2::new(100.0, 20.0)),
                Immovable,
            ))
            .id()
    }

    fn ball(app: &mut App, pos: Vec2, vel: Vec2) -> Entity {
        app.world_mut()
            .spawn((
                Transform::from_translation(pos.extend(0.0)),
                Velocity(vel),
                ArcadeBody {
                    bounce: Vec2::ONE,
                    collide_world_bounds: true,
                    allow_gravity: false,
                },
                Collider::Circle { radius: 10.0 },
            ))
            .id()
    }

    fn sent<E: Event + Copy>(app: &App) -> Vec<E> {
        let events = app.world().resource::<Events<E>>();
        let mut reader = events.get_reader();
        reader.read(events).copied().collect()
    }

    #[test]
    fn integrate_step_moves_by_velocity() {
        let (p, v) = integrate_step(Vec2::ZERO, Vec2::new(150.0, 150.0), Vec2::ZERO, 0.5);
        assert_eq!(p, Vec2::new(75.0, 75.0));
        assert_eq!(v, Vec2::new(150.0, 150.0));
    }

    #[test]
    fn gravity_accelerates_before_moving() {
        let (p, v) = integrate_step(Vec2::ZERO, Vec2::ZERO, Vec2::new(0.0, -10.0), 1.0);
        assert_eq!(v, Vec2::new(0.0, -10.0));
        assert_eq!(p, Vec2::new(0.0, -10.0));
    }

    #[test]
    fn bounds_reflect_on_enabled_edges() {
        let bounds = playfield_bounds();
        let half = Vec2::splat(10.0);

        let (p, v) = bounce_in_bounds(
            Vec2::new(5.0, 300.0),
            Vec2::new(-100.0, 50.0),
            half,
            &bounds,
            Vec2::ONE,
        );
        assert_eq!(p.x, 10.0);
        assert_eq!(v, Vec2::new(100.0, 50.0));

        let (p, v) = bounce_in_bounds(
            Vec2::new(400.0, 598.0),
            Vec2::new(0.0, 80.0),
            half,
            &bounds,
            Vec2::ONE,
        );
        assert_eq!(p.y, 590.0);
        assert_eq!(v.y, -80.0);
    }

    #[test]
    fn disabled_bottom_lets_the_body_fall_through() {
        let bounds = playfield_bounds();
        let pos = Vec2::new(400.0, -20.0);
        let vel = Vec2::new(0.0, -150.0);
        let (p, v) = bounce_in_bounds(pos, vel, Vec2::splat(10.0), &bounds, Vec2::ONE);
        assert_eq!((p, v), (pos, vel));
    }

    #[test]
    fn contact_side_from_above() {
        let aabb = Aabb2d::new(Vec2::new(400.0, 50.0), Vec2::new(50.0, 10.0));
        let ball = BoundingCircle::new(Vec2::new(390.0, 65.0), 10.0);
        assert_eq!(contact_side(ball, aabb, Vec2::new(0.0, -150.0)), Some(Side::Top));

        let far = BoundingCircle::new(Vec2::new(390.0, 200.0), 10.0);
        assert_eq!(contact_side(far, aabb, Vec2::new(0.0, -150.0)), None);
    }

    #[test]
    fn tunnelled_centre_leaves_by_the_face_it_entered() {
        let aabb = Aabb2d::new(Vec2::new(400.0, 50.0), Vec2::new(50.0, 10.0));
        // just above the bottom face, but falling from above
        let ball = BoundingCircle::new(Vec2::new(400.0, 40.5), 10.0);
        assert_eq!(contact_side(ball, aabb, Vec2::new(0.0, -150.0)), Some(Side::Top));
        assert_eq!(contact_side(ball, aabb, Vec2::new(0.0, 150.0)), Some(Side::Bottom));
        assert_eq!(contact_side(ball, aabb, Vec2::ZERO), Some(Side::Bottom));
    }

    #[test]
    fn separate_pushes_out_and_reflects() {
        let aabb = Aabb2d::new(Vec2::new(400.0, 50.0), Vec2::new(50.0, 10.0));
        let (c, v) = separate(
            Vec2::new(390.0, 65.0),
            10.0,
            Vec2::new(30.0, -150.0),
            aabb,
            Side::Top,
            Vec2::ONE,
        );
        assert_eq!(c, Vec2::new(390.0, 70.0));
        assert_eq!(v, Vec2::new(30.0, 150.0));
    }

    #[test]
    fn ball_hitting_a_solid_raises_a_collision() {
        let mut app = physics_app(one_step());
        let ball = ball(&mut app, Vec2::new(390.0, 65.0), Vec2::new(0.0, -150.0));
        let paddle = paddle(&mut app);

        app.update();

        assert_eq!(
            sent::<Collision>(&app),
            vec![Collision {
                body: ball,
                other: paddle
            }]
        );
        let vel = app.world().get::<Velocity>(ball).unwrap();
        assert!(vel.y > 0.0);
    }

    #[test]
    fn sensors_report_overlap_without_blocking() {
        let mut app = physics_app(one_step());
        let ball = ball(&mut app, Vec2::new(400.0, -8.0), Vec2::new(0.0, -150.0));
        let zone = app
            .world_mut()
            .spawn((
                Transform::from_xyz(400.0, -10.0, 0.0),
                Collider::rect(Vec2::new(800.0, 10.0)),
                Sensor,
            ))
            .id();
        app.world_mut()
            .resource_mut::<WorldBounds>()
            .set_collision(true, true, true, false);

        app.update();

        assert_eq!(
            sent::<Overlap>(&app),
            vec![Overlap {
                body: ball,
                other: zone
            }]
        );
        assert!(sent::<Collision>(&app).is_empty());
        assert_eq!(app.world().get::<Velocity>(ball).unwrap().0, Vec2::new(0.0, -150.0));
    }

    #[test]
    fn slow_frame_does_not_drop_the_ball_through_the_paddle() {
        let mut app = physics_app(Duration::from_millis(200));
        let ball = ball(&mut app, Vec2::new(400.0, 70.5), Vec2::new(0.0, -150.0));
        paddle(&mut app);
        app.world_mut()
            .resource_mut::<WorldBounds>()
            .set_collision(true, true, true, false);

        app.update();

        let t = app.world().get::<Transform>(ball).unwrap();
        assert!(t.translation.y >= 70.0, "ball fell to {}", t.translation.y);
        assert!(app.world().get::<Velocity>(ball).unwrap().y > 0.0);
    }
}
