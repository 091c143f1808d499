use bevy::prelude::*;

/// Every tuning value of the playfield in one place.
///
/// Positions are given in playfield coordinates: origin in the top-left
/// corner, x to the right, y down. Use [`GameConfig::to_world`] to place
/// things in the Bevy world.
#[derive(Resource, Clone, Debug)]
pub struct GameConfig {
    pub width: f32,
    pub height: f32,
    pub max_width: f32,
    pub max_height: f32,

    pub background_path: &'static str,
    pub background_alpha: f32,

    pub paddle_pos: Vec2,
    pub paddle_size: Vec2,
    pub paddle_min_x: f32,
    pub paddle_max_x: f32,
    pub paddle_color: Color,

    pub ball_pos: Vec2,
    pub ball_radius: f32,
    pub ball_color: Color,
    pub initial_ball_speed: f32,
    pub speed_up_factor: f32,

    /// Horizontal speed gained per unit of distance from the paddle centre.
    pub deflect_factor: f32,
    /// Range of the horizontal kick when the ball lands dead centre.
    pub center_kick_min: f32,
    pub center_kick_max: f32,

    pub brick_rows: usize,
    pub brick_cols: usize,
    pub brick_size: Vec2,
    pub brick_gap: f32,
    pub brick_offset: Vec2,
    pub brick_colors: [Color; 3],
    pub score_per_brick: u32,

    pub death_zone_pos: Vec2,
    pub death_zone_size: Vec2,

    pub text_color: Color,
    pub score_text_pos: Vec2,
    pub score_font_size: f32,
    pub game_over_font_size: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            max_width: 1600.0,
            max_height: 1200.0,

            background_path: "isla_pirata.png",
            background_alpha: 0.5,

            paddle_pos: Vec2::new(400.0, 550.0),
            paddle_size: Vec2::new(100.0, 20.0),
            paddle_min_x: 50.0,
            paddle_max_x: 750.0,
            paddle_color: Color::srgb_u8(0x29, 0xad, 0xff),

            ball_pos: Vec2::new(400.0, 300.0),
            ball_radius: 10.0,
            ball_color: Color::srgb_u8(0xa8, 0xe7, 0x2e),
            initial_ball_speed: 150.0,
            speed_up_factor: 1.1,

            deflect_factor: 10.0,
            center_kick_min: 2.0,
            center_kick_max: 10.0,

            brick_rows: 5,
            brick_cols: 8,
            brick_size: Vec2::new(75.0, 20.0),
            brick_gap: 10.0,
            brick_offset: Vec2::new(100.0, 50.0),
            brick_colors: [
                Color::srgb_u8(0xff, 0x77, 0xa8),
                Color::srgb_u8(0xff, 0x9d, 0x81),
                Color::srgb_u8(0xf3, 0xef, 0x7d),
            ],
            score_per_brick: 10,

            death_zone_pos: Vec2::new(400.0, 610.0),
            death_zone_size: Vec2::new(800.0, 10.0),

            text_color: Color::srgb_u8(0xff, 0xf1, 0xe8),
            score_text_pos: Vec2::new(16.0, 16.0),
            score_font_size: 18.0,
            game_over_font_size: 32.0,
        }
    }
}

impl GameConfig {
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        self.size() * 0.5
    }

    /// Playfield point to world point. The camera sits on the playfield
    /// centre, so only y flips.
    pub fn to_world(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x, self.height - p.y)
    }

    pub fn to_playfield(&self, world: Vec2) -> Vec2 {
        Vec2::new(world.x, self.height - world.y)
    }

    pub fn brick_count(&self) -> usize {
        self.brick_rows * self.brick_cols
    }

    /// Centre of the brick at `row`/`col`, in playfield coordinates.
    pub fn brick_pos(&self, row: usize, col: usize) -> Vec2 {
        self.brick_offset
            + Vec2::new(
                col as f32 * (self.brick_size.x + self.brick_gap),
                row as f32 * (self.brick_size.y + self.brick_gap),
            )
    }

    pub fn brick_color(&self, row: usize, col: usize) -> Color {
        self.brick_colors[(row * self.brick_cols + col) % self.brick_colors.len()]
    }
}
