//! Entity payloads: the things that live inside environments.

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::draw::{DrawList, Rgba};
use crate::input::{InputEvent, Key};
use crate::payload::{Payload, PayloadTransform, Spawnable};
use crate::physics::MassBody;
use crate::registry::PaletteRegistryBuilder;

/// Registration list for entities, in palette order.
pub fn register(builder: PaletteRegistryBuilder) -> PaletteRegistryBuilder {
    builder
        .entity::<Eye>("Eye")
        .entity::<Mouth>("Mouth")
        .entity::<Ball>("Ball")
        .entity::<VoidEntity>("Void Entity")
}

// ============================================================================
// Eye
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EyeState {
    pub radius: f32,
    /// Seconds the eye stays shut.
    pub blink_duration: f32,
}

/// An eye that blinks when Space is pressed.
#[derive(Debug, Clone)]
pub struct Eye {
    position: Vec2,
    transform: PayloadTransform,
    pub state: EyeState,
    blink_timer: f32,
    blinking: bool,
}

impl Eye {
    pub fn is_blinking(&self) -> bool {
        self.blinking
    }
}

impl Spawnable for Eye {
    const TYPE_PATH: &'static str = "entities::eye::Eye";

    fn spawn(position: Vec2) -> Self {
        Self {
            position,
            transform: PayloadTransform::default(),
            state: EyeState {
                radius: 22.0,
                blink_duration: 0.12,
            },
            blink_timer: 0.0,
            blinking: false,
        }
    }
}

impl Payload for Eye {
    payload_state_accessors!();

    fn radius(&self) -> f32 {
        self.state.radius
    }

    fn handle_event(&mut self, event: &InputEvent, _ctx: &mut AppContext) -> bool {
        if event.is_key_down(Key::Space) {
            self.blinking = true;
            self.blink_timer = self.state.blink_duration;
            return true;
        }
        false
    }

    fn update(&mut self, dt: f32, _ctx: &mut AppContext) {
        if self.blinking {
            self.blink_timer -= dt;
            if self.blink_timer <= 0.0 {
                self.blinking = false;
            }
        }
    }

    fn render(&self, _ctx: &AppContext, draw: &mut DrawList) {
        let r = self.state.radius;
        if self.blinking {
            draw.line(
                self.position - Vec2::new(r, 0.0),
                self.position + Vec2::new(r, 0.0),
                Rgba::BLACK,
            );
        } else {
            draw.circle(self.position, r, Rgba::BLACK);
            draw.circle(self.position, r / 4.0, Rgba::BLACK);
        }
    }
}

// ============================================================================
// Mouth
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouthState {
    pub radius: f32,
    /// Opening speed in full openings per second.
    pub open_speed: f32,
}

/// A mouth that opens while Space is held.
#[derive(Debug, Clone)]
pub struct Mouth {
    position: Vec2,
    transform: PayloadTransform,
    pub state: MouthState,
    /// 0.0 closed, 1.0 fully open.
    open_amount: f32,
    talking: bool,
}

impl Mouth {
    pub fn open_amount(&self) -> f32 {
        self.open_amount
    }
}

impl Spawnable for Mouth {
    const TYPE_PATH: &'static str = "entities::mouth::Mouth";

    fn spawn(position: Vec2) -> Self {
        Self {
            position,
            transform: PayloadTransform::default(),
            state: MouthState {
                radius: 18.0,
                open_speed: 6.0,
            },
            open_amount: 0.0,
            talking: false,
        }
    }
}

impl Payload for Mouth {
    payload_state_accessors!();

    fn radius(&self) -> f32 {
        self.state.radius
    }

    fn handle_event(&mut self, event: &InputEvent, _ctx: &mut AppContext) -> bool {
        if event.is_key_down(Key::Space) {
            self.talking = true;
            return true;
        }
        if event.is_key_up(Key::Space) {
            self.talking = false;
            return true;
        }
        false
    }

    fn update(&mut self, dt: f32, _ctx: &mut AppContext) {
        let target = if self.talking { 1.0 } else { 0.0 };
        let step = self.state.open_speed * dt;
        if self.open_amount < target {
            self.open_amount = (self.open_amount + step).min(target);
        } else if self.open_amount > target {
            self.open_amount = (self.open_amount - step).max(target);
        }
    }

    fn render(&self, _ctx: &AppContext, draw: &mut DrawList) {
        let r = self.state.radius;
        let open_height = r * self.open_amount;
        if open_height <= 1.0 {
            draw.line(
                self.position - Vec2::new(r, 0.0),
                self.position + Vec2::new(r, 0.0),
                Rgba::BLACK,
            );
        } else {
            draw.ellipse(self.position, Vec2::new(r, open_height / 2.0), Rgba::BLACK);
        }
    }
}

// ============================================================================
// Ball
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallState {
    pub radius: f32,
    /// Mass in kg.
    pub mass: f32,
    /// Downward acceleration in m/s².
    pub gravity: f32,
    /// Fraction of vertical speed kept after hitting the floor.
    pub restitution: f32,
    /// Horizontal friction in 1/s.
    pub damping: f32,
    pub color: [u8; 3],
}

/// A ball that falls under gravity and bounces on the bottom of the canvas.
#[derive(Debug, Clone)]
pub struct Ball {
    position: Vec2,
    transform: PayloadTransform,
    pub state: BallState,
    body: Option<MassBody>,
}

impl Ball {
    pub fn velocity(&self) -> Vec2 {
        self.body.as_ref().map_or(Vec2::ZERO, |b| b.velocity)
    }
}

impl Spawnable for Ball {
    const TYPE_PATH: &'static str = "entities::ball::Ball";

    fn spawn(position: Vec2) -> Self {
        Self {
            position,
            transform: PayloadTransform::default(),
            state: BallState {
                radius: 12.0,
                mass: 1.0,
                gravity: 9.8,
                restitution: 0.6,
                damping: 0.5,
                color: [200, 60, 60],
            },
            body: None,
        }
    }
}

impl Payload for Ball {
    payload_state_accessors!();

    fn radius(&self) -> f32 {
        self.state.radius
    }

    fn on_spawn(&mut self, _ctx: &mut AppContext) {
        self.body = Some(MassBody::new(self.position, self.state.mass, Vec2::ZERO));
    }

    fn on_despawn(&mut self, _ctx: &mut AppContext) {
        self.body = None;
    }

    fn update(&mut self, dt: f32, ctx: &mut AppContext) {
        let Some(body) = self.body.as_mut() else {
            return;
        };
        body.apply_acceleration(Vec2::new(0.0, self.state.gravity));
        body.apply_damping_x(self.state.damping);
        body.integrate(dt);

        let floor = ctx.viewport.y - self.state.radius;
        if body.position.y > floor {
            body.position.y = floor;
            body.velocity.y = -body.velocity.y * self.state.restitution;
        }
        self.position = body.position;
    }

    fn render(&self, _ctx: &AppContext, draw: &mut DrawList) {
        draw.circle(
            self.position,
            self.state.radius,
            Rgba::from_array(self.state.color),
        );
    }
}

// ============================================================================
// VoidEntity
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoidEntityState {
    pub visible: bool,
    pub radius: f32,
    pub color: [u8; 3],
}

/// Behaviorless entity used to hang environments under an entity slot.
#[derive(Debug, Clone)]
pub struct VoidEntity {
    position: Vec2,
    transform: PayloadTransform,
    pub state: VoidEntityState,
}

impl Spawnable for VoidEntity {
    const TYPE_PATH: &'static str = "entities::misc::void::VoidEntity";

    fn spawn(position: Vec2) -> Self {
        Self {
            position,
            transform: PayloadTransform::default(),
            state: VoidEntityState {
                visible: false,
                radius: 10.0,
                color: [90, 90, 90],
            },
        }
    }
}

impl Payload for VoidEntity {
    payload_state_accessors!();

    fn radius(&self) -> f32 {
        self.state.radius.max(1.0)
    }

    fn render(&self, _ctx: &AppContext, draw: &mut DrawList) {
        if self.state.visible {
            draw.circle(self.position, self.radius(), Rgba::from_array(self.state.color));
        }
    }
}
