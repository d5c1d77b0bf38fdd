use std::fmt;

use serde::{Deserialize, Serialize};

/// Integration scheme used for every physics tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorKind {
    /// First-order, velocity updated before position.
    SemiImplicitEuler,
    /// Classical fourth-order Runge-Kutta with forces held over the step.
    #[default]
    Rk4,
}

/// Contact detection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    /// Overlap tests on the current positions.
    #[default]
    Discrete,
    /// Closed-form time of impact within the tick from relative velocity.
    Swept,
}

/// When detection and resolution run relative to integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionSchedule {
    /// Detect and resolve after every integration tick.
    #[default]
    EveryTick,
    /// Even frames integrate, odd frames detect and resolve once.
    AlternateFrames,
}

/// Shape of the immovable boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    /// Four cushion planes around the table surface.
    #[default]
    Table,
    /// Six planes enclosing a box: the four cushions plus floor and ceiling.
    Arena,
}

/// Every tunable constant of the simulation.
///
/// Lengths are in table units (metres), masses in kilograms, times in
/// milliseconds unless the field name says otherwise. Missing JSON fields fall
/// back to the billiards defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub ball_radius: f32,
    pub ball_mass: f32,
    /// Cushion planes sit at `x = ±table_half_length`.
    pub table_half_length: f32,
    /// Cushion planes sit at `z = ±table_half_width`.
    pub table_half_width: f32,
    /// Height of the cloth; ball centres rest at `table_surface_y + ball_radius`.
    pub table_surface_y: f32,
    /// Ceiling height above the cloth, only used by [`Boundary::Arena`].
    pub arena_height: f32,
    pub boundary: Boundary,
    pub restitution_ball_ball: f32,
    pub restitution_ball_plane: f32,
    pub kinetic_friction: f32,
    pub static_friction: f32,
    pub gravity: f32,
    /// Fixed physics tick.
    pub tick_ms: f32,
    /// Longest frame fed into the accumulator; longer stalls are clamped.
    pub max_frame_ms: f32,
    /// Horizontal speed under which a ball is snapped to rest.
    pub linear_rest_threshold: f32,
    /// Spin magnitude under which angular velocity is snapped to zero.
    pub angular_rest_threshold: f32,
    pub cue_speed: f32,
    /// Inverse mass of the cue tip; zero is an infinitely heavy cue.
    pub cue_inverse_mass: f32,
    /// Stabilisation: factor applied to the Y spin after every RK4 step.
    /// `1.0` disables it.
    pub spin_y_damping: f32,
    /// Direction of the static friction force relative to velocity:
    /// `+1.0` pushes along the motion, `-1.0` opposes it.
    pub static_friction_sign: f32,
    /// Sign applied to the torque induced by static friction.
    pub static_torque_sign: f32,
    pub integrator: IntegratorKind,
    pub detector: DetectorKind,
    pub schedule: CollisionSchedule,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ball_radius: 0.105,
            ball_mass: 0.17,
            table_half_length: 2.2,
            table_half_width: 1.1,
            table_surface_y: 0.0,
            arena_height: 2.0,
            boundary: Boundary::Table,
            restitution_ball_ball: 0.95,
            restitution_ball_plane: 0.8,
            kinetic_friction: 0.2,
            static_friction: 0.01,
            gravity: 9.81,
            tick_ms: 0.1,
            max_frame_ms: 16.67,
            linear_rest_threshold: 0.01,
            angular_rest_threshold: 0.01,
            cue_speed: 3.0,
            cue_inverse_mass: 0.0,
            spin_y_damping: 0.02,
            static_friction_sign: 1.0,
            static_torque_sign: 1.0,
            integrator: IntegratorKind::Rk4,
            detector: DetectorKind::Discrete,
            schedule: CollisionSchedule::EveryTick,
        }
    }
}

impl SimConfig {
    /// Parse a configuration from JSON. Absent fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the physics cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("ball_radius", self.ball_radius)?;
        positive("ball_mass", self.ball_mass)?;
        positive("tick_ms", self.tick_ms)?;
        positive("max_frame_ms", self.max_frame_ms)?;
        non_negative("gravity", self.gravity)?;
        non_negative("kinetic_friction", self.kinetic_friction)?;
        non_negative("static_friction", self.static_friction)?;
        non_negative("linear_rest_threshold", self.linear_rest_threshold)?;
        non_negative("angular_rest_threshold", self.angular_rest_threshold)?;
        non_negative("cue_speed", self.cue_speed)?;
        non_negative("cue_inverse_mass", self.cue_inverse_mass)?;
        in_range("restitution_ball_ball", self.restitution_ball_ball, 0.0, 1.0)?;
        in_range("restitution_ball_plane", self.restitution_ball_plane, 0.0, 1.0)?;
        in_range("spin_y_damping", self.spin_y_damping, 0.0, 1.0)?;
        in_range("static_friction_sign", self.static_friction_sign, -1.0, 1.0)?;
        in_range("static_torque_sign", self.static_torque_sign, -1.0, 1.0)?;
        if self.table_half_length <= self.ball_radius {
            return Err(ConfigError::TableTooSmall {
                field: "table_half_length",
                value: self.table_half_length,
            });
        }
        if self.table_half_width <= self.ball_radius {
            return Err(ConfigError::TableTooSmall {
                field: "table_half_width",
                value: self.table_half_width,
            });
        }
        if self.boundary == Boundary::Arena && self.arena_height <= 2.0 * self.ball_radius {
            return Err(ConfigError::TableTooSmall {
                field: "arena_height",
                value: self.arena_height,
            });
        }
        Ok(())
    }

    /// Fixed tick converted to seconds for the integrator.
    pub fn tick_seconds(&self) -> f32 {
        self.tick_ms / 1000.0
    }

    /// Magnitude of the kinetic (sliding) friction force.
    pub fn kinetic_friction_force(&self) -> f32 {
        self.kinetic_friction * self.ball_mass * self.gravity
    }

    /// Magnitude of the static (rolling) friction force.
    pub fn static_friction_force(&self) -> f32 {
        self.static_friction * self.ball_mass * self.gravity
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

fn in_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value, min, max })
    }
}

/// Why a configuration was rejected.
#[derive(Debug)]
pub enum ConfigError {
    /// The JSON could not be parsed.
    Parse(serde_json::Error),
    NotPositive { field: &'static str, value: f32 },
    Negative { field: &'static str, value: f32 },
    OutOfRange { field: &'static str, value: f32, min: f32, max: f32 },
    /// A boundary extent leaves no room for a ball.
    TableTooSmall { field: &'static str, value: f32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(err) => write!(f, "invalid config JSON: {}", err),
            ConfigError::NotPositive { field, value } => {
                write!(f, "{} must be positive and finite, got {}", field, value)
            }
            ConfigError::Negative { field, value } => {
                write!(f, "{} must be non-negative and finite, got {}", field, value)
            }
            ConfigError::OutOfRange { field, value, min, max } => {
                write!(f, "{} must be within [{}, {}], got {}", field, min, max, value)
            }
            ConfigError::TableTooSmall { field, value } => {
                write!(f, "{} = {} leaves no room for a ball", field, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}
