pub mod api;
pub mod core;
pub mod physics;
pub mod renderer;
pub mod input;

// Re-export key types at crate root for convenience
pub use api::config::{Boundary, CollisionSchedule, ConfigError, DetectorKind, IntegratorKind, SimConfig};
pub use api::simulation::Simulation;
pub use api::types::{BodyHandle, ContactKind};
pub use core::state::{BodyStore, Collision, Plane, RigidBody, Sphere, Transform};
pub use core::time::FixedTimestep;
pub use physics::friction::FrictionModel;
pub use physics::impulse::{CueStrike, StrikeOutcome};
pub use physics::resolution::{ResolveReport, Resolver};
pub use physics::{Detector, DiscreteDetector, Integrator, Rk4, SemiImplicitEuler, SweptDetector};
pub use renderer::instance::{TransformBuffer, WorldTransform};
pub use input::queue::{InputEvent, InputQueue, StrikeLatch};
