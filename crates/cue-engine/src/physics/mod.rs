pub mod detection;
pub mod friction;
pub mod impulse;
pub mod integrator;
pub mod resolution;

pub use detection::{Detector, DiscreteDetector, SweptDetector};
pub use integrator::{Integrator, Rk4, SemiImplicitEuler};
