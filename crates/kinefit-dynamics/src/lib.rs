//! Finite-difference kinematics over fitted captures.
//!
//! [`CaptureDynamics`] loads a motion file, converts it to meters, attaches
//! a [`kinefit_anthro::BodyModel`] for the subject and differentiates the
//! pose track: root linear velocity and acceleration from the key
//! translations, per-joint angular velocity and acceleration from the key
//! rotations, plus global joint positions and root-relative end effector
//! trajectories. The five post-processing exports mirror what downstream
//! force estimation consumes.

pub mod derivatives;
pub mod error;
pub mod model;

pub use derivatives::{angular_rates, linear_rates, Rates};
pub use error::DynamicsError;
pub use model::{CaptureDynamics, SubjectParams};
