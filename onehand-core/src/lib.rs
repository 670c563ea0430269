//! onehand-core: domain types shared by the One Hand server and CLI
//!
//! Validated input types, the reservation state model and the layered
//! configuration live here so they can be used without a database.

pub mod config;
pub mod error;
pub mod reservation;
pub mod validation;

pub use config::OneHandConfig;
pub use error::{OneHandError, Result};
pub use reservation::{ReservationPolicy, ReservationState};
pub use validation::{
    Coordinates, Cost, Description, Email, Location, Password, Phone, ValidationError,
};
