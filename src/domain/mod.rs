//! Entities, value objects and the ports the lifecycle engine talks through.

pub mod events;
pub mod identifiers;
pub mod money;
pub mod payment;
pub mod ports;
pub mod refund;
pub mod transaction;
pub mod validation;
