//! Shared data models for the gateway fleet

mod device;
mod gateway;

pub use device::*;
pub use gateway::*;
