//! Method dispatch: handler registry, observer hook and the gateway tying them together

pub mod events;
pub mod gateway;
pub mod registry;
