//! KONSILIUM gateway: HTTP surface, generation providers, specialist agents
//! and the multi-specialist consultation orchestrator.

pub mod consultations;
pub mod orchestrator;
pub mod providers;
pub mod server;
pub mod specialists;
pub mod state;
