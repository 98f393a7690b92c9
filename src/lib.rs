// Ratioed: Like-ratio annotations for YouTube video listings
//
// This is the library root. Each module corresponds to a major subsystem
// of the annotation engine.

pub mod config;
pub mod coordinator;
pub mod host;
pub mod output;
pub mod page;
pub mod protocol;
pub mod ratio;
pub mod scan;
pub mod session;
pub mod settings;
pub mod stats;
pub mod status;
pub mod store;
