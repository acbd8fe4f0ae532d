//! Entry points for the host application: load a snapshot, run the engine.

pub mod service;

pub use service::CommissionService;
