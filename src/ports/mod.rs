//! Ports (trait boundaries) for external dependencies.
//!
//! The learning core owns these traits; the simulator, storage backends and
//! training observers implement them.

pub mod environment;
pub mod observer;
pub mod repository;

pub use environment::Environment;
pub use observer::Observer;
pub use repository::QTableRepository;
