//! The mission engine's function-call boundary.
//!
//! A request-handling layer owns an [`Engine`] and calls
//! [`Engine::redeem`] and [`Engine::compute_progression`] with an account id
//! supplied by its identity provider. The engine reads time from a
//! [`Clock`](spirit_core::clock::Clock) and talks to a [`MissionStore`]:
//! PostgreSQL in production, [`MemoryStore`] for tests and embedding.

pub mod config;
pub mod engine;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use config::{EngineConfig, LogFormat};
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::MissionStore;
