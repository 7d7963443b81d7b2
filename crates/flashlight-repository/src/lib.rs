//! The `PlayerRepository` trait and its two implementations: a
//! Postgres-backed store for production and an in-memory store for tests and
//! `development`.

mod in_memory;
mod postgres;
mod repository;

pub use in_memory::InMemoryPlayerRepository;
pub use postgres::PostgresPlayerRepository;
pub use repository::PlayerRepository;
