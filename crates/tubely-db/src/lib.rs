//! Metadata store for asset records
//!
//! [`VideoRepository`] is the only interface the upload pipeline depends on.
//! [`PgVideoRepository`] persists to PostgreSQL; [`InMemoryVideoRepository`]
//! backs local runs without a database and the test suites.

pub mod memory;
pub mod postgres;
pub mod repository;

pub use memory::InMemoryVideoRepository;
pub use postgres::{connect, PgVideoRepository};
pub use repository::VideoRepository;
