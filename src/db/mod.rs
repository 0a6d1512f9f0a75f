pub mod connection;
pub mod migrations;
pub mod queries;
pub mod repository;

pub use connection::Database;
pub use repository::RuleRepository;
