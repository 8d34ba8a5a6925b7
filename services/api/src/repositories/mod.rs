//! Repositories for database operations

pub mod establishment;
pub mod review;
pub mod token;
pub mod user;

// Re-export for convenience
pub use establishment::EstablishmentRepository;
pub use review::ReviewRepository;
pub use token::{LoginTokenRepository, SessionRepository};
pub use user::UserRepository;
