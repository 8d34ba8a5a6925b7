//! API service models

pub mod establishment;
pub mod login_token;
pub mod review;
pub mod session;
pub mod user;

// Re-export for convenience
pub use establishment::{Establishment, NewEstablishment};
pub use login_token::LoginToken;
pub use review::{Housing, HousingQuality, Review, ReviewFields, ReviewWithAuthor};
pub use session::Session;
pub use user::User;
