pub mod user;

pub use user::{PublicUser, User, UserEnvelope, UserInput, UserRole};
