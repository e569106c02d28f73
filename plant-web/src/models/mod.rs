pub mod plant;
pub mod prediction;
pub mod user;

pub use plant::PlantEntry;
pub use prediction::Prediction;
pub use user::{SessionUser, User, SESSION_USERNAME_KEY};
