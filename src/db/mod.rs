pub mod models;
pub mod reads;
pub mod store;
pub mod writes;

pub use store::{Store, MIGRATOR};
