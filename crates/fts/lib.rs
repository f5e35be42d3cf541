pub mod error;
pub mod loader;
pub mod pivot;
pub mod record;

pub use error::Error;
