pub mod checks;
pub(crate) mod health;
pub mod stream;
pub mod traces;

pub use health::health_check;
