pub mod executor;
pub mod harvest;
pub mod logging;
pub mod model;
pub mod traits;

#[cfg(test)]
mod testing;

// Re-export common types for convenience
pub use executor::*;
pub use harvest::*;
pub use model::*;
pub use traits::*;
