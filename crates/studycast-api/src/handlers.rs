//! Request handlers.

pub mod health;
pub mod jobs;
pub mod plan;
pub mod resources;

pub use health::*;
pub use jobs::*;
pub use plan::*;
pub use resources::*;
