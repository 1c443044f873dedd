//! Data models for the lodge registry.

mod changes;
mod member;
mod task;

pub use changes::*;
pub use member::*;
pub use task::*;
