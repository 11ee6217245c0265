//! Command implementations

pub mod cache;
pub mod list_updates;
pub mod ps;
pub mod update;

pub use cache::cache;
pub use list_updates::list_updates;
pub use ps::ps;
pub use update::update;
