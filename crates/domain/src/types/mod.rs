//! Common data types used throughout the application

pub mod history;
pub mod platform;
pub mod schedule;
pub mod user;

pub use history::*;
pub use platform::*;
pub use schedule::*;
pub use user::*;
