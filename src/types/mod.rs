//! Type definitions

pub mod customer;
pub mod messages;
pub mod result;
pub mod route;
pub mod schedule;

pub use customer::*;
pub use messages::*;
pub use result::*;
pub use route::*;
pub use schedule::*;
