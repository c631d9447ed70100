//! Request dispatch and the listener of the caching proxy.

mod admin;
pub mod master;
pub mod router;

pub use master::Master;
pub use router::{ADMIN_CACHE_PATH, Route, Router};
