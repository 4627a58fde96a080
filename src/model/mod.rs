//! Pure data structures shared by the backend, the session store and the dashboard.

pub mod click;
pub mod credentials;
pub mod link;
pub mod principal;

pub use click::*;
pub use credentials::*;
pub use link::*;
pub use principal::*;
