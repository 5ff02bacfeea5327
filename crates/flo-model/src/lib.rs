//! Plain data types shared by the flo runners.
//!
//! Nothing here schedules or runs anything; these are the knobs and labels
//! that `flo-core` and its callers pass around.

mod domain;
pub use domain::*;

mod error;
pub use error::ModelError;
