mod detection;
mod face;
mod frame;
mod status;

pub use detection::*;
pub use face::*;
pub use frame::*;
pub use status::*;
