mod connector;
mod sleeper;

pub use connector::*;
pub use sleeper::*;
