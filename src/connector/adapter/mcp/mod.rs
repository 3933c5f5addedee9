mod server;
mod tools;

pub use server::*;
pub use tools::*;
