pub mod coordinator;
pub mod ports;

pub use coordinator::*;
pub use ports::*;
