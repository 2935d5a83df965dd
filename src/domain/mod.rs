pub mod discovery;
pub mod errors;
pub mod gesture;
pub mod logging;
pub mod registry;
pub mod sampling;
pub mod window;
