pub mod dom;
pub mod plotly;
pub mod services;
