pub mod api;
pub mod render;
pub mod workflow;
