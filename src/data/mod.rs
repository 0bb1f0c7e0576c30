pub mod draw_api;
pub mod period;
pub mod types;
