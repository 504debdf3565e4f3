#![forbid(unsafe_code)]

pub mod api;
pub mod model;
pub mod time;

pub use time::Clock;
