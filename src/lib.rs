pub mod app;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod shared;

pub use app::run;
pub use domain::error::{AppError, Result};
