pub mod common;
pub mod route;
pub mod workout;
