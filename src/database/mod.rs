pub mod persistance;
pub mod store;
