pub mod args;
pub mod database;
pub mod error;
pub mod model;
pub mod report;
pub mod utils;
