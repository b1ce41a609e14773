pub mod commands;
pub mod modules_json;

pub use modules_json::parse_modules_json;
