pub mod services;

pub use services::CoreServices;
