pub mod color;
pub mod config;
pub mod data;
pub mod report;
pub mod session;

pub use session::Session;
