pub mod config;
pub mod demo;
pub mod report;

pub use config::DemoConfig;
pub use report::Report;
