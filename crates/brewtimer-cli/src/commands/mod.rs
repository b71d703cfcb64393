pub mod config;
pub mod timeline;
pub mod timer;
