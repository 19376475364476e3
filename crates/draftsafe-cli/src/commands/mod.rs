pub mod backup;
pub mod common;
pub mod config;
pub mod recover;
pub mod save;
