#[macro_use]
extern crate serde;

pub mod commands;
pub mod error;
pub mod logging;
pub mod plugin;
pub mod types;
pub mod version;
