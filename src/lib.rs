pub mod ari;
pub mod cli;
pub mod config;
pub mod logging;
pub mod models;
pub mod parser;
pub mod reading;
pub mod settings;
pub mod share;
pub mod split;
pub mod state;
pub mod ui;
pub mod version;
