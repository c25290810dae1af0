//! BITSPARK: campus matching, connections, and messaging service.

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod logging;
pub mod matching;
pub mod state;
pub mod web;
