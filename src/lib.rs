#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod crawler;
pub mod fetcher;
pub mod logging;
pub mod model;
pub mod orchestrator;
pub mod output;
pub mod partition;
pub mod pool;
pub mod session;
