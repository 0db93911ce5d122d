pub mod app;
pub mod board;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod loader;
pub mod output;
pub mod session;
pub mod utils;

#[cfg(test)]
mod tests;
