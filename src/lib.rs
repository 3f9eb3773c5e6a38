pub mod app;
pub mod async_task;
pub mod cli;
pub mod config;
pub mod debounce;
pub mod discovery;
pub mod error;
pub mod event;
pub mod filter;
pub mod main_lib;
pub mod navigation;
pub mod navigator;
pub mod screenshot;
pub mod session;
pub mod test_runner;
pub mod theme;
pub mod tree;
pub mod ui;
