pub mod app;
pub mod backend;
pub mod cli;
pub mod config;
pub mod global;
pub mod meeting;
pub mod notes;
pub mod session;
pub mod supervisor;
