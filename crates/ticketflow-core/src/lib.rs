pub mod config;
pub mod error;
pub mod extract;
pub mod hierarchy;
mod http;
pub mod io;
pub mod mirror;
pub mod naming;
pub mod parser;
pub mod paths;
pub mod pipeline;
pub mod prompt;
pub mod registry;
pub mod render;
pub mod repo;
pub mod task;
pub mod testcases;
pub mod tracker;

pub use error::{Result, TicketflowError};
