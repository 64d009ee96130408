pub mod config;
pub mod mirror;
pub mod parse;
pub mod testcases;
pub mod tickets;
pub mod tree;
