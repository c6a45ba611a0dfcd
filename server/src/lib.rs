pub extern crate actix_web;

pub mod config;
pub mod connection;
pub mod handlers;
pub mod live;
pub mod registry;
pub mod server;
pub mod session;
