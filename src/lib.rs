pub mod api;
pub mod builder;
pub mod cli;
pub mod config;
pub mod excel;
pub mod routes;
pub mod session;
pub mod store;
pub mod suggest;
pub mod sync;
