pub mod auth;
pub mod builder;
pub mod events;
pub mod master_data;
pub mod route;
pub mod settings;
pub mod users;
