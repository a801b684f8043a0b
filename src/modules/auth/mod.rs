pub mod controller;
pub mod crud;
pub mod guard;
pub mod interface;
pub mod login;
pub mod memory;
pub mod model;
pub mod policy;
pub mod register;
pub mod reset;
pub mod routes;
pub mod schema;
pub mod session;
pub mod settings;
pub mod tokens;
pub mod verify;

pub use routes::auth_routes;
