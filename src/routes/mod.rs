pub mod assets;
pub mod auth;
pub mod dashboard;
pub mod health;
pub mod maintenance;
pub mod pages;
pub mod tickets;
