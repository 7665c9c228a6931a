pub mod api;
pub mod auth;
pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod guard;
pub mod identity;
pub mod models;
pub mod pages;
pub mod services;
pub mod state;
pub mod utils;
