pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod notes;
pub mod services;
pub mod session;
pub mod state;
pub mod store;
pub mod timetable;
pub mod week;
