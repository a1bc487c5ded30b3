pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod images;
pub mod movies;
pub mod response;
pub mod reviews;
pub mod state;
pub mod storage;
pub mod users;
