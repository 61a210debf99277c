pub mod api;
pub mod config;
pub mod orm;
pub mod pages;
pub mod paste_id;
pub mod paste_repo;
pub mod paste_service;
pub mod snippet;
