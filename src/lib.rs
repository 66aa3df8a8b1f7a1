pub mod api;
pub mod cli;
pub mod config;
pub mod dto;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;
