pub mod api;
pub mod config;
pub mod data_models;
pub mod export;
pub mod extractor;
pub mod fetcher;
pub mod pagination;
pub mod session;
