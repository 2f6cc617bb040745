pub mod agent;
pub mod common;
pub mod downloader;
pub mod sources;
