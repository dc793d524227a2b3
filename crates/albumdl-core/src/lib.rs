pub mod config;
pub mod logging;

pub mod api;
pub mod control;
pub mod downloader;
pub mod http;
pub mod listing;
pub mod model;
pub mod naming;
pub mod paginator;
pub mod pipeline;
pub mod resolver;
pub mod retry;
pub mod scheduler;
