pub mod config;
pub mod logging;

pub mod aggregator;
pub mod classify;
pub mod dispatch;
pub mod dom;
pub mod fetch_head;
pub mod filter;
pub mod format;
pub mod har;
pub mod host;
pub mod link;
pub mod rpc;
pub mod settings;
pub mod url_model;
