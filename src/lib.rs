pub mod config;
pub mod csv;
pub mod fetch;
pub mod http_client;
pub mod league;
pub mod ledger;
pub mod listing;
pub mod match_page;
pub mod runner;
