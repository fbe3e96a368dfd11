// Library for tests to access modules

pub mod aggregator;
pub mod assembler;
pub mod config;
pub mod localtime;
pub mod models;
pub mod pipeline;
pub mod publisher;
pub mod sources;
pub mod store;
pub mod time_gate;
pub mod version;
