pub mod app;
pub mod broadcast;
pub mod codec;
pub mod config;
pub mod protocol;
pub mod state;
pub mod sync;
pub mod types;
pub mod ws;
