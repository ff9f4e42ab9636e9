pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod services;
pub mod session;
pub mod state;

#[cfg(test)]
mod test_support;
