pub mod config;
pub mod docs;
pub mod error;

pub mod handlers;
pub mod mail;
pub mod routes;
pub mod services;
pub mod storage;

#[cfg(test)]
mod test_support;
