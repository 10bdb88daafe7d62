#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod artifacts;
pub mod batch;
pub mod config;
pub mod entities;
pub mod framework;
pub mod lifecycle;
pub mod mail;
pub mod processors;
pub mod render;
pub mod store;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;
