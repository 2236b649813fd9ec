//! simtrust - manage the trust stores of Xcode simulator devices.

pub mod cert;
pub mod cli;
pub mod commands;
pub mod config;
pub mod device;
pub mod filter;
pub mod truststore;
