//! Command implementations

pub mod connect;
