//! Library exports for wayshare.
//!
//! The binary is a thin wrapper: it parses flags, loads [`Config`] and hands
//! a [`upload::Mode`] to [`upload::Pipeline`]. Everything else lives here so
//! it can be driven with mocked collaborators.

pub mod capture;
pub mod config;
pub mod notification;
pub mod upload;

pub use config::Config;
