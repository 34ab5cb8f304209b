//! Common utilities and types shared by the token client and the resource guard.

#![warn(clippy::pedantic)]

/// Module for endpoint configuration validation
pub mod config;

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for JWT utilities (size limits, unverified header inspection)
pub mod jwt;
