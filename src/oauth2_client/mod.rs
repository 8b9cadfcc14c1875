// ABOUTME: OAuth 2.0 client implementation for connecting to the provider on a user's behalf
// ABOUTME: Provides code exchange, refresh-per-call token management, and token persistence
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # OAuth 2.0 Client Module
//!
//! The connector acts as an OAuth 2.0 client of the provider. This module handles:
//! - the approval URL and the one-time authorization-code exchange
//! - a local listener that captures the code from the provider redirect
//! - the token agent that refreshes the token before every API call
//! - reading and writing token files

/// Core OAuth 2.0 client implementation
pub mod client;
/// Authorization redirect listener
pub mod redirect;
/// Token ownership and refresh-per-call
pub mod token_agent;
/// Token file persistence
pub mod token_store;

pub use client::{OAuth2Client, OAuth2Config};
pub use redirect::{await_authorization_code, RedirectListener};
pub use token_agent::{StaticToken, TokenAgent, TokenSource};
pub use token_store::{read_token_file, write_token_file};
