// ABOUTME: Utility modules shared by the API client, token agent, and webhook coordinator
// ABOUTME: Contains HTTP client construction and response classification helpers
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

/// HTTP client configuration and helpers
pub mod http_client;
