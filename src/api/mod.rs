// ABOUTME: Provider data API module: athlete, activities, single activity, and streams
// ABOUTME: Exposes the rate-limited client and the pagination helpers it walks with
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

/// Rate-limited API client
pub mod client;
/// Page-number pagination helpers
pub mod pagination;

pub use client::StravaApi;
pub use pagination::{clamp_per_page, ActivityQuery, PageCursor};
