// ABOUTME: Activity stream keys accepted by the provider's streams endpoint
// ABOUTME: Parses caller-supplied keys and rejects anything outside the fixed set
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{ConnectorError, ConnectorResult};

/// A time series recorded for an activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamType {
    /// Seconds since start
    Time,
    /// Meters travelled
    Distance,
    /// Latitude/longitude pairs
    Latlng,
    /// Meters above sea level
    Altitude,
    /// Smoothed velocity
    VelocitySmooth,
    /// Beats per minute
    Heartrate,
    /// Revolutions or steps per minute
    Cadence,
    /// Power
    Watts,
    /// Degrees celsius
    Temp,
    /// Moving flag
    Moving,
    /// Smoothed grade
    GradeSmooth,
}

impl StreamType {
    /// Every key the provider accepts
    pub const ALL: [Self; 11] = [
        Self::Time,
        Self::Distance,
        Self::Latlng,
        Self::Altitude,
        Self::VelocitySmooth,
        Self::Heartrate,
        Self::Cadence,
        Self::Watts,
        Self::Temp,
        Self::Moving,
        Self::GradeSmooth,
    ];

    /// Wire name of the key
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::Distance => "distance",
            Self::Latlng => "latlng",
            Self::Altitude => "altitude",
            Self::VelocitySmooth => "velocity_smooth",
            Self::Heartrate => "heartrate",
            Self::Cadence => "cadence",
            Self::Watts => "watts",
            Self::Temp => "temp",
            Self::Moving => "moving",
            Self::GradeSmooth => "grade_smooth",
        }
    }
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamType {
    type Err = ConnectorError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stream| stream.as_str() == key)
            .ok_or_else(|| ConnectorError::invalid_stream_type(key))
    }
}

/// Parse every key, failing on the first one outside the supported set
///
/// # Errors
///
/// Returns `InvalidStreamType` naming the first rejected key
pub fn parse_stream_keys<I, S>(keys: I) -> ConnectorResult<Vec<StreamType>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    keys.into_iter().map(|key| key.as_ref().parse()).collect()
}
