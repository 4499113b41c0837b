//! Aggregation temporality and its resolution from configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Environment variable consulted once by [`crate::core::ConfigBuilder::with_env_overrides`]
pub const TEMPORALITY_PREFERENCE_ENV: &str = "OTEL_EXPORTER_OTLP_METRICS_TEMPORALITY_PREFERENCE";

/// Whether collected aggregates are deltas or running totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationTemporality {
    Delta,
    Cumulative,
}

impl AggregationTemporality {
    #[inline]
    pub fn is_delta(self) -> bool {
        self == AggregationTemporality::Delta
    }

    #[inline]
    pub fn is_cumulative(self) -> bool {
        self == AggregationTemporality::Cumulative
    }
}

impl fmt::Display for AggregationTemporality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregationTemporality::Delta => write!(f, "delta"),
            AggregationTemporality::Cumulative => write!(f, "cumulative"),
        }
    }
}

/// A configured temporality preference, before instrument kind is known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum TemporalityPreference {
    Delta,
    Cumulative,
    LowMemory,
}

/// Error returned when a temporality string is not recognised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTemporality(pub String);

impl fmt::Display for UnknownTemporality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown temporality preference '{}'", self.0)
    }
}

impl std::error::Error for UnknownTemporality {}

impl FromStr for TemporalityPreference {
    type Err = UnknownTemporality;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "delta" => Ok(TemporalityPreference::Delta),
            "cumulative" => Ok(TemporalityPreference::Cumulative),
            "lowmemory" | "low_memory" => Ok(TemporalityPreference::LowMemory),
            _ => Err(UnknownTemporality(s.to_string())),
        }
    }
}

impl TryFrom<String> for TemporalityPreference {
    type Error = UnknownTemporality;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TemporalityPreference {
    /// Resolve to a concrete temporality for `kind`.
    ///
    /// `LowMemory` keeps synchronous instruments on delta and observable ones
    /// on cumulative.
    pub fn resolve(self, kind: Option<InstrumentKind>) -> AggregationTemporality {
        match self {
            TemporalityPreference::Delta => AggregationTemporality::Delta,
            TemporalityPreference::Cumulative => AggregationTemporality::Cumulative,
            TemporalityPreference::LowMemory => match kind {
                Some(kind) if !kind.is_synchronous() => AggregationTemporality::Cumulative,
                _ => AggregationTemporality::Delta,
            },
        }
    }
}

/// Instrument kinds that feed the aggregators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentKind {
    Counter,
    UpDownCounter,
    Histogram,
    Gauge,
    ObservableCounter,
    ObservableUpDownCounter,
    ObservableGauge,
}

impl InstrumentKind {
    /// Synchronous instruments record inline on the caller's thread
    pub fn is_synchronous(self) -> bool {
        matches!(
            self,
            InstrumentKind::Counter
                | InstrumentKind::UpDownCounter
                | InstrumentKind::Histogram
                | InstrumentKind::Gauge
        )
    }
}

/// Resolve a temporality from an optional preference string.
///
/// A recognised value wins; anything else (including `None`) yields
/// `default`.
pub fn resolve_temporality(
    preference: Option<&str>,
    kind: Option<InstrumentKind>,
    default: AggregationTemporality,
) -> AggregationTemporality {
    match preference.map(str::parse::<TemporalityPreference>) {
        Some(Ok(pref)) => pref.resolve(kind),
        _ => default,
    }
}
