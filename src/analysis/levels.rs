//! Price level types and cluster merging
//!
//! Detectors emit [`RawLevel`] candidates that carry no support/resistance
//! kind. Classification against the current price turns them into typed
//! [`PriceLevel`]s, which are then pooled and merged into clusters.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::config::source_priority;

/// Strength ceiling for any level, raw or merged
pub const MAX_STRENGTH: u8 = 5;

/// Role of a level relative to price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelKind {
    Support,
    Resistance,
    Pivot,
}

impl fmt::Display for LevelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelKind::Support => write!(f, "support"),
            LevelKind::Resistance => write!(f, "resistance"),
            LevelKind::Pivot => write!(f, "pivot"),
        }
    }
}

/// Detection method that produced a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelSource {
    Swing,
    Volume,
    Psychological,
    Fibonacci,
    Cluster,
}

impl fmt::Display for LevelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelSource::Swing => write!(f, "swing"),
            LevelSource::Volume => write!(f, "volume"),
            LevelSource::Psychological => write!(f, "psychological"),
            LevelSource::Fibonacci => write!(f, "fibonacci"),
            LevelSource::Cluster => write!(f, "cluster"),
        }
    }
}

/// Untyped level candidate produced by a detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawLevel {
    pub price: f64,
    pub strength: u8,
    pub source: LevelSource,
    pub touches: u32,
}

impl RawLevel {
    /// Create a candidate; strength is clamped into `1..=MAX_STRENGTH`
    pub fn new(price: f64, strength: u8, source: LevelSource, touches: u32) -> Self {
        Self {
            price,
            strength: strength.clamp(1, MAX_STRENGTH),
            source,
            touches,
        }
    }

    /// Attach a fixed kind (swing highs/lows are typed at detection)
    pub fn with_kind(self, kind: LevelKind) -> PriceLevel {
        PriceLevel {
            price: self.price,
            kind,
            strength: self.strength,
            source: self.source,
            touches: self.touches,
        }
    }

    /// Type the candidate relative to the current price: below is support,
    /// at or above is resistance
    pub fn classify(self, current_price: f64) -> PriceLevel {
        let kind = if self.price < current_price {
            LevelKind::Support
        } else {
            LevelKind::Resistance
        };
        self.with_kind(kind)
    }
}

/// A typed price level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: f64,
    pub kind: LevelKind,
    pub strength: u8,
    pub source: LevelSource,
    pub touches: u32,
}

/// Merge levels into clusters.
///
/// Levels are sorted by price and scanned once. A level joins the open
/// cluster when it lies within `cluster_distance` of the cluster's most
/// recently added member, so a cluster's total span can exceed
/// `cluster_distance` through chaining.
pub fn cluster_price_levels(levels: &[PriceLevel], cluster_distance: f64) -> Vec<PriceLevel> {
    let mut sorted = levels.to_vec();
    sorted.sort_by(|a, b| a.price.total_cmp(&b.price));

    let mut clusters = Vec::new();
    let mut current: Vec<PriceLevel> = Vec::new();

    for level in sorted {
        if let Some(last) = current.last() {
            if (level.price - last.price).abs() > cluster_distance {
                clusters.extend(merge_cluster(&current));
                current.clear();
            }
        }
        current.push(level);
    }
    clusters.extend(merge_cluster(&current));

    debug!(
        "Clustered {} levels into {} (distance {})",
        levels.len(),
        clusters.len(),
        cluster_distance
    );

    clusters
}

/// Collapse one cluster into a single level.
///
/// Singletons pass through untouched. Larger clusters take the
/// strength-weighted mean price, the summed strength (capped), the summed
/// touches, and the kind of the first member with the highest source priority.
pub fn merge_cluster(cluster: &[PriceLevel]) -> Option<PriceLevel> {
    match cluster {
        [] => None,
        [single] => Some(*single),
        members => {
            let total_weight: u32 = members.iter().map(|l| l.strength as u32).sum();
            let weighted_price = members
                .iter()
                .map(|l| l.price * l.strength as f64)
                .sum::<f64>()
                / total_weight as f64;

            // rev() so ties resolve to the earliest member
            let dominant_kind = members
                .iter()
                .rev()
                .max_by_key(|l| source_priority(l.source))
                .map(|l| l.kind)?;

            Some(PriceLevel {
                price: weighted_price,
                kind: dominant_kind,
                strength: total_weight.min(MAX_STRENGTH as u32) as u8,
                source: LevelSource::Cluster,
                touches: members.iter().map(|l| l.touches).sum(),
            })
        }
    }
}
