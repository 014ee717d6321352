use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Candlestick formation detected on the uploaded chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    Engulfing,
    PinBar,
    Marubozu,
}

impl Pattern {
    pub const ALL: [Self; 3] = [Self::Engulfing, Self::PinBar, Self::Marubozu];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Engulfing => "engulfing",
            Self::PinBar => "pin_bar",
            Self::Marubozu => "marubozu",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Uptrend,
    Downtrend,
    Sideways,
}

impl Trend {
    pub const ALL: [Self; 3] = [Self::Uptrend, Self::Downtrend, Self::Sideways];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uptrend => "uptrend",
            Self::Downtrend => "downtrend",
            Self::Sideways => "sideways",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Support,
    Resistance,
    OrderBlock,
}

impl Zone {
    pub const ALL: [Self; 3] = [Self::Support, Self::Resistance, Self::OrderBlock];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Support => "support",
            Self::Resistance => "resistance",
            Self::OrderBlock => "order_block",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Momentum {
    Strong,
    Weak,
    Neutral,
}

impl Momentum {
    pub const ALL: [Self; 3] = [Self::Strong, Self::Weak, Self::Neutral];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strong => "strong",
            Self::Weak => "weak",
            Self::Neutral => "neutral",
        }
    }
}

/// Error raised when a stored or user-supplied label does not name a known category.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! label_enum {
    ($ty:ident, $kind:literal, [$($variant:ident => $label:literal),+ $(,)?]) => {
        impl FromStr for $ty {
            type Err = UnknownLabel;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value.trim() {
                    $($label => Ok(Self::$variant),)+
                    other => Err(UnknownLabel {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let label = match self {
                    $(Self::$variant => $label,)+
                };
                f.write_str(label)
            }
        }
    };
}

label_enum!(Pattern, "pattern", [Engulfing => "engulfing", PinBar => "pin_bar", Marubozu => "marubozu"]);
label_enum!(Trend, "trend", [Uptrend => "uptrend", Downtrend => "downtrend", Sideways => "sideways"]);
label_enum!(Zone, "zone", [Support => "support", Resistance => "resistance", OrderBlock => "order_block"]);
label_enum!(Momentum, "momentum", [Strong => "strong", Weak => "weak", Neutral => "neutral"]);
label_enum!(Direction, "direction", [Buy => "Buy", Sell => "Sell", Wait => "Wait"]);
label_enum!(Confidence, "confidence", [High => "High", Medium => "Medium", Low => "Low"]);
label_enum!(RiskLevel, "risk level", [Low => "Low", Medium => "Medium", High => "High"]);
label_enum!(Outcome, "outcome", [Win => "Win", Loss => "Loss"]);

/// Categorical summary of a chart; pattern and trend form the historical match key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChartFeatures {
    pub pattern: Pattern,
    pub trend: Trend,
    pub zone: Zone,
    pub momentum: Momentum,
}

impl ChartFeatures {
    /// Zone and momentum are ignored.
    pub fn matches_setup(&self, other: &ChartFeatures) -> bool {
        self.pattern == other.pattern && self.trend == other.trend
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Buy,
    Sell,
    Wait,
}

impl Direction {
    /// Evaluation order; earlier candidates win ties.
    pub const CANDIDATES: [Self; 3] = [Self::Buy, Self::Sell, Self::Wait];

    pub const fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
            Self::Wait => Self::Wait,
        }
    }

    pub const fn is_trade(self) -> bool {
        !matches!(self, Self::Wait)
    }

    pub const fn bias_label(self) -> &'static str {
        match self {
            Self::Buy => "Bullish",
            Self::Sell => "Bearish",
            Self::Wait => "Neutral",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Loss,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionId(pub String);

impl PredictionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PredictionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scored prediction that has not been handed to a store yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPrediction {
    pub chart_features: ChartFeatures,
    pub direction: Direction,
    pub confidence: Confidence,
    pub risk_level: RiskLevel,
    pub reason: String,
    pub scored_at: DateTime<Utc>,
}

/// Persisted prediction. Everything except the outcome pair is fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: PredictionId,
    pub chart_features: ChartFeatures,
    pub direction: Direction,
    pub confidence: Confidence,
    pub risk_level: RiskLevel,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub outcome: Option<Outcome>,
    pub outcome_updated_at: Option<DateTime<Utc>>,
}

impl PredictionRecord {
    pub fn from_new(id: PredictionId, prediction: NewPrediction, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            chart_features: prediction.chart_features,
            direction: prediction.direction,
            confidence: prediction.confidence,
            risk_level: prediction.risk_level,
            reason: prediction.reason,
            created_at,
            outcome: None,
            outcome_updated_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.outcome.is_none()
    }
}

/// Uploaded chart screenshot. Only the MIME type is validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartImage {
    content_type: mime::Mime,
    bytes: Vec<u8>,
}

impl ChartImage {
    pub fn new(content_type: Option<&str>, bytes: Vec<u8>) -> Result<Self, UploadError> {
        let raw = content_type
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(UploadError::MissingContentType)?;
        let content_type: mime::Mime = raw
            .parse()
            .map_err(|_| UploadError::InvalidContentType(raw.to_string()))?;

        if content_type.type_() != mime::IMAGE {
            return Err(UploadError::NotAnImage(content_type.essence_str().to_string()));
        }

        Ok(Self {
            content_type,
            bytes,
        })
    }

    pub fn content_type(&self) -> &mime::Mime {
        &self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("upload is missing a content type")]
    MissingContentType,
    #[error("content type '{0}' could not be parsed")]
    InvalidContentType(String),
    #[error("expected an image upload, got '{0}'")]
    NotAnImage(String),
}
