use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::backend::models::{ProductType, SensorRecord};

use super::reading::{ParsedReading, SensorPayload};

/// Chart label format for reading timestamps.
pub const LABEL_FORMAT: &str = "%d.%m. %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    AirTemp,
    AirHumidity,
    AirCo2,
    AirVpd,
    SoilTemp,
    BulkEc,
    Vwc,
    VwcRock,
    VwcCoco,
    PoreEc,
    LeafWetness,
    LeafTemp,
    #[serde(rename = "vwc_channel_0")]
    VwcChannel0,
    #[serde(rename = "vwc_channel_1")]
    VwcChannel1,
}

impl Metric {
    /// Reported by every device regardless of addon.
    pub const AIR: [Self; 4] = [Self::AirTemp, Self::AirHumidity, Self::AirCo2, Self::AirVpd];

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::AirTemp => "air_temp",
            Self::AirHumidity => "air_humidity",
            Self::AirCo2 => "air_co2",
            Self::AirVpd => "air_vpd",
            Self::SoilTemp => "soil_temp",
            Self::BulkEc => "bulk_ec",
            Self::Vwc => "vwc",
            Self::VwcRock => "vwc_rock",
            Self::VwcCoco => "vwc_coco",
            Self::PoreEc => "pore_ec",
            Self::LeafWetness => "leaf_wetness",
            Self::LeafTemp => "leaf_temp",
            Self::VwcChannel0 => "vwc_channel_0",
            Self::VwcChannel1 => "vwc_channel_1",
        }
    }

    #[must_use]
    pub fn extract(self, payload: &SensorPayload) -> Option<f64> {
        match self {
            Self::AirTemp => payload.air_temp,
            Self::AirHumidity => payload.air_humidity,
            Self::AirCo2 => payload.air_co2,
            Self::AirVpd => payload.air_vpd,
            Self::SoilTemp => payload.soil_temp,
            Self::BulkEc => payload.bulk_ec,
            Self::Vwc => payload.vwc,
            Self::VwcRock => payload.vwc_rock,
            Self::VwcCoco => payload.vwc_coco,
            Self::PoreEc => payload.pore_ec,
            Self::LeafWetness => payload.leaf_wetness,
            Self::LeafTemp => payload.leaf_temp,
            Self::VwcChannel0 => payload.vwc_channel_0,
            Self::VwcChannel1 => payload.vwc_channel_1,
        }
    }
}

/// Growing medium of a substrate sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Substrate {
    Soil,
    Coco,
    RockWool,
}

impl Substrate {
    /// Accepts the spellings the backend has stored over time.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();
        match normalized.as_str() {
            "soil" | "organic" | "organicsoil" | "erde" => Some(Self::Soil),
            "coco" | "cocos" | "kokos" | "cococoir" => Some(Self::Coco),
            "rockwool" | "steinwolle" => Some(Self::RockWool),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Soil => "soil",
            Self::Coco => "coco",
            Self::RockWool => "rock_wool",
        }
    }

    /// Moisture, temperature and EC metrics for this medium.
    #[must_use]
    pub fn metrics(self) -> [Metric; 3] {
        match self {
            Self::Soil => [Metric::Vwc, Metric::SoilTemp, Metric::BulkEc],
            Self::Coco => [Metric::VwcCoco, Metric::SoilTemp, Metric::PoreEc],
            Self::RockWool => [Metric::VwcRock, Metric::SoilTemp, Metric::PoreEc],
        }
    }
}

/// What a sensor measures besides air, which decides the metric set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", content = "substrate", rename_all = "snake_case")]
pub enum SensorProfile {
    Climate,
    Substrate(Substrate),
    LeafWetness,
    DualChannelVwc,
}

impl SensorProfile {
    #[must_use]
    pub fn for_sensor(sensor: &SensorRecord) -> Self {
        let product = sensor.sensor_type.as_deref().and_then(ProductType::from_code);
        let substrate = sensor.substrate_type.as_deref().and_then(Substrate::parse);

        match (product, substrate) {
            (Some(ProductType::Leaf), _) => Self::LeafWetness,
            (Some(ProductType::DualVwc), _) => Self::DualChannelVwc,
            (_, Some(substrate)) => Self::Substrate(substrate),
            _ => Self::Climate,
        }
    }

    /// Metrics beyond the air set that this profile may report.
    #[must_use]
    pub fn extra_metrics(self) -> Vec<Metric> {
        match self {
            Self::Climate => Vec::new(),
            Self::Substrate(substrate) => substrate.metrics().to_vec(),
            Self::LeafWetness => vec![Metric::LeafWetness, Metric::LeafTemp],
            Self::DualChannelVwc => vec![Metric::VwcChannel0, Metric::VwcChannel1],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, ToSchema)]
pub struct MinMax {
    pub min: f64,
    pub max: f64,
}

/// Parallel arrays for one chart; every metric array matches `labels` in length.
#[derive(Debug, Clone, PartialEq, Default, Serialize, ToSchema)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    /// Values per metric key, null where the reading lacked the metric
    pub metrics: BTreeMap<String, Vec<Option<f64>>>,
}

impl ChartSeries {
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, ToSchema)]
pub struct Aggregate {
    pub metrics: Vec<Metric>,
    pub series: ChartSeries,
    /// Highest/lowest over the full history, not just the window
    pub extremes: BTreeMap<String, MinMax>,
    /// Latest value per metric, 0 when the newest reading lacks it
    pub current: BTreeMap<String, f64>,
}

/// Min/max of `metric` across `readings`, `{0, 0}` when nothing reports it.
#[must_use]
pub fn min_max(readings: &[ParsedReading], metric: Metric) -> MinMax {
    readings
        .iter()
        .filter_map(|r| metric.extract(&r.payload))
        .fold(None, |acc: Option<MinMax>, v| {
            Some(match acc {
                Some(m) => MinMax {
                    min: m.min.min(v),
                    max: m.max.max(v),
                },
                None => MinMax { min: v, max: v },
            })
        })
        .unwrap_or_default()
}

/// Metrics to chart for `profile`: the air set always, the profile's own
/// metrics only when at least one windowed reading reports them.
#[must_use]
pub fn active_metrics(window: &[ParsedReading], profile: SensorProfile) -> Vec<Metric> {
    let mut metrics = Metric::AIR.to_vec();
    metrics.extend(
        profile
            .extra_metrics()
            .into_iter()
            .filter(|m| window.iter().any(|r| m.extract(&r.payload).is_some())),
    );
    metrics
}

/// Build the chart for `window` (oldest-first) and the extremes over `history`.
#[must_use]
pub fn aggregate(
    window: &[ParsedReading],
    history: &[ParsedReading],
    profile: SensorProfile,
) -> Aggregate {
    let metrics = active_metrics(window, profile);

    let labels = window
        .iter()
        .map(|r| r.captured_at.format(LABEL_FORMAT).to_string())
        .collect();

    let series = ChartSeries {
        labels,
        metrics: metrics
            .iter()
            .map(|m| {
                let values = window.iter().map(|r| m.extract(&r.payload)).collect();
                (m.key().to_string(), values)
            })
            .collect(),
    };

    let extremes = metrics
        .iter()
        .map(|m| (m.key().to_string(), min_max(history, *m)))
        .collect();

    let newest = history.iter().max_by_key(|r| r.captured_at);
    let current = metrics
        .iter()
        .map(|m| {
            let value = newest.and_then(|r| m.extract(&r.payload)).unwrap_or(0.0);
            (m.key().to_string(), value)
        })
        .collect();

    Aggregate {
        metrics,
        series,
        extremes,
        current,
    }
}
