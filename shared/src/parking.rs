use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::geo::GeoPoint;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Carpark {
    pub carpark_id: String,
    pub development: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agency: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub distance_meters: f64,
    #[serde(default)]
    pub lots_by_type: BTreeMap<String, i64>,
    pub total_available: i64,
    pub recommendation_score: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CarparkAvailability {
    pub carparks: Vec<Carpark>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_age_minutes: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MrtExit {
    pub exit: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MrtExits {
    pub mrt_exits: Vec<MrtExit>,
}

impl MrtExits {
    /// Exits arrive sorted by distance; the first one is the closest.
    pub fn closest(&self) -> Option<&MrtExit> {
        self.mrt_exits.first()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationType {
    Mrt,
    Carpark,
}

impl DestinationType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "mrt" => Some(DestinationType::Mrt),
            "carpark" => Some(DestinationType::Carpark),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DestinationType::Mrt => "mrt",
            DestinationType::Carpark => "carpark",
        }
    }
}

/// Directions from the visitor to an MRT exit or carpark serving the park.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkNavigation {
    pub destination_type: DestinationType,
    /// Either a carpark or an MRT exit record, passed through untouched.
    pub destination: Value,
    pub start: GeoPoint,
    pub end: GeoPoint,
    pub distance_meters: f64,
}
