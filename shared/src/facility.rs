use std::{cmp::Ordering, collections::BTreeSet};

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::geo::{GeoPoint, distance_meters};

pub const DEFAULT_NEARBY_RADIUS_METERS: f64 = 500.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub objectid: i64,
    pub class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<FacilityHours>,
    pub location: GeoPoint,
}

impl Facility {
    pub fn category(&self) -> Option<&'static FacilityCategory> {
        category_of(&self.class)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityWithDistance {
    #[serde(flatten)]
    pub facility: Facility,
    pub distance_meters: f64,
}

/// Daily opening hours, serialized as 24-hour `HH:MM` strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityHours {
    #[serde(with = "hhmm")]
    pub open: NaiveTime,
    #[serde(with = "hhmm")]
    pub close: NaiveTime,
}

impl FacilityHours {
    /// Handles ranges that wrap past midnight, e.g. 18:00 to 02:00.
    pub fn is_open_at(&self, now: NaiveTime) -> bool {
        let now = minutes_of_day(now);
        let open = minutes_of_day(self.open);
        let close = minutes_of_day(self.close);

        if close < open {
            now >= open || now < close
        } else {
            now >= open && now < close
        }
    }

    /// True when closing time falls within the next hour (exclusive of now).
    pub fn is_closing_soon_at(&self, now: NaiveTime) -> bool {
        let mut close = minutes_of_day(self.close) as i64;
        if self.close.hour() < 12 && now.hour() > 12 {
            close += 24 * 60;
        }
        let remaining = close - minutes_of_day(now) as i64;
        remaining > 0 && remaining <= 60
    }
}

fn minutes_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(raw.trim(), FORMAT).map_err(D::Error::custom)
    }
}

/// Display grouping for facility classes. Categories never share a class.
#[derive(Debug, PartialEq, Eq)]
pub struct FacilityCategory {
    pub key: &'static str,
    pub name: &'static str,
    pub color: &'static str,
    pub classes: &'static [&'static str],
}

pub static FACILITY_CATEGORIES: [FacilityCategory; 6] = [
    FacilityCategory {
        key: "play-explore",
        name: "Play & Explore",
        color: "#B05ECC",
        classes: &["PLAYGROUND"],
    },
    FacilityCategory {
        key: "rest-relax",
        name: "Rest & Relax",
        color: "#6A9BD8",
        classes: &["SHELTER", "BBQ PIT", "CAMPSITE", "FOOT RELAX"],
    },
    FacilityCategory {
        key: "nature-wellness",
        name: "Nature & Wellness",
        color: "#4CAF50",
        classes: &["BIRD WATCHING TOWER", "LOOKOUT POINT", "ALLOTMENT GARDEN"],
    },
    FacilityCategory {
        key: "essentials",
        name: "Essentials",
        color: "#A1743B",
        classes: &[
            "TOILET",
            "DRINKING FOUNTAIN",
            "CAR-PARK",
            "INFORMATION KIOSK",
            "MAPBOARD",
        ],
    },
    FacilityCategory {
        key: "active-life",
        name: "Active Life",
        color: "#00B4D8",
        classes: &["FITNESS AREA", "MULTIPURPOSE COURT"],
    },
    FacilityCategory {
        key: "eateries",
        name: "Eateries",
        color: "#F04E6D",
        classes: &["FOOD & BEVERAGE", "RESTAURANT"],
    },
];

/// First category listing `class`, if any.
pub fn category_of(class: &str) -> Option<&'static FacilityCategory> {
    FACILITY_CATEGORIES
        .iter()
        .find(|category| category.classes.contains(&class))
}

/// Facilities of the same category as `target` within `max_distance_meters`,
/// nearest first. Equal distances are ordered by `objectid`.
pub fn find_nearby(
    target: &Facility,
    candidates: &[Facility],
    max_distance_meters: f64,
) -> Vec<FacilityWithDistance> {
    let Some(category) = target.category() else {
        return Vec::new();
    };

    let mut nearby: Vec<FacilityWithDistance> = candidates
        .iter()
        .filter(|candidate| candidate.objectid != target.objectid)
        .filter(|candidate| candidate.category() == Some(category))
        .filter_map(|candidate| {
            let distance = distance_meters(target.location, candidate.location);
            (distance <= max_distance_meters).then(|| FacilityWithDistance {
                facility: candidate.clone(),
                distance_meters: distance,
            })
        })
        .collect();

    nearby.sort_by(|a, b| {
        a.distance_meters
            .partial_cmp(&b.distance_meters)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.facility.objectid.cmp(&b.facility.objectid))
    });
    nearby
}

/// A facility in the listing, with its distance from the visitor when known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListedFacility<'a> {
    pub facility: &'a Facility,
    pub distance_meters: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FacilityGroup<'a> {
    pub category: &'static FacilityCategory,
    pub entries: Vec<ListedFacility<'a>>,
}

/// Facilities grouped under each visible category in table order.
///
/// `query` matches class or name case-insensitively; blank matches all.
/// Within a group the nearest come first, unknown distances last, then by
/// `objectid`. Facilities without a category are not listed.
pub fn group_by_category<'a>(
    facilities: &'a [Facility],
    user: Option<GeoPoint>,
    visible: &BTreeSet<&str>,
    query: &str,
) -> Vec<FacilityGroup<'a>> {
    let needle = query.trim().to_lowercase();
    let matches = |facility: &Facility| {
        needle.is_empty()
            || facility.class.to_lowercase().contains(&needle)
            || facility
                .name
                .as_deref()
                .is_some_and(|name| name.to_lowercase().contains(&needle))
    };

    FACILITY_CATEGORIES
        .iter()
        .filter(|category| visible.contains(category.key))
        .map(|category| {
            let mut entries: Vec<ListedFacility<'a>> = facilities
                .iter()
                .filter(|facility| facility.category() == Some(category))
                .filter(|facility| matches(*facility))
                .map(|facility| ListedFacility {
                    facility,
                    distance_meters: user.map(|at| distance_meters(at, facility.location)),
                })
                .collect();
            entries.sort_by(|a, b| {
                by_known_distance(a.distance_meters, b.distance_meters)
                    .then_with(|| a.facility.objectid.cmp(&b.facility.objectid))
            });
            FacilityGroup { category, entries }
        })
        .collect()
}

fn by_known_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
