//! Session state for the park map.
//!
//! All state lives in [`Model`] and changes only through [`update`]. Work that
//! needs the network is returned as [`Command`]s; their results come back as
//! new [`Msg`]s. Route requests carry a [`RouteToken`] and only the latest one
//! may update the displayed route.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Duration, NaiveTime, Utc};
use shared::{
    DEFAULT_NEARBY_RADIUS_METERS, DisplayRoute, FACILITY_CATEGORIES, Facility, FacilityGroup,
    FacilityWithDistance, FarFromPark, ForecastSummary, GeoPoint, PASIR_RIS_PARK, ParkBounds,
    RoutePreference, RouteRequest, RouteResult, SuggestionReason, compose_overlay, find_nearby,
    group_by_category, is_far_from_park, needs_weather_alert,
    parking::{Carpark, CarparkAvailability, DestinationType, MrtExit, MrtExits, ParkNavigation},
};

use crate::api::ClientError;

/// How long an "occupied" report hides a facility from the available list.
pub const OCCUPANCY_WINDOW_MINUTES: i64 = 30;

/// Carparks requested when suggesting how to reach the park.
pub const TRAVEL_CARPARK_LIMIT: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RouteToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Non-blocking message shown to the visitor.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveRoute {
    pub destination: GeoPoint,
    pub preference: RoutePreference,
    pub route: RouteResult,
    pub display: DisplayRoute,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingRoute {
    token: RouteToken,
    destination: GeoPoint,
    preference: RoutePreference,
}

/// Ways to reach the park offered to a visitor who is far away.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TravelOptions {
    pub closest_mrt: Option<MrtExit>,
    pub recommended_carpark: Option<Carpark>,
}

#[derive(Debug)]
pub struct Model {
    pub park: ParkBounds,
    pub facilities: Vec<Facility>,
    pub facilities_status: LoadStatus,
    pub user_location: Option<GeoPoint>,
    /// Start picked on the map; wins over the user's own location.
    pub selected_start: Option<GeoPoint>,
    pub preference: RoutePreference,
    pub forecast: Option<ForecastSummary>,
    pub weather_alert: bool,
    pub suggestion: Option<SuggestionReason>,
    pub far_from_park: Option<FarFromPark>,
    far_prompt_dismissed: bool,
    pub travel: Option<TravelOptions>,
    travel_requested: bool,
    pub park_navigation: Option<ParkNavigation>,
    pub active_route: Option<ActiveRoute>,
    pending_route: Option<PendingRoute>,
    next_token: u64,
    pub navigating_to: Option<Facility>,
    pub nearby: Vec<FacilityWithDistance>,
    pub visible_categories: BTreeSet<&'static str>,
    pub search_query: String,
    pub show_only_available: bool,
    occupied_since: HashMap<(String, i64), DateTime<Utc>>,
    pub notices: Vec<Notice>,
}

impl Default for Model {
    fn default() -> Self {
        Self::new(PASIR_RIS_PARK)
    }
}

impl Model {
    pub fn new(park: ParkBounds) -> Self {
        Self {
            park,
            facilities: Vec::new(),
            facilities_status: LoadStatus::Loading,
            user_location: None,
            selected_start: None,
            preference: RoutePreference::Fastest,
            forecast: None,
            weather_alert: false,
            suggestion: None,
            far_from_park: None,
            far_prompt_dismissed: false,
            travel: None,
            travel_requested: false,
            park_navigation: None,
            active_route: None,
            pending_route: None,
            next_token: 0,
            navigating_to: None,
            nearby: Vec::new(),
            visible_categories: FACILITY_CATEGORIES.iter().map(|c| c.key).collect(),
            search_query: String::new(),
            show_only_available: false,
            occupied_since: HashMap::new(),
            notices: Vec::new(),
        }
    }

    pub fn is_route_pending(&self) -> bool {
        self.pending_route.is_some()
    }

    pub fn start_location(&self) -> Option<GeoPoint> {
        self.selected_start.or(self.user_location)
    }

    /// Facilities that are open at `now` and close within the hour.
    pub fn closing_soon_at(&self, now: NaiveTime) -> Vec<&Facility> {
        self.facilities
            .iter()
            .filter(|facility| {
                facility
                    .hours
                    .is_some_and(|hours| hours.is_open_at(now) && hours.is_closing_soon_at(now))
            })
            .collect()
    }

    pub fn is_recently_occupied(&self, facility: &Facility, now: DateTime<Utc>) -> bool {
        self.occupied_since
            .get(&(facility.class.clone(), facility.objectid))
            .is_some_and(|since| now - *since < Duration::minutes(OCCUPANCY_WINDOW_MINUTES))
    }

    /// The facility list panel: visible categories, filtered by the search
    /// text and, when asked, by recent occupancy reports.
    pub fn listing(&self, now: DateTime<Utc>) -> Vec<FacilityGroup<'_>> {
        let mut groups = group_by_category(
            &self.facilities,
            self.user_location,
            &self.visible_categories,
            &self.search_query,
        );
        if self.show_only_available {
            for group in &mut groups {
                group
                    .entries
                    .retain(|entry| !self.is_recently_occupied(entry.facility, now));
            }
        }
        groups
    }

    fn issue_token(&mut self) -> RouteToken {
        self.next_token += 1;
        RouteToken(self.next_token)
    }

    fn request_route(&mut self, destination: GeoPoint) -> Option<Command> {
        let Some(start) = self.start_location() else {
            self.notices.push(Notice::error(
                "Please provide a valid start location by selecting on the map or sharing your \
                 location.",
            ));
            return None;
        };

        let token = self.issue_token();
        self.pending_route = Some(PendingRoute {
            token,
            destination,
            preference: self.preference,
        });
        Some(Command::FetchRoute {
            token,
            request: RouteRequest {
                start,
                end: destination,
                preference: self.preference,
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    FacilitiesFetched(Result<Vec<Facility>, ClientError>),
    WeatherFetched(Result<ForecastSummary, ClientError>),
    UserLocated(GeoPoint),
    StartSelected(GeoPoint),
    PreferenceChanged(RoutePreference),
    NavigateTo(GeoPoint),
    NavigateToFacility(i64),
    RouteFetched {
        token: RouteToken,
        result: Result<RouteResult, ClientError>,
    },
    CancelRoute,
    AcceptShelteredSuggestion,
    DismissSuggestion,
    DismissFarFromPark,
    TravelOptionsFetched {
        mrt_exits: Result<MrtExits, ClientError>,
        carparks: Result<CarparkAvailability, ClientError>,
    },
    TravelBy(DestinationType),
    ParkNavigationFetched(Result<ParkNavigation, ClientError>),
    ToggleCategory(String),
    SearchChanged(String),
    ShowOnlyAvailable(bool),
    ReportOccupancy {
        objectid: i64,
        occupied: bool,
        at: DateTime<Utc>,
    },
    ClearNotices,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    FetchFacilities,
    FetchWeather,
    FetchRoute {
        token: RouteToken,
        request: RouteRequest,
    },
    FetchTravelOptions {
        origin: GeoPoint,
    },
    FetchParkNavigation {
        start: GeoPoint,
        destination_type: DestinationType,
        destination_id: Option<String>,
    },
}

/// Commands to run when the session starts.
pub fn init() -> (Model, Vec<Command>) {
    (
        Model::default(),
        vec![Command::FetchFacilities, Command::FetchWeather],
    )
}

pub fn update(msg: Msg, model: &mut Model) -> Vec<Command> {
    match msg {
        Msg::FacilitiesFetched(Ok(facilities)) => {
            tracing::info!("loaded {} facilities", facilities.len());
            model.facilities = facilities;
            model.facilities_status = LoadStatus::Ready;
        }
        Msg::FacilitiesFetched(Err(err)) => {
            tracing::error!("failed to load facilities: {err}");
            model.facilities.clear();
            model.facilities_status = LoadStatus::Failed;
            model
                .notices
                .push(Notice::error("Facilities could not be loaded. Please try again later."));
        }
        Msg::WeatherFetched(Ok(forecast)) => {
            if forecast.is_fallback_data {
                model
                    .notices
                    .push(Notice::info("Showing the last known weather conditions."));
            }
            model.weather_alert = needs_weather_alert(&forecast.code, forecast.high_temp_c);
            model.forecast = Some(forecast);
        }
        Msg::WeatherFetched(Err(err)) => {
            tracing::warn!("weather fetch failed: {err}");
        }
        Msg::UserLocated(location) => {
            model.user_location = Some(location);
            let gate = is_far_from_park(location, &model.park);
            if model.far_prompt_dismissed {
                return Vec::new();
            }
            model.far_from_park = Some(gate);
            if gate.is_far && !model.travel_requested {
                tracing::debug!("user is {:.0} m from the park", gate.distance_meters);
                model.travel_requested = true;
                return vec![Command::FetchTravelOptions { origin: location }];
            }
        }
        Msg::StartSelected(point) => {
            model.selected_start = Some(point);
        }
        Msg::PreferenceChanged(preference) => {
            model.preference = preference;
            if preference == RoutePreference::Sheltered {
                model.suggestion = None;
            }
        }
        Msg::NavigateTo(destination) => {
            model.navigating_to = None;
            model.nearby.clear();
            if let Some(facility) = model
                .facilities
                .iter()
                .find(|facility| facility.location == destination)
                .cloned()
            {
                mark_facility_destination(model, facility);
            }
            return start_navigation(model, destination);
        }
        Msg::NavigateToFacility(objectid) => {
            let Some(facility) = model
                .facilities
                .iter()
                .find(|facility| facility.objectid == objectid)
                .cloned()
            else {
                model
                    .notices
                    .push(Notice::error(format!("Unknown facility {objectid}.")));
                return Vec::new();
            };
            let destination = facility.location;
            mark_facility_destination(model, facility);
            return start_navigation(model, destination);
        }
        Msg::RouteFetched { token, result } => route_fetched(model, token, result),
        Msg::CancelRoute => {
            if let Some(pending) = model.pending_route.take() {
                tracing::debug!("cancelled route request {:?}", pending.token);
            }
            model.active_route = None;
            model.navigating_to = None;
            model.nearby.clear();
        }
        Msg::AcceptShelteredSuggestion => {
            model.preference = RoutePreference::Sheltered;
            model.suggestion = None;
            let destination = model
                .pending_route
                .map(|pending| pending.destination)
                .or(model.active_route.as_ref().map(|active| active.destination));
            if let Some(destination) = destination {
                return model.request_route(destination).into_iter().collect();
            }
        }
        Msg::DismissSuggestion => model.suggestion = None,
        Msg::DismissFarFromPark => {
            model.far_prompt_dismissed = true;
            model.far_from_park = None;
        }
        Msg::TravelOptionsFetched {
            mrt_exits,
            carparks,
        } => {
            let closest_mrt = mrt_exits
                .map_err(|err| tracing::warn!("failed to fetch MRT exits: {err}"))
                .ok()
                .and_then(|exits| exits.closest().cloned());
            let recommended_carpark = carparks
                .map_err(|err| tracing::warn!("failed to fetch carpark availability: {err}"))
                .ok()
                .and_then(|availability| availability.carparks.into_iter().next());
            model.travel = Some(TravelOptions {
                closest_mrt,
                recommended_carpark,
            });
        }
        Msg::TravelBy(destination_type) => return travel_by(model, destination_type),
        Msg::ParkNavigationFetched(Ok(navigation)) => {
            tracing::info!(
                "heading to park via {} ({:.0} m)",
                navigation.destination_type.as_str(),
                navigation.distance_meters
            );
            let end = navigation.end;
            model.park_navigation = Some(navigation);
            model.far_prompt_dismissed = true;
            model.far_from_park = None;
            model.navigating_to = None;
            model.nearby.clear();
            return start_navigation(model, end);
        }
        Msg::ParkNavigationFetched(Err(err)) => {
            tracing::error!("navigation to park failed: {err}");
            model.notices.push(Notice::error(format!(
                "Directions to the park are unavailable: {err}"
            )));
        }
        Msg::ToggleCategory(key) => {
            match FACILITY_CATEGORIES.iter().find(|category| category.key == key) {
                Some(category) => {
                    if !model.visible_categories.remove(category.key) {
                        model.visible_categories.insert(category.key);
                    }
                }
                None => tracing::debug!("ignoring unknown category {key:?}"),
            }
        }
        Msg::SearchChanged(query) => model.search_query = query,
        Msg::ShowOnlyAvailable(only_available) => model.show_only_available = only_available,
        Msg::ReportOccupancy {
            objectid,
            occupied,
            at,
        } => {
            let Some(facility) = model.facilities.iter().find(|f| f.objectid == objectid) else {
                tracing::debug!("occupancy report for unknown facility {objectid}");
                return Vec::new();
            };
            let key = (facility.class.clone(), objectid);
            if occupied {
                model.occupied_since.insert(key, at);
            } else {
                model.occupied_since.remove(&key);
            }
        }
        Msg::ClearNotices => model.notices.clear(),
    }
    Vec::new()
}

fn travel_by(model: &mut Model, destination_type: DestinationType) -> Vec<Command> {
    let Some(start) = model.user_location else {
        model
            .notices
            .push(Notice::error("Share your location to get directions to the park."));
        return Vec::new();
    };
    let options = model.travel.as_ref();
    let destination_id = match destination_type {
        DestinationType::Mrt => match options.and_then(|o| o.closest_mrt.as_ref()) {
            Some(_) => None,
            None => {
                model.notices.push(Notice::error("No MRT exit found nearby."));
                return Vec::new();
            }
        },
        DestinationType::Carpark => match options.and_then(|o| o.recommended_carpark.as_ref()) {
            Some(carpark) => Some(carpark.carpark_id.clone()),
            None => {
                model
                    .notices
                    .push(Notice::error("No carpark with free lots found nearby."));
                return Vec::new();
            }
        },
    };
    vec![Command::FetchParkNavigation {
        start,
        destination_type,
        destination_id,
    }]
}

fn mark_facility_destination(model: &mut Model, facility: Facility) {
    model.nearby = find_nearby(&facility, &model.facilities, DEFAULT_NEARBY_RADIUS_METERS);
    model.navigating_to = Some(facility);
}

fn start_navigation(model: &mut Model, destination: GeoPoint) -> Vec<Command> {
    model.suggestion = model
        .forecast
        .as_ref()
        .and_then(|forecast| forecast.suggestion(model.preference));
    model.request_route(destination).into_iter().collect()
}

fn route_fetched(model: &mut Model, token: RouteToken, result: Result<RouteResult, ClientError>) {
    let pending = match model.pending_route {
        Some(pending) if pending.token == token => pending,
        _ => {
            tracing::debug!("discarding stale route response {token:?}");
            return;
        }
    };
    model.pending_route = None;

    let route = match result {
        Ok(route) => route,
        Err(err) => {
            tracing::error!("route calculation failed: {err}");
            model.active_route = None;
            model
                .notices
                .push(Notice::error(format!("Unable to calculate route: {err}")));
            return;
        }
    };

    match compose_overlay(&route, pending.preference) {
        Ok(display) => {
            model.active_route = Some(ActiveRoute {
                destination: pending.destination,
                preference: pending.preference,
                route,
                display,
            });
        }
        Err(err) => {
            tracing::error!("refusing to render route: {err}");
            model.active_route = None;
            model
                .notices
                .push(Notice::error(format!("Unable to calculate route: {err}")));
        }
    }
}
