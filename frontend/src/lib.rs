pub mod api;
pub mod session;

use crate::api::ApiClient;
use crate::session::{Command, Msg, TRAVEL_CARPARK_LIMIT};

/// Runs a command against the proxy and reports its outcome as a message.
pub async fn perform(client: &ApiClient, command: Command) -> Msg {
    match command {
        Command::FetchFacilities => Msg::FacilitiesFetched(client.facilities().await),
        Command::FetchWeather => Msg::WeatherFetched(client.weather_now().await),
        Command::FetchRoute { token, request } => Msg::RouteFetched {
            token,
            result: client.route(&request).await,
        },
        Command::FetchTravelOptions { origin } => Msg::TravelOptionsFetched {
            mrt_exits: client.mrt_exits(origin).await,
            carparks: client.carparks(origin, TRAVEL_CARPARK_LIMIT).await,
        },
        Command::FetchParkNavigation {
            start,
            destination_type,
            destination_id,
        } => Msg::ParkNavigationFetched(
            client
                .to_park(start, destination_type, destination_id.as_deref())
                .await,
        ),
    }
}
