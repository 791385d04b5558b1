use serde::Serialize;

/// Which of the two LeafAI deployments serves an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Upstream {
    Primary,
    Legacy,
}

/// A pass-through endpoint: dashboard name → upstream path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProxyRoute {
    pub endpoint: &'static str,
    pub upstream: Upstream,
    pub path: &'static str,
    pub requires_token: bool,
}

pub const LOGIN: &str = "login";
pub const GET_LOCATIONS: &str = "getlocations";
pub const ADD_LOCATION: &str = "addlocation";
pub const DELETE_LOCATION: &str = "deletelocation";
pub const GET_PLANTS: &str = "getplants";
pub const ADD_PLANT: &str = "addplant";
pub const DELETE_PLANT: &str = "deleteplant";
pub const GET_SENSORS: &str = "getsensors";
pub const GET_SENSOR_VALUES: &str = "getsensorvalues";
pub const ADD_DEVICE: &str = "adddevice";
pub const ADD_SENSOR: &str = "addsensor";
pub const ASSIGN_SENSOR: &str = "assignsensor";

const fn route(endpoint: &'static str, upstream: Upstream, path: &'static str) -> ProxyRoute {
    ProxyRoute {
        endpoint,
        upstream,
        path,
        requires_token: true,
    }
}

pub static PROXY_ROUTES: &[ProxyRoute] = &[
    ProxyRoute {
        endpoint: LOGIN,
        upstream: Upstream::Primary,
        path: "/login.php",
        requires_token: false,
    },
    route(GET_LOCATIONS, Upstream::Primary, "/getlocations.php"),
    route(ADD_LOCATION, Upstream::Primary, "/addlocation.php"),
    route(DELETE_LOCATION, Upstream::Primary, "/deletelocation.php"),
    route(GET_PLANTS, Upstream::Primary, "/getplants.php"),
    route(ADD_PLANT, Upstream::Primary, "/addplant.php"),
    route(DELETE_PLANT, Upstream::Primary, "/deleteplant.php"),
    route(GET_SENSORS, Upstream::Primary, "/getsensors.php"),
    route(GET_SENSOR_VALUES, Upstream::Legacy, "/getsensorvalues.php"),
    route(ADD_DEVICE, Upstream::Primary, "/adddevice.php"),
    route(ADD_SENSOR, Upstream::Primary, "/addsensor.php"),
    route(ASSIGN_SENSOR, Upstream::Primary, "/assignsensor.php"),
];

/// Look up a proxy route by its dashboard endpoint name (case-insensitive).
#[must_use]
pub fn lookup(endpoint: &str) -> Option<&'static ProxyRoute> {
    PROXY_ROUTES
        .iter()
        .find(|r| r.endpoint.eq_ignore_ascii_case(endpoint))
}
