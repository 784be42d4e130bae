//! Route network types
//!
//! Relational rows (airports, airlines, routes) and the per-route
//! embedding record owned by the store.

use serde::{Deserialize, Serialize};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

numeric_id!(
    /// Unique identifier for a route
    RouteId
);
numeric_id!(
    /// OpenFlights airport identifier
    AirportId
);
numeric_id!(
    /// OpenFlights airline identifier
    AirlineId
);

/// Airport reference row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    pub airport_id: AirportId,
    pub name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub iata: Option<String>,
    pub icao: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<i32>,
    pub timezone: Option<f32>,
    pub dst: Option<String>,
    pub tz_db: Option<String>,
}

/// Airline reference row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Airline {
    pub airline_id: AirlineId,
    pub name: Option<String>,
    pub alias: Option<String>,
    pub iata: Option<String>,
    pub icao: Option<String>,
    pub callsign: Option<String>,
    pub country: Option<String>,
    pub active: bool,
}

/// A scheduled route between two airports
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub route_id: RouteId,
    /// Airline IATA/ICAO code as written in the source data
    pub airline_code: Option<String>,
    pub airline_id: Option<AirlineId>,
    pub source_code: Option<String>,
    pub source_airport_id: Option<AirportId>,
    pub dest_code: Option<String>,
    pub dest_airport_id: Option<AirportId>,
    pub codeshare: bool,
    pub stops: u32,
    pub equipment: Option<String>,
}

impl Route {
    /// Whether the route departs from or arrives at the airport
    pub fn touches(&self, airport: AirportId) -> bool {
        self.source_airport_id == Some(airport) || self.dest_airport_id == Some(airport)
    }
}

/// Observed passenger volume and punctuality for one route
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassengerStat {
    pub route_id: RouteId,
    pub passengers: u64,
    pub avg_delay_minutes: f64,
}

/// Delay risk scores for one route
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DelayRisk {
    pub route_id: RouteId,
    pub overall_risk: f64,
    pub weather_risk: f64,
    pub congestion_risk: f64,
    pub infra_risk: f64,
}

/// Route joined with its endpoint airports and operating airline
///
/// Every joined field is optional: a dangling reference simply leaves it
/// unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JoinedRoute {
    pub route_id: RouteId,
    pub stops: Option<u32>,
    pub equipment: Option<String>,
    pub src_city: Option<String>,
    pub src_iata: Option<String>,
    pub src_country: Option<String>,
    pub dst_city: Option<String>,
    pub dst_iata: Option<String>,
    pub dst_country: Option<String>,
    pub airline_name: Option<String>,
}

impl JoinedRoute {
    /// Join a route against optional airport/airline rows
    pub fn join(
        route: &Route,
        source: Option<&Airport>,
        dest: Option<&Airport>,
        airline: Option<&Airline>,
    ) -> Self {
        Self {
            route_id: route.route_id,
            stops: Some(route.stops),
            equipment: route.equipment.clone(),
            src_city: source.and_then(|a| a.city.clone()),
            src_iata: source.and_then(|a| a.iata.clone()),
            src_country: source.and_then(|a| a.country.clone()),
            dst_city: dest.and_then(|a| a.city.clone()),
            dst_iata: dest.and_then(|a| a.iata.clone()),
            dst_country: dest.and_then(|a| a.country.clone()),
            airline_name: airline.and_then(|a| a.name.clone()),
        }
    }
}

/// Persisted description and embedding for one route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub route_id: RouteId,
    #[serde(default)]
    pub description: Option<String>,
    /// Unit-norm vector of the configured dimension
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

impl EmbeddingRecord {
    /// Create an empty record for a route
    pub fn new(route_id: RouteId) -> Self {
        Self {
            route_id,
            description: None,
            embedding: None,
        }
    }

    /// Overwrite only the supplied fields
    pub fn apply(&mut self, description: Option<&str>, embedding: Option<&[f32]>) {
        if let Some(description) = description {
            self.description = Some(description.to_string());
        }
        if let Some(embedding) = embedding {
            self.embedding = Some(embedding.to_vec());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_id_parse_and_display() {
        let id: RouteId = " 1234 ".parse().unwrap();
        assert_eq!(id, RouteId(1234));
        assert_eq!(id.to_string(), "1234");
        assert!("abc".parse::<RouteId>().is_err());
    }

    #[test]
    fn test_route_id_serializes_as_number() {
        let json = serde_json::to_string(&RouteId(7)).unwrap();
        assert_eq!(json, "7");
    }

    #[test]
    fn test_apply_keeps_unsupplied_fields() {
        let mut record = EmbeddingRecord::new(RouteId(1));
        record.apply(Some("first"), Some(&[1.0, 0.0]));
        record.apply(None, Some(&[0.0, 1.0]));
        assert_eq!(record.description.as_deref(), Some("first"));
        assert_eq!(record.embedding, Some(vec![0.0, 1.0]));

        record.apply(Some("second"), None);
        assert_eq!(record.description.as_deref(), Some("second"));
        assert_eq!(record.embedding, Some(vec![0.0, 1.0]));
    }

    #[test]
    fn test_join_with_missing_rows() {
        let route = Route {
            route_id: RouteId(3),
            stops: 1,
            equipment: Some("320".into()),
            ..Default::default()
        };
        let dest = Airport {
            airport_id: AirportId(9),
            city: Some("Lisbon".into()),
            iata: Some("LIS".into()),
            ..Default::default()
        };
        let joined = JoinedRoute::join(&route, None, Some(&dest), None);
        assert_eq!(joined.src_city, None);
        assert_eq!(joined.dst_city.as_deref(), Some("Lisbon"));
        assert_eq!(joined.stops, Some(1));
        assert_eq!(joined.airline_name, None);
    }

    #[test]
    fn test_route_touches() {
        let route = Route {
            source_airport_id: Some(AirportId(1)),
            dest_airport_id: Some(AirportId(2)),
            ..Default::default()
        };
        assert!(route.touches(AirportId(1)));
        assert!(route.touches(AirportId(2)));
        assert!(!route.touches(AirportId(3)));
    }
}
