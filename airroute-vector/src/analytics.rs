//! Route network aggregates
//!
//! Hub rankings, passenger load, delay risk and airport-closure simulation
//! over the relational tables. All functions take a snapshot of the rows so
//! they can be fed from the store or from fixtures alike. Metrics-based
//! queries return nothing until passenger stats or delay risks are loaded.

use serde::Serialize;
use std::collections::HashMap;

use crate::route::{Airport, AirportId, DelayRisk, PassengerStat, Route, RouteId};

/// Airport ranked by departing routes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hub {
    pub airport_id: AirportId,
    pub name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub degree: usize,
}

/// City pair ranked by number of routes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityPair {
    pub source_city: Option<String>,
    pub dest_city: Option<String>,
    pub flights: usize,
}

/// Departure airport ranked by passenger volume
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HubLoad {
    pub airport_id: AirportId,
    pub name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub total_passengers: u64,
    /// Mean of the per-route average delays, minutes
    pub avg_delay: f64,
}

/// Route ranked by how many routes serve its city pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteFrequency {
    pub route_id: RouteId,
    pub route_name: Option<String>,
    pub frequency: usize,
}

/// Route with its delay risk scores
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteRisk {
    pub route_id: RouteId,
    pub route_name: Option<String>,
    pub overall_risk: f64,
    pub weather_risk: f64,
    pub congestion_risk: f64,
    pub infra_risk: f64,
}

/// Route affected by (or routed around) an airport closure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AffectedRoute {
    pub route_id: RouteId,
    pub src_airport: Option<String>,
    pub dst_airport: Option<String>,
    pub src_city: Option<String>,
    pub dst_city: Option<String>,
    pub src_country: Option<String>,
    pub dst_country: Option<String>,
    /// Passengers stranded by the closure; set for closure results only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub est_passengers: Option<u64>,
}

fn index(airports: &[Airport]) -> HashMap<AirportId, &Airport> {
    airports.iter().map(|a| (a.airport_id, a)).collect()
}

fn city_of(by_id: &HashMap<AirportId, &Airport>, id: Option<AirportId>) -> Option<String> {
    id.and_then(|id| by_id.get(&id)).and_then(|a| a.city.clone())
}

/// "Source → Destination" by city; unknown when either city is
fn route_name(route: &Route, by_id: &HashMap<AirportId, &Airport>) -> Option<String> {
    let src = city_of(by_id, route.source_airport_id)?;
    let dst = city_of(by_id, route.dest_airport_id)?;
    Some(format!("{} → {}", src, dst))
}

/// Airports with the most departing routes
pub fn busiest_hubs(routes: &[Route], airports: &[Airport], limit: usize) -> Vec<Hub> {
    let by_id = index(airports);
    let mut degree: HashMap<AirportId, usize> = HashMap::new();
    for id in routes.iter().filter_map(|r| r.source_airport_id) {
        *degree.entry(id).or_insert(0) += 1;
    }

    let mut hubs: Vec<Hub> = degree
        .into_iter()
        .map(|(airport_id, degree)| {
            let airport = by_id.get(&airport_id);
            Hub {
                airport_id,
                name: airport.and_then(|a| a.name.clone()),
                city: airport.and_then(|a| a.city.clone()),
                country: airport.and_then(|a| a.country.clone()),
                degree,
            }
        })
        .collect();

    hubs.sort_by(|a, b| {
        b.degree
            .cmp(&a.degree)
            .then_with(|| a.airport_id.cmp(&b.airport_id))
    });
    hubs.truncate(limit);
    hubs
}

/// Most frequent (source city, destination city) pairs
pub fn top_city_pairs(routes: &[Route], airports: &[Airport], limit: usize) -> Vec<CityPair> {
    let by_id = index(airports);

    let mut counts: HashMap<(Option<String>, Option<String>), usize> = HashMap::new();
    for route in routes {
        let key = (
            city_of(&by_id, route.source_airport_id),
            city_of(&by_id, route.dest_airport_id),
        );
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut pairs: Vec<CityPair> = counts
        .into_iter()
        .map(|((source_city, dest_city), flights)| CityPair {
            source_city,
            dest_city,
            flights,
        })
        .collect();

    pairs.sort_by(|a, b| {
        b.flights
            .cmp(&a.flights)
            .then_with(|| a.source_city.cmp(&b.source_city))
            .then_with(|| a.dest_city.cmp(&b.dest_city))
    });
    pairs.truncate(limit);
    pairs
}

/// Total passengers and mean delay per departure airport
///
/// Only routes with passenger stats and a known source airport count.
pub fn hub_load_and_delay(
    routes: &[Route],
    airports: &[Airport],
    stats: &[PassengerStat],
    limit: usize,
) -> Vec<HubLoad> {
    let by_id = index(airports);
    let source_of: HashMap<RouteId, AirportId> = routes
        .iter()
        .filter_map(|r| Some((r.route_id, r.source_airport_id?)))
        .collect();

    // airport -> (passengers, delay sum, stat rows)
    let mut totals: HashMap<AirportId, (u64, f64, usize)> = HashMap::new();
    for stat in stats {
        let Some(&airport_id) = source_of.get(&stat.route_id) else {
            continue;
        };
        if !by_id.contains_key(&airport_id) {
            continue;
        }
        let entry = totals.entry(airport_id).or_insert((0, 0.0, 0));
        entry.0 += stat.passengers;
        entry.1 += stat.avg_delay_minutes;
        entry.2 += 1;
    }

    let mut hubs: Vec<HubLoad> = totals
        .into_iter()
        .filter_map(|(airport_id, (passengers, delay_sum, rows))| {
            let airport = by_id.get(&airport_id)?;
            Some(HubLoad {
                airport_id,
                name: airport.name.clone(),
                city: airport.city.clone(),
                country: airport.country.clone(),
                total_passengers: passengers,
                avg_delay: delay_sum / rows as f64,
            })
        })
        .collect();

    hubs.sort_by(|a, b| {
        b.total_passengers
            .cmp(&a.total_passengers)
            .then_with(|| a.airport_id.cmp(&b.airport_id))
    });
    hubs.truncate(limit);
    hubs
}

/// Routes on the most heavily served city pairs
pub fn busiest_routes(routes: &[Route], airports: &[Airport], limit: usize) -> Vec<RouteFrequency> {
    let by_id = index(airports);
    let names: Vec<Option<String>> = routes.iter().map(|r| route_name(r, &by_id)).collect();

    let mut per_pair: HashMap<&Option<String>, usize> = HashMap::new();
    for name in &names {
        *per_pair.entry(name).or_insert(0) += 1;
    }

    let mut ranked: Vec<RouteFrequency> = routes
        .iter()
        .zip(&names)
        .map(|(route, name)| RouteFrequency {
            route_id: route.route_id,
            route_name: name.clone(),
            frequency: per_pair.get(name).copied().unwrap_or(0),
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.frequency
            .cmp(&a.frequency)
            .then_with(|| a.route_id.cmp(&b.route_id))
    });
    ranked.truncate(limit);
    ranked
}

/// Routes with delay risk scores, riskiest first
pub fn delay_risk_overview(
    routes: &[Route],
    airports: &[Airport],
    risks: &[DelayRisk],
    limit: usize,
) -> Vec<RouteRisk> {
    let by_id = index(airports);
    let by_route: HashMap<RouteId, &Route> = routes.iter().map(|r| (r.route_id, r)).collect();

    let mut ranked: Vec<RouteRisk> = risks
        .iter()
        .filter_map(|risk| {
            let route = by_route.get(&risk.route_id)?;
            Some(RouteRisk {
                route_id: risk.route_id,
                route_name: route_name(route, &by_id),
                overall_risk: risk.overall_risk,
                weather_risk: risk.weather_risk,
                congestion_risk: risk.congestion_risk,
                infra_risk: risk.infra_risk,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.overall_risk
            .total_cmp(&a.overall_risk)
            .then_with(|| a.route_id.cmp(&b.route_id))
    });
    ranked.truncate(limit);
    ranked
}

/// Routes that depart from or arrive at a closed airport, most passengers first
///
/// Routes without passenger stats count as zero passengers.
pub fn simulate_closure(
    routes: &[Route],
    airports: &[Airport],
    stats: &[PassengerStat],
    closed: AirportId,
) -> Vec<AffectedRoute> {
    let by_id = index(airports);
    let mut passengers: HashMap<RouteId, u64> = HashMap::new();
    for stat in stats {
        *passengers.entry(stat.route_id).or_insert(0) += stat.passengers;
    }

    let mut affected_routes: Vec<AffectedRoute> = routes
        .iter()
        .filter(|r| r.touches(closed))
        .map(|r| AffectedRoute {
            est_passengers: Some(passengers.get(&r.route_id).copied().unwrap_or(0)),
            ..affected(r, &by_id)
        })
        .collect();

    affected_routes.sort_by(|a, b| {
        b.est_passengers
            .cmp(&a.est_passengers)
            .then_with(|| a.route_id.cmp(&b.route_id))
    });
    affected_routes
}

/// Routes that avoid a closed airport but serve its city or country
///
/// An unknown airport yields no suggestions.
pub fn suggest_alternates(
    routes: &[Route],
    airports: &[Airport],
    closed: AirportId,
    top_k: usize,
) -> Vec<AffectedRoute> {
    let by_id = index(airports);
    let Some(closed_airport) = by_id.get(&closed) else {
        return vec![];
    };
    let serves = |a: &Airport| {
        (closed_airport.city.is_some() && a.city == closed_airport.city)
            || (closed_airport.country.is_some() && a.country == closed_airport.country)
    };

    routes
        .iter()
        .filter(|r| !r.touches(closed))
        .filter_map(|r| {
            let src = by_id.get(&r.source_airport_id?).copied()?;
            let dst = by_id.get(&r.dest_airport_id?).copied()?;
            (serves(src) || serves(dst)).then(|| affected(r, &by_id))
        })
        .take(top_k)
        .collect()
}

fn affected(route: &Route, by_id: &HashMap<AirportId, &Airport>) -> AffectedRoute {
    let src = route.source_airport_id.and_then(|id| by_id.get(&id).copied());
    let dst = route.dest_airport_id.and_then(|id| by_id.get(&id).copied());
    AffectedRoute {
        route_id: route.route_id,
        src_airport: src.and_then(|a| a.name.clone()),
        dst_airport: dst.and_then(|a| a.name.clone()),
        src_city: src.and_then(|a| a.city.clone()),
        dst_city: dst.and_then(|a| a.city.clone()),
        src_country: src.and_then(|a| a.country.clone()),
        dst_country: dst.and_then(|a| a.country.clone()),
        est_passengers: None,
    }
}
