//! Route description synthesis
//!
//! Renders a fixed natural-language template per route so that routes with
//! similar endpoints, carriers and equipment land close together in
//! embedding space.

use crate::error::Result;
use crate::route::{JoinedRoute, RouteId};
use crate::storage::RouteSource;

const UNKNOWN_CITY: &str = "Unknown City";
const UNKNOWN_IATA: &str = "N/A";
const UNKNOWN_AIRLINE: &str = "Unknown Airline";
const UNKNOWN_COUNTRY: &str = "Unknown Country";
const UNKNOWN_EQUIPMENT: &str = "various equipment";

/// Synthesize descriptions for up to `limit` routes, in route id order
pub fn synthesize<S: RouteSource + ?Sized>(
    source: &S,
    limit: usize,
) -> Result<Vec<(RouteId, String)>> {
    let routes = source.joined_routes(limit)?;
    log::debug!("Synthesizing descriptions for {} routes", routes.len());
    Ok(routes
        .iter()
        .map(|route| (route.route_id, describe(route)))
        .collect())
}

/// Render the description of a single route
pub fn describe(route: &JoinedRoute) -> String {
    format!(
        "The route from {} ({}) to {} ({}) is operated by {}.\n    \
         It typically has {} stop(s) and uses aircraft {}. This route connects {}\n    \
         to {} and serves both business and leisure passengers.",
        or(&route.src_city, UNKNOWN_CITY),
        or(&route.src_iata, UNKNOWN_IATA),
        or(&route.dst_city, UNKNOWN_CITY),
        or(&route.dst_iata, UNKNOWN_IATA),
        or(&route.airline_name, UNKNOWN_AIRLINE),
        route.stops.unwrap_or(0),
        or(&route.equipment, UNKNOWN_EQUIPMENT),
        or(&route.src_country, UNKNOWN_COUNTRY),
        or(&route.dst_country, UNKNOWN_COUNTRY),
    )
}

/// Empty strings count as missing
fn or<'a>(value: &'a Option<String>, fallback: &'a str) -> &'a str {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => v,
        _ => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<JoinedRoute>);

    impl RouteSource for Fixed {
        fn joined_routes(&self, limit: usize) -> Result<Vec<JoinedRoute>> {
            Ok(self.0.iter().take(limit).cloned().collect())
        }
    }

    fn full_route() -> JoinedRoute {
        JoinedRoute {
            route_id: RouteId(11),
            stops: Some(1),
            equipment: Some("738 320".into()),
            src_city: Some("Dublin".into()),
            src_iata: Some("DUB".into()),
            src_country: Some("Ireland".into()),
            dst_city: Some("Madrid".into()),
            dst_iata: Some("MAD".into()),
            dst_country: Some("Spain".into()),
            airline_name: Some("Ryanair".into()),
        }
    }

    #[test]
    fn test_describe_full_route() {
        let text = describe(&full_route());
        assert_eq!(
            text,
            "The route from Dublin (DUB) to Madrid (MAD) is operated by Ryanair.\n    \
             It typically has 1 stop(s) and uses aircraft 738 320. This route connects Ireland\n    \
             to Spain and serves both business and leisure passengers."
        );
    }

    #[test]
    fn test_describe_continuation_lines_indented() {
        let text = describe(&full_route());
        let lines: Vec<&str> = text.split('\n').collect();
        assert_eq!(lines.len(), 3);
        assert!(!lines[0].starts_with(' '));
        assert!(lines[1].starts_with("    It typically"));
        assert!(lines[2].starts_with("    to Spain"));
    }

    #[test]
    fn test_describe_fallbacks() {
        let route = JoinedRoute {
            route_id: RouteId(1),
            src_iata: Some(String::new()),
            ..Default::default()
        };
        let text = describe(&route);
        assert!(text.starts_with("The route from Unknown City (N/A) to Unknown City (N/A)"));
        assert!(text.contains("operated by Unknown Airline."));
        assert!(text.contains("has 0 stop(s)"));
        assert!(text.contains("uses aircraft various equipment."));
        assert!(text.contains("connects Unknown Country\n    to Unknown Country"));
    }

    #[test]
    fn test_synthesize_preserves_order_and_limit() {
        let mut second = full_route();
        second.route_id = RouteId(12);
        let source = Fixed(vec![full_route(), second, JoinedRoute::default()]);

        let out = synthesize(&source, 2).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].0, RouteId(11));
        assert_eq!(out[1].0, RouteId(12));
        assert_eq!(out[0].1, out[1].1);
    }
}
