//! OpenFlights data loaders
//!
//! Parses `airports.dat`, `airlines.dat` and `routes.dat`: comma-separated,
//! double-quoted text fields, `\N` for null. Short or malformed rows are
//! skipped and counted rather than failing the load.
//!
//! The optional per-route metrics files `passenger_stats.csv` and
//! `delay_risks.csv` use the same record format with a `route_id` header.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Result, VectorError};
use crate::route::{
    Airline, AirlineId, Airport, AirportId, DelayRisk, PassengerStat, Route, RouteId,
};

pub const AIRPORTS_FILE: &str = "airports.dat";
pub const AIRLINES_FILE: &str = "airlines.dat";
pub const ROUTES_FILE: &str = "routes.dat";
pub const PASSENGER_STATS_FILE: &str = "passenger_stats.csv";
pub const DELAY_RISKS_FILE: &str = "delay_risks.csv";

const AIRPORT_COLUMNS: usize = 14;
const AIRLINE_COLUMNS: usize = 8;
const ROUTE_COLUMNS: usize = 9;
const PASSENGER_COLUMNS: usize = 3;
const RISK_COLUMNS: usize = 5;
const METRICS_HEADER: &str = "route_id";

/// Rows parsed from one file
#[derive(Debug, Clone, Default)]
pub struct Parsed<T> {
    pub rows: Vec<T>,
    pub skipped: usize,
}

/// The three OpenFlights tables
#[derive(Debug, Clone, Default)]
pub struct OpenFlights {
    pub airports: Parsed<Airport>,
    pub airlines: Parsed<Airline>,
    pub routes: Parsed<Route>,
}

impl OpenFlights {
    /// Load all three files from a directory
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let data = Self {
            airports: parse_airports(open(&dir.join(AIRPORTS_FILE))?)?,
            airlines: parse_airlines(open(&dir.join(AIRLINES_FILE))?)?,
            routes: parse_routes(open(&dir.join(ROUTES_FILE))?)?,
        };
        log::info!(
            "Parsed {} airports, {} airlines, {} routes ({} rows skipped)",
            data.airports.rows.len(),
            data.airlines.rows.len(),
            data.routes.rows.len(),
            data.airports.skipped + data.airlines.skipped + data.routes.skipped
        );
        Ok(data)
    }

    /// Whether a directory holds all three files
    pub fn present_in(dir: &Path) -> bool {
        [AIRPORTS_FILE, AIRLINES_FILE, ROUTES_FILE]
            .iter()
            .all(|f| dir.join(f).is_file())
    }
}

/// Optional per-route metrics; absent files load as empty tables
#[derive(Debug, Clone, Default)]
pub struct RouteMetrics {
    pub passenger_stats: Parsed<PassengerStat>,
    pub delay_risks: Parsed<DelayRisk>,
}

impl RouteMetrics {
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let pax_path = dir.join(PASSENGER_STATS_FILE);
        let risk_path = dir.join(DELAY_RISKS_FILE);
        let mut metrics = Self::default();
        if pax_path.is_file() {
            metrics.passenger_stats = parse_passenger_stats(open(&pax_path)?)?;
        }
        if risk_path.is_file() {
            metrics.delay_risks = parse_delay_risks(open(&risk_path)?)?;
        }
        log::info!(
            "Parsed {} passenger stats, {} delay risks",
            metrics.passenger_stats.rows.len(),
            metrics.delay_risks.rows.len()
        );
        Ok(metrics)
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| VectorError::invalid_path(format!("{}: {}", path.display(), e)))
}

/// Parse airports.dat rows
pub fn parse_airports(reader: impl BufRead) -> Result<Parsed<Airport>> {
    parse_with(reader, AIRPORT_COLUMNS, None, |f| {
        Some(Airport {
            airport_id: AirportId(f[0].parse().ok()?),
            name: text(&f[1]),
            city: text(&f[2]),
            country: text(&f[3]),
            iata: text(&f[4]),
            icao: text(&f[5]),
            latitude: number(&f[6]),
            longitude: number(&f[7]),
            altitude: number::<f64>(&f[8]).map(|a| a as i32),
            timezone: number(&f[9]),
            dst: text(&f[10]),
            tz_db: text(&f[11]),
        })
    })
}

/// Parse airlines.dat rows
pub fn parse_airlines(reader: impl BufRead) -> Result<Parsed<Airline>> {
    parse_with(reader, AIRLINE_COLUMNS, None, |f| {
        Some(Airline {
            airline_id: AirlineId(f[0].parse().ok()?),
            name: text(&f[1]),
            alias: text(&f[2]),
            iata: text(&f[3]),
            icao: text(&f[4]),
            callsign: text(&f[5]),
            country: text(&f[6]),
            active: f[7].eq_ignore_ascii_case("y"),
        })
    })
}

/// Parse routes.dat rows; route ids are assigned from 1 in file order
pub fn parse_routes(reader: impl BufRead) -> Result<Parsed<Route>> {
    let mut next_id = 0u64;
    parse_with(reader, ROUTE_COLUMNS, None, |f| {
        next_id += 1;
        Some(Route {
            route_id: RouteId(next_id),
            airline_code: text(&f[0]),
            airline_id: number(&f[1]).map(AirlineId),
            source_code: text(&f[2]),
            source_airport_id: number(&f[3]).map(AirportId),
            dest_code: text(&f[4]),
            dest_airport_id: number(&f[5]).map(AirportId),
            codeshare: f[6].eq_ignore_ascii_case("y"),
            stops: number(&f[7]).unwrap_or(0),
            equipment: text(&f[8]),
        })
    })
}

/// Parse passenger_stats.csv rows: route_id, passengers, avg_delay_minutes
pub fn parse_passenger_stats(reader: impl BufRead) -> Result<Parsed<PassengerStat>> {
    parse_with(reader, PASSENGER_COLUMNS, Some(METRICS_HEADER), |f| {
        Some(PassengerStat {
            route_id: RouteId(number(&f[0])?),
            passengers: number(&f[1])?,
            avg_delay_minutes: number(&f[2]).unwrap_or(0.0),
        })
    })
}

/// Parse delay_risks.csv rows: route_id, overall, weather, congestion, infra
pub fn parse_delay_risks(reader: impl BufRead) -> Result<Parsed<DelayRisk>> {
    parse_with(reader, RISK_COLUMNS, Some(METRICS_HEADER), |f| {
        Some(DelayRisk {
            route_id: RouteId(number(&f[0])?),
            overall_risk: number(&f[1])?,
            weather_risk: number(&f[2]).unwrap_or(0.0),
            congestion_risk: number(&f[3]).unwrap_or(0.0),
            infra_risk: number(&f[4]).unwrap_or(0.0),
        })
    })
}

fn parse_with<T>(
    reader: impl BufRead,
    min_columns: usize,
    header: Option<&str>,
    mut build: impl FnMut(&[String]) -> Option<T>,
) -> Result<Parsed<T>> {
    let mut parsed = Parsed {
        rows: Vec::new(),
        skipped: 0,
    };
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if line_no == 0 && header.is_some_and(|h| line.trim_start().starts_with(h)) {
            continue;
        }
        let fields = split_record(&line);
        if fields.len() < min_columns {
            log::debug!("Skipping short row {} ({} fields)", line_no + 1, fields.len());
            parsed.skipped += 1;
            continue;
        }
        match build(&fields) {
            Some(row) => parsed.rows.push(row),
            None => {
                log::debug!("Skipping malformed row {}", line_no + 1);
                parsed.skipped += 1;
            }
        }
    }
    Ok(parsed)
}

/// Split one comma-separated record, honoring double quotes (`""` escapes a quote)
pub fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.trim_end_matches(['\r', '\n']).chars().peekable();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            ('"', _) => in_quotes = !in_quotes,
            (',', false) => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

fn is_null(raw: &str) -> bool {
    let raw = raw.trim();
    raw.is_empty() || raw == "\\N"
}

fn text(raw: &str) -> Option<String> {
    (!is_null(raw)).then(|| raw.trim().to_string())
}

fn number<T: std::str::FromStr>(raw: &str) -> Option<T> {
    if is_null(raw) {
        None
    } else {
        raw.trim().parse().ok()
    }
}
