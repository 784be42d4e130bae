//! RocksDB route store
//!
//! Persists the relational reference data (airports, airlines, routes) and
//! the per-route embedding records in a single RocksDB instance with LZ4
//! compression. Keys are a table prefix followed by the big-endian id, so a
//! prefix scan yields rows in ascending id order.
//!
//! Similarity queries read the whole `emb:` keyspace on every call. That is
//! a full O(N) scan by construction; an index can replace it behind
//! [`EmbeddingStore::read_all`] without touching callers.

use parking_lot::Mutex;
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, DB};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Result, VectorError};
use crate::route::{
    Airline, AirlineId, Airport, AirportId, DelayRisk, EmbeddingRecord, JoinedRoute,
    PassengerStat, Route, RouteId,
};

const AIRPORT_PREFIX: &[u8] = b"airport:";
const AIRLINE_PREFIX: &[u8] = b"airline:";
const ROUTE_PREFIX: &[u8] = b"route:";
const EMBEDDING_PREFIX: &[u8] = b"emb:";
const PASSENGER_PREFIX: &[u8] = b"pax:";
const RISK_PREFIX: &[u8] = b"risk:";

/// One row of an embedding upsert; `None` fields are left untouched
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingUpsert {
    pub route_id: RouteId,
    pub description: Option<String>,
    pub embedding: Option<Vec<f32>>,
}

/// Read access to routes joined with their airports and airline
pub trait RouteSource: Send + Sync {
    /// Up to `limit` joined routes in ascending route id order
    fn joined_routes(&self, limit: usize) -> Result<Vec<JoinedRoute>>;
}

/// Persistence contract for route embedding records
pub trait EmbeddingStore: Send + Sync {
    /// Configured embedding dimension
    fn dimension(&self) -> usize;

    /// Insert or update one record, overwriting only the supplied fields
    ///
    /// Atomic per call. Embeddings whose length differs from
    /// [`dimension`](Self::dimension) are rejected before anything is written.
    fn upsert(
        &self,
        route_id: RouteId,
        description: Option<&str>,
        embedding: Option<&[f32]>,
    ) -> Result<()>;

    /// Apply a chunk of upserts as independent single-row commits
    fn upsert_chunk(&self, rows: &[EmbeddingUpsert]) -> Result<()> {
        for row in rows {
            self.upsert(
                row.route_id,
                row.description.as_deref(),
                row.embedding.as_deref(),
            )?;
        }
        Ok(())
    }

    /// Record for one route, if any
    fn get(&self, route_id: RouteId) -> Result<Option<EmbeddingRecord>>;

    /// Every record with a non-null embedding, ascending route id
    fn read_all(&self) -> Result<Vec<EmbeddingRecord>>;

    /// Up to `limit` records with a non-null description, ascending route id
    fn read_described(&self, limit: usize) -> Result<Vec<EmbeddingRecord>>;
}

/// RocksDB-based route and embedding store
pub struct RouteStore {
    db: DB,
    dimension: usize,
    /// Serializes read-modify-write upserts
    write_lock: Mutex<()>,
}

impl RouteStore {
    /// Open (or create) a store at the given path for `dimension`-d embeddings
    pub fn new(path: impl AsRef<Path>, dimension: usize) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_max_background_jobs(2);
        opts.set_bytes_per_sync(1048576); // 1MB
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let db = DB::open(&opts, path)?;
        crate::schema::ensure(&db, dimension)?;

        log::info!("RouteStore opened at: {} ({}d)", path.display(), dimension);

        Ok(Self {
            db,
            dimension,
            write_lock: Mutex::new(()),
        })
    }

    /// Bulk insert or replace airports
    pub fn put_airports(&self, airports: &[Airport]) -> Result<usize> {
        self.put_rows(AIRPORT_PREFIX, airports, |a| a.airport_id.0)
    }

    /// Bulk insert or replace airlines
    pub fn put_airlines(&self, airlines: &[Airline]) -> Result<usize> {
        self.put_rows(AIRLINE_PREFIX, airlines, |a| a.airline_id.0)
    }

    /// Bulk insert or replace routes
    pub fn put_routes(&self, routes: &[Route]) -> Result<usize> {
        self.put_rows(ROUTE_PREFIX, routes, |r| r.route_id.0)
    }

    /// Bulk insert or replace per-route passenger statistics
    pub fn put_passenger_stats(&self, stats: &[PassengerStat]) -> Result<usize> {
        self.put_rows(PASSENGER_PREFIX, stats, |s| s.route_id.0)
    }

    /// Bulk insert or replace per-route delay risk scores
    pub fn put_delay_risks(&self, risks: &[DelayRisk]) -> Result<usize> {
        self.put_rows(RISK_PREFIX, risks, |r| r.route_id.0)
    }

    /// All airports, ascending id
    pub fn airports(&self) -> Result<Vec<Airport>> {
        self.scan(AIRPORT_PREFIX, usize::MAX)
    }

    /// All airlines, ascending id
    pub fn airlines(&self) -> Result<Vec<Airline>> {
        self.scan(AIRLINE_PREFIX, usize::MAX)
    }

    /// All routes, ascending id
    pub fn routes(&self) -> Result<Vec<Route>> {
        self.scan(ROUTE_PREFIX, usize::MAX)
    }

    /// All passenger statistics, ascending route id
    pub fn passenger_stats(&self) -> Result<Vec<PassengerStat>> {
        self.scan(PASSENGER_PREFIX, usize::MAX)
    }

    /// All delay risk scores, ascending route id
    pub fn delay_risks(&self) -> Result<Vec<DelayRisk>> {
        self.scan(RISK_PREFIX, usize::MAX)
    }

    /// Look up one airport
    pub fn airport(&self, id: AirportId) -> Result<Option<Airport>> {
        self.get_row(AIRPORT_PREFIX, id.0)
    }

    /// Look up one route
    pub fn route(&self, id: RouteId) -> Result<Option<Route>> {
        self.get_row(ROUTE_PREFIX, id.0)
    }

    /// Get store statistics
    pub fn stats(&self) -> Result<serde_json::Value> {
        let mut described = 0usize;
        let mut embedded = 0usize;
        let mut records = 0usize;
        for record in self.scan::<EmbeddingRecord>(EMBEDDING_PREFIX, usize::MAX)? {
            records += 1;
            if record.description.is_some() {
                described += 1;
            }
            if record.embedding.is_some() {
                embedded += 1;
            }
        }

        Ok(serde_json::json!({
            "airports": self.count(AIRPORT_PREFIX)?,
            "airlines": self.count(AIRLINE_PREFIX)?,
            "routes": self.count(ROUTE_PREFIX)?,
            "passengerStats": self.count(PASSENGER_PREFIX)?,
            "delayRisks": self.count(RISK_PREFIX)?,
            "embeddingRecords": records,
            "describedRoutes": described,
            "embeddedRoutes": embedded,
            "dimension": self.dimension,
        }))
    }

    fn put_rows<T: Serialize>(
        &self,
        prefix: &[u8],
        rows: &[T],
        id_of: impl Fn(&T) -> u64,
    ) -> Result<usize> {
        let mut batch = WriteBatch::default();
        for row in rows {
            batch.put(key(prefix, id_of(row)), bincode::serialize(row)?);
        }
        self.db.write(batch)?;
        self.db.flush()?;
        Ok(rows.len())
    }

    fn get_row<T: DeserializeOwned>(&self, prefix: &[u8], id: u64) -> Result<Option<T>> {
        match self.db.get(key(prefix, id))? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Ordered prefix scan, stopping after `limit` rows
    fn scan<T: DeserializeOwned>(&self, prefix: &[u8], limit: usize) -> Result<Vec<T>> {
        self.scan_filtered(prefix, limit, |_: &T| true)
    }

    fn scan_filtered<T: DeserializeOwned>(
        &self,
        prefix: &[u8],
        limit: usize,
        keep: impl Fn(&T) -> bool,
    ) -> Result<Vec<T>> {
        let mut rows = Vec::new();
        if limit == 0 {
            return Ok(rows);
        }
        for item in self
            .db
            .iterator(IteratorMode::From(prefix, Direction::Forward))
        {
            let (k, value) = item?;
            if !k.starts_with(prefix) {
                break;
            }
            let row: T = bincode::deserialize(&value)?;
            if keep(&row) {
                rows.push(row);
                if rows.len() >= limit {
                    break;
                }
            }
        }
        Ok(rows)
    }

    fn count(&self, prefix: &[u8]) -> Result<usize> {
        let mut count = 0;
        for item in self
            .db
            .iterator(IteratorMode::From(prefix, Direction::Forward))
        {
            let (k, _) = item?;
            if !k.starts_with(prefix) {
                break;
            }
            count += 1;
        }
        Ok(count)
    }
}

impl RouteSource for RouteStore {
    fn joined_routes(&self, limit: usize) -> Result<Vec<JoinedRoute>> {
        let routes: Vec<Route> = self.scan(ROUTE_PREFIX, limit)?;
        if routes.is_empty() {
            return Ok(vec![]);
        }

        let airports: HashMap<AirportId, Airport> = self
            .airports()?
            .into_iter()
            .map(|a| (a.airport_id, a))
            .collect();
        let airlines: HashMap<AirlineId, Airline> = self
            .airlines()?
            .into_iter()
            .map(|a| (a.airline_id, a))
            .collect();

        Ok(routes
            .iter()
            .map(|route| {
                JoinedRoute::join(
                    route,
                    route.source_airport_id.and_then(|id| airports.get(&id)),
                    route.dest_airport_id.and_then(|id| airports.get(&id)),
                    route.airline_id.and_then(|id| airlines.get(&id)),
                )
            })
            .collect())
    }
}

impl EmbeddingStore for RouteStore {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn upsert(
        &self,
        route_id: RouteId,
        description: Option<&str>,
        embedding: Option<&[f32]>,
    ) -> Result<()> {
        if let Some(vector) = embedding {
            if vector.len() != self.dimension {
                return Err(VectorError::dimension(self.dimension, vector.len()));
            }
        }

        let _guard = self.write_lock.lock();
        let mut record = self
            .get_row::<EmbeddingRecord>(EMBEDDING_PREFIX, route_id.0)?
            .unwrap_or_else(|| EmbeddingRecord::new(route_id));
        record.apply(description, embedding);
        self.db.put(
            key(EMBEDDING_PREFIX, route_id.0),
            bincode::serialize(&record)?,
        )?;
        Ok(())
    }

    fn upsert_chunk(&self, rows: &[EmbeddingUpsert]) -> Result<()> {
        for row in rows {
            self.upsert(
                row.route_id,
                row.description.as_deref(),
                row.embedding.as_deref(),
            )?;
        }
        self.db.flush()?;
        Ok(())
    }

    fn get(&self, route_id: RouteId) -> Result<Option<EmbeddingRecord>> {
        self.get_row(EMBEDDING_PREFIX, route_id.0)
    }

    fn read_all(&self) -> Result<Vec<EmbeddingRecord>> {
        self.scan_filtered(EMBEDDING_PREFIX, usize::MAX, |r: &EmbeddingRecord| {
            r.embedding.is_some()
        })
    }

    fn read_described(&self, limit: usize) -> Result<Vec<EmbeddingRecord>> {
        self.scan_filtered(EMBEDDING_PREFIX, limit, |r: &EmbeddingRecord| {
            r.description.is_some()
        })
    }
}

fn key(prefix: &[u8], id: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(prefix.len() + 8);
    key.extend_from_slice(prefix);
    key.extend_from_slice(&id.to_be_bytes());
    key
}
