//! The engine facade: owns the network, the rules, the compiled-graph
//! cache, and the query log.

use std::hash::{Hash, Hasher};

use geo::Point;
use na_core::RuleSet;
use na_geom::{EuclideanKernel, GeometryKernel, RTreeIndex, SpatialIndex};
use na_net::Network;
use rustc_hash::FxHasher;

use crate::connect::{self, AttachResult};
use crate::error::EngineResult;
use crate::graph::CompiledGraph;
use crate::od_matrix::{self, OdOptions, OdRow};
use crate::points::PointRecord;
use crate::query_log::{LogRecord, QueryLog};
use crate::route::{self, FrequencyRow, RouteRow};
use crate::service_area::{self, ServiceAreaRow};
use crate::validate;

// ── Cache ─────────────────────────────────────────────────────────────────────

struct CacheEntry {
    fingerprint: u64,
    /// Resolved per-edge weights, aligned with the network edge table.
    weights: Vec<Option<f64>>,
    graph: CompiledGraph,
    origin_missing: Vec<bool>,
    destination_missing: Vec<bool>,
}

/// Everything one query computation reads, borrowed from the engine once
/// the compiled graph is up to date.
struct PreparedQuery<'a, K> {
    graph: &'a CompiledGraph,
    /// Resolved per-edge weights, aligned with the network edge table.
    weights: &'a [Option<f64>],
    network: &'a Network,
    rules: &'a RuleSet,
    kernel: &'a K,
    origin_offset: u32,
    destination_offset: u32,
}

// ── Engine ────────────────────────────────────────────────────────────────────

/// Road-network routing engine.
///
/// Owns a [`Network`] and a [`RuleSet`] and answers the four query
/// families: OD cost matrices, route geometries (plain and k alternatives),
/// route frequencies, and service areas.  The compiled graph is cached and
/// rebuilt only when the network revision, the rules, or the query point
/// coordinates change.
///
/// Rules can be tuned between queries through [`Engine::rules_mut`]; the
/// cache notices by content, not by assignment.  The engine is not meant
/// for concurrent use — queries take `&mut self` — but fans individual
/// queries out across origins with the `parallel` feature.
///
/// # Example
///
/// ```rust,ignore
/// use na_core::{RuleSet, WeightSpec};
/// use na_engine::{Engine, OdOptions};
///
/// let mut engine = Engine::new(network, RuleSet::new(WeightSpec::Length));
/// let od = engine.od_cost_matrix(&origins, &destinations, &OdOptions::default())?;
/// ```
pub struct Engine<K = EuclideanKernel, S = RTreeIndex> {
    network: Network,
    rules: RuleSet,
    kernel: K,
    index: S,
    cache: Option<CacheEntry>,
    rebuilds: u64,
    log: QueryLog,
}

impl Engine {
    /// Engine with the default geometry kernel and spatial index.
    pub fn new(network: Network, rules: RuleSet) -> Engine {
        Engine::with_services(network, rules, EuclideanKernel, RTreeIndex)
    }
}

impl<K: GeometryKernel, S: SpatialIndex> Engine<K, S> {
    /// Engine with caller-provided geometry and index backends.
    pub fn with_services(network: Network, rules: RuleSet, kernel: K, index: S) -> Engine<K, S> {
        Engine {
            network,
            rules,
            kernel,
            index,
            cache: None,
            rebuilds: 0,
            log: QueryLog::default(),
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Mutable network access, e.g. to close holes or impute synthetic
    /// weights between queries.  Mutation bumps the network revision, which
    /// invalidates the compiled graph.
    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn rules_mut(&mut self) -> &mut RuleSet {
        &mut self.rules
    }

    /// One record per query run on this engine.
    pub fn log(&self) -> &QueryLog {
        &self.log
    }

    /// How many times the compiled graph has been (re)built.  Identical
    /// consecutive queries reuse the cache and do not increase this.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Cost of the cheapest path for every origin–destination pair.
    /// Unreachable pairs come back with `cost: None` (unless dropped by
    /// `cutoff`/`destination_count`); coordinate-equal pairs cost exactly 0.
    pub fn od_cost_matrix(
        &mut self,
        origins: &[PointRecord],
        destinations: &[PointRecord],
        opts: &OdOptions,
    ) -> EngineResult<Vec<OdRow>> {
        let prep = self.prepare(origins, destinations)?;
        let outcome = od_matrix::od_cost_matrix(
            prep.graph,
            origins,
            prep.origin_offset,
            destinations,
            prep.destination_offset,
            opts,
            prep.kernel,
        )?;

        let costs: Vec<f64> = outcome.rows.iter().filter_map(|r| r.cost).collect();
        let cost_mean = mean(&costs);
        let percent_missing = percent_missing(outcome.n_pairs, costs.len());
        self.push_log(
            "od_cost_matrix",
            origins.len(),
            destinations.len(),
            cost_mean,
            percent_missing,
        );
        Ok(outcome.rows)
    }

    /// The cheapest path per pair as a dissolved multi-line, with the
    /// summed weight of its network edges.  Pairs without a path are
    /// omitted.
    pub fn get_route(
        &mut self,
        origins: &[PointRecord],
        destinations: &[PointRecord],
    ) -> EngineResult<Vec<RouteRow>> {
        let prep = self.prepare(origins, destinations)?;
        let outcome = route::routes(
            prep.graph,
            prep.network,
            prep.rules,
            origins,
            prep.origin_offset,
            destinations,
            prep.destination_offset,
            prep.kernel,
        );

        let weights: Vec<f64> = outcome.rows.iter().map(|r| r.weight).collect();
        let cost_mean = mean(&weights);
        let percent_missing = percent_missing(outcome.n_pairs, outcome.n_found_pairs);
        self.push_log(
            "get_route",
            origins.len(),
            destinations.len(),
            cost_mean,
            percent_missing,
        );
        Ok(outcome.rows)
    }

    /// Up to `k` alternative routes per pair, produced by repeatedly
    /// deleting the middle `drop_middle_percent` percent of the previous
    /// route from a working copy of the graph.  Rows carry the alternative
    /// index in `k`, starting at 1.
    pub fn get_k_routes(
        &mut self,
        origins: &[PointRecord],
        destinations: &[PointRecord],
        k: usize,
        drop_middle_percent: f64,
    ) -> EngineResult<Vec<RouteRow>> {
        let prep = self.prepare(origins, destinations)?;
        let outcome = route::k_routes(
            prep.graph,
            prep.network,
            prep.rules,
            origins,
            prep.origin_offset,
            destinations,
            prep.destination_offset,
            k,
            drop_middle_percent,
            prep.kernel,
        )?;

        let weights: Vec<f64> = outcome.rows.iter().map(|r| r.weight).collect();
        let cost_mean = mean(&weights);
        let percent_missing = percent_missing(outcome.n_pairs, outcome.n_found_pairs);
        self.push_log(
            "get_k_routes",
            origins.len(),
            destinations.len(),
            cost_mean,
            percent_missing,
        );
        Ok(outcome.rows)
    }

    /// How often each network edge is traversed when routing every pair
    /// once, weighted by optional per-pair multipliers `(origin index,
    /// destination index, multiplier)`.  Returns the traversed subset of
    /// the network.
    pub fn get_route_frequencies(
        &mut self,
        origins: &[PointRecord],
        destinations: &[PointRecord],
        multipliers: Option<&[(usize, usize, f64)]>,
    ) -> EngineResult<Vec<FrequencyRow>> {
        let prep = self.prepare(origins, destinations)?;
        let (rows, n_pairs, n_found) = route::route_frequencies(
            prep.graph,
            prep.network,
            prep.weights,
            origins,
            prep.origin_offset,
            destinations,
            prep.destination_offset,
            multipliers,
        );

        let percent_missing = percent_missing(n_pairs, n_found);
        self.push_log(
            "get_route_frequencies",
            origins.len(),
            destinations.len(),
            None,
            percent_missing,
        );
        Ok(rows)
    }

    /// The network edges reachable from each origin within each break,
    /// ordered from the largest break to the smallest.  With `dissolve`
    /// one row per (origin, break); without, one row per reached edge.
    pub fn service_area(
        &mut self,
        origins: &[PointRecord],
        breaks: &[f64],
        dissolve: bool,
    ) -> EngineResult<Vec<ServiceAreaRow>> {
        let prep = self.prepare(origins, &[])?;
        let outcome = service_area::service_area(
            prep.graph,
            prep.network,
            origins,
            prep.origin_offset,
            breaks,
            dissolve,
            prep.kernel,
        )?;

        let percent_missing = percent_missing(outcome.n_cells, outcome.n_filled);
        self.push_log("service_area", origins.len(), 0, None, percent_missing);
        Ok(outcome.rows)
    }

    /// Per-origin flags from the last prepared query: `true` where the
    /// point found no connector within the search tolerance.
    pub fn origin_missing(&self) -> &[bool] {
        self.cache.as_ref().map_or(&[], |c| &c.origin_missing)
    }

    /// Per-destination flags, like [`Engine::origin_missing`].
    pub fn destination_missing(&self) -> &[bool] {
        self.cache.as_ref().map_or(&[], |c| &c.destination_missing)
    }

    // ── Preparation and cache ─────────────────────────────────────────────

    /// Validate the rules, bring the compiled graph up to date, and hand
    /// out the borrows the query computation needs.
    fn prepare(
        &mut self,
        origins: &[PointRecord],
        destinations: &[PointRecord],
    ) -> EngineResult<PreparedQuery<'_, K>> {
        validate::validate_rules(&self.rules)?;

        let origin_points: Vec<Point> = origins.iter().map(|r| r.point).collect();
        let destination_points: Vec<Point> = destinations.iter().map(|r| r.point).collect();
        let fingerprint = self.fingerprint(&origin_points, &destination_points);

        let origin_offset = self.network.node_count() as u32;
        let destination_offset = origin_offset + origins.len() as u32;

        let entry: &CacheEntry = match self.cache.take() {
            Some(entry) if entry.fingerprint == fingerprint => self.cache.insert(entry),
            _ => {
                let weights = validate::resolve_weights(&self.network, &self.rules, &self.kernel)?;
                let (graph, AttachResult { origin_missing, destination_missing }) =
                    connect::assemble_graph(
                        &self.network,
                        &weights,
                        &self.rules,
                        &origin_points,
                        &destination_points,
                        &self.kernel,
                        &self.index,
                    )?;

                self.rebuilds += 1;
                self.cache.insert(CacheEntry {
                    fingerprint,
                    weights,
                    graph,
                    origin_missing,
                    destination_missing,
                })
            }
        };

        Ok(PreparedQuery {
            graph: &entry.graph,
            weights: &entry.weights,
            network: &self.network,
            rules: &self.rules,
            kernel: &self.kernel,
            origin_offset,
            destination_offset,
        })
    }

    /// Content key of the compiled graph: network revision, rule hash, and
    /// the coordinate sequences of both point sets.
    fn fingerprint(&self, origins: &[Point], destinations: &[Point]) -> u64 {
        let mut hasher = FxHasher::default();
        self.network.revision().hash(&mut hasher);
        self.rules.fingerprint().hash(&mut hasher);
        origins.len().hash(&mut hasher);
        for point in origins.iter().chain(destinations) {
            point.x().to_bits().hash(&mut hasher);
            point.y().to_bits().hash(&mut hasher);
        }
        hasher.finish()
    }

    fn push_log(
        &mut self,
        method: &'static str,
        n_origins: usize,
        n_destinations: usize,
        cost_mean: Option<f64>,
        percent_missing: f64,
    ) {
        self.log.push(LogRecord::new(
            method,
            &self.rules,
            n_origins,
            n_destinations,
            cost_mean,
            percent_missing,
        ));
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn percent_missing(expected: usize, present: usize) -> f64 {
    if expected == 0 {
        0.0
    } else {
        (expected - present.min(expected)) as f64 / expected as f64 * 100.0
    }
}
