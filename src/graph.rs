//! Layer 2: The LWW directed graph
//!
//! Four flat timestamp tables are the whole replicated state: vertex
//! add/remove stamps and edge add/remove stamps. Everything observable
//! ("is this vertex here", "which edges leave it") is derived from those
//! tables at read time, and reconciliation is a pointwise max over them.
//!
//! INVARIANT: stamps never decrease per key. Direct mutations overwrite
//! with the current wall clock; join combines with max.
//!
//! Tie rule: an add stamp equal to the remove stamp means removed, for
//! vertices and edges alike.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::crdt::Crdt;
use crate::time::WallClock;

/// Outgoing-edge table: from-vertex to (to-vertex, stamp) rows.
type EdgeMap<V> = IndexMap<V, IndexMap<V, WallClock>>;

/// State-based Last-Write-Wins directed graph.
///
/// Vertex-biased: [`remove_vertex`](LwwGraph::remove_vertex) also drops the
/// removed vertex's incident edge records locally. Join does not repeat
/// that cascade - it is a mechanical per-key max over the four tables, so
/// an edge added on one replica can outlive its endpoint's removal on
/// another until some replica removes the edge itself.
///
/// All four tables iterate in first-insertion order, which keeps
/// [`connected_vertices`](LwwGraph::connected_vertices),
/// [`find_path`](LwwGraph::find_path) and [`render`](LwwGraph::render)
/// reproducible. Equality ignores that order: two graphs are equal when
/// their tables hold the same entries.
///
/// Not synchronized; a shared instance needs external mutual exclusion.
/// Replica-level concurrency (one instance per writer, joined later) is
/// the intended model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LwwGraph<V: Eq + Hash> {
    vertices_added: IndexMap<V, WallClock>,
    vertices_removed: IndexMap<V, WallClock>,
    edges_added: EdgeMap<V>,
    edges_removed: EdgeMap<V>,
}

impl<V: Eq + Hash> LwwGraph<V> {
    pub fn new() -> Self {
        Self {
            vertices_added: IndexMap::new(),
            vertices_removed: IndexMap::new(),
            edges_added: IndexMap::new(),
            edges_removed: IndexMap::new(),
        }
    }

    /// Whether `v` is currently in the graph.
    ///
    /// Present means: an add stamp exists and is strictly newer than the
    /// remove stamp (missing remove stamp counts as the minimum). An exact
    /// tie goes to the removal.
    pub fn contains_vertex(&self, v: &V) -> bool {
        match self.vertices_added.get(v) {
            Some(added) => *added > self.vertices_removed.get(v).copied().unwrap_or(WallClock::MIN),
            None => false,
        }
    }

    /// Raw expiry predicate for the edge `from -> to` relative to stamp `at`.
    ///
    /// Expired means a remove record exists for the pair and its stamp is
    /// `<= at` - on an exact tie the removal wins, matching the vertex
    /// rule. No record for the pair means not expired; endpoint liveness
    /// is not consulted.
    pub fn is_edge_expired(&self, from: &V, to: &V, at: WallClock) -> bool {
        self.edges_removed
            .get(from)
            .and_then(|targets| targets.get(to))
            .is_some_and(|removed| *removed <= at)
    }

    /// Currently-present vertices, in first-insertion order.
    pub fn vertices(&self) -> impl Iterator<Item = &V> + '_ {
        self.vertices_added
            .keys()
            .filter(move |&v| self.contains_vertex(v))
    }

    /// Currently-present edges, in first-insertion order.
    ///
    /// An edge is present when its add stamp has not expired. Whether its
    /// endpoints are still present is deliberately not re-checked here;
    /// only a local vertex removal purges edge records.
    pub fn edges(&self) -> impl Iterator<Item = (&V, &V)> + '_ {
        self.edges_added.iter().flat_map(move |(from, targets)| {
            targets
                .iter()
                .filter(move |&(to, added)| !self.is_edge_expired(from, to, *added))
                .map(move |(to, _)| (from, to))
        })
    }

    /// Raw add-stamp table for vertices. Transport layers serialize this.
    pub fn vertices_added(&self) -> &IndexMap<V, WallClock> {
        &self.vertices_added
    }

    /// Raw remove-stamp table for vertices.
    pub fn vertices_removed(&self) -> &IndexMap<V, WallClock> {
        &self.vertices_removed
    }

    /// Raw add-stamp table for edges.
    pub fn edges_added(&self) -> &EdgeMap<V> {
        &self.edges_added
    }

    /// Raw remove-stamp table for edges.
    pub fn edges_removed(&self) -> &EdgeMap<V> {
        &self.edges_removed
    }
}

impl<V: Eq + Hash + Clone> LwwGraph<V> {
    /// Add `v` at the current wall clock.
    ///
    /// Re-adding just refreshes the stamp; there is never more than one
    /// row per vertex.
    pub fn add_vertex(&mut self, v: V) {
        self.add_vertex_at(v, WallClock::now());
    }

    /// Add `v` with an explicit stamp.
    ///
    /// Callers supplying their own stamps must keep them non-decreasing
    /// per key; the wall-clock forms do this by construction.
    pub fn add_vertex_at(&mut self, v: V, at: WallClock) {
        self.vertices_added.insert(v, at);
    }

    /// Remove `v` at the current wall clock.
    pub fn remove_vertex(&mut self, v: &V) {
        self.remove_vertex_at(v, WallClock::now());
    }

    /// Remove `v` with an explicit stamp, cascading into the edge tables.
    ///
    /// Records the remove stamp (the add/remove history for `v` itself is
    /// kept), then erases every edge record touching `v`: its own outgoing
    /// rows and its row in every other vertex's targets, in both edge
    /// tables. Each piece is a no-op if absent, and `v` need not have been
    /// added. The cascade is a local cleanup only - presence derivation
    /// does not rely on it, and join never performs it.
    pub fn remove_vertex_at(&mut self, v: &V, at: WallClock) {
        self.vertices_removed.insert(v.clone(), at);
        self.edges_added.shift_remove(v);
        self.edges_removed.shift_remove(v);
        for targets in self.edges_added.values_mut() {
            targets.shift_remove(v);
        }
        for targets in self.edges_removed.values_mut() {
            targets.shift_remove(v);
        }
    }

    /// Add the edge `from -> to` at the current wall clock.
    ///
    /// Returns false, touching nothing, unless both endpoints are
    /// currently present.
    pub fn add_edge(&mut self, from: V, to: V) -> bool {
        self.add_edge_at(from, to, WallClock::now())
    }

    /// Add the edge `from -> to` with an explicit stamp.
    pub fn add_edge_at(&mut self, from: V, to: V, at: WallClock) -> bool {
        if !self.contains_vertex(&from) || !self.contains_vertex(&to) {
            return false;
        }
        self.edges_added.entry(from).or_default().insert(to, at);
        true
    }

    /// Remove the edge `from -> to` at the current wall clock.
    ///
    /// Same endpoint precondition as [`add_edge`](LwwGraph::add_edge):
    /// returns false, touching nothing, unless both are present.
    pub fn remove_edge(&mut self, from: V, to: V) -> bool {
        self.remove_edge_at(from, to, WallClock::now())
    }

    /// Remove the edge `from -> to` with an explicit stamp.
    pub fn remove_edge_at(&mut self, from: V, to: V, at: WallClock) -> bool {
        if !self.contains_vertex(&from) || !self.contains_vertex(&to) {
            return false;
        }
        self.edges_removed.entry(from).or_default().insert(to, at);
        true
    }

    /// Vertices reachable from `v` over one unexpired edge, in
    /// first-insertion order. Empty when `v` has no outgoing record.
    pub fn connected_vertices(&self, v: &V) -> Vec<V> {
        let Some(targets) = self.edges_added.get(v) else {
            return Vec::new();
        };
        targets
            .iter()
            .filter(|&(to, added)| !self.is_edge_expired(v, to, *added))
            .map(|(to, _)| to.clone())
            .collect()
    }

    /// Some path from `from` to `to`, or empty when either endpoint is
    /// absent or no path exists (the two cases are not distinguished).
    ///
    /// Depth-first over [`connected_vertices`](LwwGraph::connected_vertices)
    /// with a visited set, returning the first path found - explicitly not
    /// the shortest one. Deterministic because the edge tables iterate in
    /// insertion order.
    pub fn find_path(&self, from: &V, to: &V) -> Vec<V> {
        if !self.contains_vertex(from) || !self.contains_vertex(to) {
            return Vec::new();
        }
        if from == to {
            return vec![from.clone()];
        }
        let mut visited = HashSet::new();
        let mut path = Vec::new();
        self.dfs(from, to, &mut visited, &mut path);
        path
    }

    fn dfs(&self, current: &V, to: &V, visited: &mut HashSet<V>, path: &mut Vec<V>) -> bool {
        path.push(current.clone());
        visited.insert(current.clone());
        if current == to {
            return true;
        }
        for next in self.connected_vertices(current) {
            if !visited.contains(&next) && self.dfs(&next, to, visited, path) {
                return true;
            }
        }
        path.pop();
        false
    }

    /// Join with another replica's state. Alias for [`Crdt::join`].
    pub fn merge(&self, other: &Self) -> Self {
        self.join(other)
    }
}

impl<V: Eq + Hash + Clone> Crdt for LwwGraph<V> {
    /// Pointwise max over the four stamp tables, each combined
    /// independently. Inner edge tables are deep-combined, never aliased.
    ///
    /// Join does not re-validate edges against vertex presence: an edge
    /// whose endpoint the other replica removed (and locally cascaded)
    /// survives the join if this replica still carries the add record and
    /// nobody removed the edge itself.
    fn join(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        join_stamps(&mut merged.vertices_added, &other.vertices_added);
        join_edges(&mut merged.edges_added, &other.edges_added);
        join_edges(&mut merged.edges_removed, &other.edges_removed);
        join_stamps(&mut merged.vertices_removed, &other.vertices_removed);
        merged
    }
}

fn join_stamps<V: Eq + Hash + Clone>(
    into: &mut IndexMap<V, WallClock>,
    from: &IndexMap<V, WallClock>,
) {
    for (key, stamp) in from {
        match into.get_mut(key) {
            Some(existing) => *existing = (*existing).max(*stamp),
            None => {
                into.insert(key.clone(), *stamp);
            }
        }
    }
}

fn join_edges<V: Eq + Hash + Clone>(into: &mut EdgeMap<V>, from: &EdgeMap<V>) {
    for (outer, targets) in from {
        join_stamps(into.entry(outer.clone()).or_default(), targets);
    }
}

impl<V: Eq + Hash> Default for LwwGraph<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Eq + Hash + fmt::Display> LwwGraph<V> {
    /// Two-line snapshot of the derived state: present vertices, then
    /// present edges, each in insertion order. For eyeballs and test
    /// assertions, not load-bearing.
    pub fn render(&self) -> String {
        let vertices: Vec<String> = self.vertices().map(|v| v.to_string()).collect();
        let mut out = String::new();
        if vertices.is_empty() {
            out.push_str("No vertices exist on the graph");
        } else {
            out.push_str("The vertices are : ");
            out.push_str(&vertices.join(", "));
        }
        out.push('\n');
        let edges: Vec<String> = self
            .edges()
            .map(|(from, to)| format!("{from} -> {to}"))
            .collect();
        if edges.is_empty() {
            out.push_str("No edges exist on the graph");
        } else {
            out.push_str("The edges are : ");
            out.push_str(&edges.join(", "));
        }
        out
    }
}

impl<V: Eq + Hash + fmt::Display> fmt::Display for LwwGraph<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
