//! Graph metrics: centralities, cycles, communities, and global shape.
//!
//! All metrics operate on the engine's own [`DependencyGraph`] model with
//! dense node ids; petgraph supplies the strongly-connected-component and
//! union-find machinery, everything else is computed directly. Duplicate
//! edges are tolerated throughout: degree counts include them, set-based
//! metrics deduplicate internally.

use petgraph::unionfind::UnionFind;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::models::dag::{DependencyGraph, GraphEdge};

const PAGERANK_DAMPING: f64 = 0.85;
const PAGERANK_TOLERANCE: f64 = 1e-6;
const PAGERANK_MAX_ITERATIONS: usize = 100;
const EIGENVECTOR_ITERATIONS: usize = 100;
const ECCENTRICITY_SAMPLES: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeMetrics {
    pub id: u32,
    pub name: String,
    pub in_degree: usize,
    pub out_degree: usize,
    pub pagerank: f64,
    pub betweenness: f64,
    pub closeness: f64,
    pub harmonic: f64,
    pub eigenvector: f64,
    pub clustering: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSummary {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub avg_degree: f64,
    pub density: f64,
    pub components: usize,
    pub strongly_connected_components: usize,
    pub cycle_count: usize,
    pub is_cyclic: bool,
    pub diameter: usize,
    pub radius: usize,
    pub clustering_coefficient: f64,
    pub modularity: f64,
    pub community_count: usize,
    pub assortativity: f64,
    pub reciprocity: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphMetricsReport {
    pub node_metrics: Vec<NodeMetrics>,
    /// SCCs of size greater than one, as node-name lists.
    pub cycles: Vec<Vec<String>>,
    /// Union of all cycle members.
    pub cycle_nodes: Vec<String>,
    pub summary: GraphSummary,
}

pub struct GraphMetricsAnalyzer;

impl GraphMetricsAnalyzer {
    pub fn compute(graph: &DependencyGraph) -> GraphMetricsReport {
        let n = graph.node_count();
        if n == 0 {
            return GraphMetricsReport::default();
        }

        let out = graph.out_adjacency();
        let inc = graph.in_adjacency();

        let pagerank = pagerank(&out, n);
        let betweenness = betweenness(&out, n);
        let eigenvector = eigenvector(&inc, n);
        let (closeness, harmonic) = closeness_harmonic(&out, n);
        let undirected = undirected_neighbors(graph, n);
        let clustering = local_clustering(&undirected);
        let global_clustering = global_clustering(&undirected);

        let sccs = strongly_connected(graph, n);
        let cycles: Vec<Vec<String>> = sccs
            .iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| {
                scc.iter()
                    .map(|&i| graph.nodes[i].name.clone())
                    .collect()
            })
            .collect();
        let mut cycle_nodes: Vec<String> = cycles.iter().flatten().cloned().collect();
        cycle_nodes.sort();
        cycle_nodes.dedup();

        let (communities, modularity) = louvain(&undirected, n);
        let community_count = communities.iter().collect::<FxHashSet<_>>().len();
        let (diameter, radius) = diameter_radius(&out, n);

        let node_metrics = (0..n)
            .map(|i| NodeMetrics {
                id: graph.nodes[i].id,
                name: graph.nodes[i].name.clone(),
                in_degree: inc[i].len(),
                out_degree: out[i].len(),
                pagerank: pagerank[i],
                betweenness: betweenness[i],
                closeness: closeness[i],
                harmonic: harmonic[i],
                eigenvector: eigenvector[i],
                clustering: clustering[i],
            })
            .collect();

        let total_edges = graph.edge_count();
        let cycle_count = cycles.len();

        GraphMetricsReport {
            node_metrics,
            cycle_nodes,
            summary: GraphSummary {
                total_nodes: n,
                total_edges,
                avg_degree: total_edges as f64 / n as f64,
                density: if n > 1 {
                    total_edges as f64 / (n * (n - 1)) as f64
                } else {
                    0.0
                },
                components: connected_components(graph, n),
                strongly_connected_components: sccs.len(),
                cycle_count,
                is_cyclic: cycle_count > 0,
                diameter,
                radius,
                clustering_coefficient: global_clustering,
                modularity,
                community_count,
                assortativity: assortativity(graph, &undirected),
                reciprocity: reciprocity(&graph.edges),
            },
            cycles,
        }
    }

    /// Bounded view: top `max_nodes` by PageRank, surviving edges capped at
    /// `max_edges`.
    pub fn prune(graph: &DependencyGraph, max_nodes: usize, max_edges: usize) -> DependencyGraph {
        let n = graph.node_count();
        if n <= max_nodes {
            let mut pruned = graph.clone();
            pruned.edges.truncate(max_edges);
            return pruned;
        }

        let out = graph.out_adjacency();
        let ranks = pagerank(&out, n);
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| ranks[b].partial_cmp(&ranks[a]).unwrap_or(std::cmp::Ordering::Equal));
        order.truncate(max_nodes);

        let keep: FxHashSet<usize> = order.iter().copied().collect();
        let mut remap: FxHashMap<u32, u32> = FxHashMap::default();
        let mut pruned = DependencyGraph::new();
        for &i in &order {
            let node = &graph.nodes[i];
            let new_id = pruned.add_node(
                node.name.clone(),
                node.node_type,
                node.file.clone(),
                node.line,
            );
            remap.insert(node.id, new_id);
        }

        for edge in &graph.edges {
            if pruned.edge_count() >= max_edges {
                break;
            }
            if keep.contains(&(edge.from as usize)) && keep.contains(&(edge.to as usize)) {
                pruned.add_edge(remap[&edge.from], remap[&edge.to], edge.edge_type);
            }
        }

        pruned
    }
}

/// Sparse power iteration with damping 0.85. Dangling nodes distribute
/// their mass uniformly; iteration stops when the L1 delta drops below
/// tolerance or after 100 rounds.
fn pagerank(out: &[Vec<u32>], n: usize) -> Vec<f64> {
    let mut rank = vec![1.0 / n as f64; n];

    for _ in 0..PAGERANK_MAX_ITERATIONS {
        let mut next = vec![(1.0 - PAGERANK_DAMPING) / n as f64; n];

        for (i, targets) in out.iter().enumerate() {
            if targets.is_empty() {
                let share = PAGERANK_DAMPING * rank[i] / n as f64;
                for value in next.iter_mut() {
                    *value += share;
                }
            } else {
                let share = PAGERANK_DAMPING * rank[i] / targets.len() as f64;
                for &t in targets {
                    next[t as usize] += share;
                }
            }
        }

        let delta: f64 = rank
            .iter()
            .zip(&next)
            .map(|(old, new)| (old - new).abs())
            .sum();
        rank = next;
        if delta < PAGERANK_TOLERANCE {
            break;
        }
    }

    rank
}

fn bfs_distances(out: &[Vec<u32>], source: usize) -> Vec<i64> {
    let mut dist = vec![-1i64; out.len()];
    dist[source] = 0;
    let mut queue = VecDeque::from([source]);
    while let Some(u) = queue.pop_front() {
        for &v in &out[u] {
            let v = v as usize;
            if dist[v] < 0 {
                dist[v] = dist[u] + 1;
                queue.push_back(v);
            }
        }
    }
    dist
}

/// Brandes accumulation over per-source BFS, parallelized by source.
fn betweenness(out: &[Vec<u32>], n: usize) -> Vec<f64> {
    (0..n)
        .into_par_iter()
        .map(|s| brandes_from(out, s, n))
        .reduce(
            || vec![0.0; n],
            |mut acc, partial| {
                for (a, p) in acc.iter_mut().zip(partial) {
                    *a += p;
                }
                acc
            },
        )
}

fn brandes_from(out: &[Vec<u32>], s: usize, n: usize) -> Vec<f64> {
    let mut stack = Vec::new();
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut sigma = vec![0.0f64; n];
    let mut dist = vec![-1i64; n];
    let mut delta = vec![0.0f64; n];

    sigma[s] = 1.0;
    dist[s] = 0;
    let mut queue = VecDeque::from([s]);

    while let Some(u) = queue.pop_front() {
        stack.push(u);
        for &v in &out[u] {
            let v = v as usize;
            if dist[v] < 0 {
                dist[v] = dist[u] + 1;
                queue.push_back(v);
            }
            if dist[v] == dist[u] + 1 {
                sigma[v] += sigma[u];
                predecessors[v].push(u);
            }
        }
    }

    let mut scores = vec![0.0f64; n];
    while let Some(w) = stack.pop() {
        for &p in &predecessors[w] {
            delta[p] += sigma[p] / sigma[w] * (1.0 + delta[w]);
        }
        if w != s {
            scores[w] += delta[w];
        }
    }
    scores
}

fn closeness_harmonic(out: &[Vec<u32>], n: usize) -> (Vec<f64>, Vec<f64>) {
    let pairs: Vec<(f64, f64)> = (0..n)
        .into_par_iter()
        .map(|s| {
            let dist = bfs_distances(out, s);
            let mut sum = 0i64;
            let mut reached = 0usize;
            let mut harmonic = 0.0f64;
            for (i, &d) in dist.iter().enumerate() {
                if i != s && d > 0 {
                    sum += d;
                    reached += 1;
                    harmonic += 1.0 / d as f64;
                }
            }
            let closeness = if sum > 0 { reached as f64 / sum as f64 } else { 0.0 };
            (closeness, harmonic)
        })
        .collect();
    pairs.into_iter().unzip()
}

/// Power iteration over in-neighbors with L2 normalization each round.
fn eigenvector(inc: &[Vec<u32>], n: usize) -> Vec<f64> {
    let mut x = vec![1.0 / n as f64; n];

    for _ in 0..EIGENVECTOR_ITERATIONS {
        let mut next = vec![0.0f64; n];
        for (v, sources) in inc.iter().enumerate() {
            for &u in sources {
                next[v] += x[u as usize];
            }
        }
        let norm = next.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm < f64::EPSILON {
            return vec![0.0; n];
        }
        for value in next.iter_mut() {
            *value /= norm;
        }
        x = next;
    }
    x
}

fn undirected_neighbors(graph: &DependencyGraph, n: usize) -> Vec<FxHashSet<usize>> {
    let mut neighbors = vec![FxHashSet::default(); n];
    for edge in &graph.edges {
        neighbors[edge.from as usize].insert(edge.to as usize);
        neighbors[edge.to as usize].insert(edge.from as usize);
    }
    neighbors
}

fn local_clustering(neighbors: &[FxHashSet<usize>]) -> Vec<f64> {
    neighbors
        .iter()
        .map(|set| {
            let k = set.len();
            if k < 2 {
                return 0.0;
            }
            let mut links = 0usize;
            let list: Vec<usize> = set.iter().copied().collect();
            for (i, &a) in list.iter().enumerate() {
                for &b in &list[i + 1..] {
                    if neighbors[a].contains(&b) {
                        links += 1;
                    }
                }
            }
            links as f64 / (k * (k - 1) / 2) as f64
        })
        .collect()
}

fn global_clustering(neighbors: &[FxHashSet<usize>]) -> f64 {
    let mut closed = 0usize;
    let mut triplets = 0usize;
    for set in neighbors {
        let k = set.len();
        if k < 2 {
            continue;
        }
        triplets += k * (k - 1) / 2;
        let list: Vec<usize> = set.iter().copied().collect();
        for (i, &a) in list.iter().enumerate() {
            for &b in &list[i + 1..] {
                if neighbors[a].contains(&b) {
                    closed += 1;
                }
            }
        }
    }
    if triplets == 0 {
        0.0
    } else {
        closed as f64 / triplets as f64
    }
}

fn connected_components(graph: &DependencyGraph, n: usize) -> usize {
    let mut uf: UnionFind<usize> = UnionFind::new(n);
    for edge in &graph.edges {
        uf.union(edge.from as usize, edge.to as usize);
    }
    let mut roots = FxHashSet::default();
    for i in 0..n {
        roots.insert(uf.find(i));
    }
    roots.len()
}

fn strongly_connected(graph: &DependencyGraph, n: usize) -> Vec<Vec<usize>> {
    let mut pg = petgraph::graph::DiGraph::<(), ()>::new();
    let indices: Vec<_> = (0..n).map(|_| pg.add_node(())).collect();
    let mut seen = FxHashSet::default();
    for edge in &graph.edges {
        if seen.insert((edge.from, edge.to)) {
            pg.add_edge(indices[edge.from as usize], indices[edge.to as usize], ());
        }
    }
    petgraph::algo::tarjan_scc(&pg)
        .into_iter()
        .map(|scc| scc.into_iter().map(|idx| idx.index()).collect())
        .collect()
}

/// Pearson correlation of total degrees at the endpoints of each edge.
fn assortativity(graph: &DependencyGraph, neighbors: &[FxHashSet<usize>]) -> f64 {
    let m = graph.edges.len();
    if m == 0 {
        return 0.0;
    }
    let degree = |i: usize| neighbors[i].len() as f64;

    let mut sum_jk = 0.0;
    let mut sum_half = 0.0;
    let mut sum_sq = 0.0;
    for edge in &graph.edges {
        let j = degree(edge.from as usize);
        let k = degree(edge.to as usize);
        sum_jk += j * k;
        sum_half += 0.5 * (j + k);
        sum_sq += 0.5 * (j * j + k * k);
    }
    let m = m as f64;
    let numerator = sum_jk / m - (sum_half / m).powi(2);
    let denominator = sum_sq / m - (sum_half / m).powi(2);
    if denominator.abs() < f64::EPSILON {
        0.0
    } else {
        numerator / denominator
    }
}

/// Fraction of directed edges whose reverse also exists.
fn reciprocity(edges: &[GraphEdge]) -> f64 {
    let unique: FxHashSet<(u32, u32)> = edges.iter().map(|e| (e.from, e.to)).collect();
    if unique.is_empty() {
        return 0.0;
    }
    let mutual = unique
        .iter()
        .filter(|(from, to)| unique.contains(&(*to, *from)))
        .count();
    mutual as f64 / unique.len() as f64
}

/// Louvain modularity optimization on the undirected projection, resolution
/// 1.0: local moving until no gain, then community aggregation, repeated
/// until modularity stops improving.
fn louvain(neighbors: &[FxHashSet<usize>], n: usize) -> (Vec<usize>, f64) {
    // Undirected weighted adjacency; every projected edge weighs 1.
    let mut adjacency: Vec<FxHashMap<usize, f64>> = neighbors
        .iter()
        .map(|set| set.iter().map(|&v| (v, 1.0)).collect())
        .collect();
    let mut membership: Vec<usize> = (0..n).collect();

    loop {
        let (local, improved) = louvain_level(&adjacency);
        if !improved {
            break;
        }
        // Project node membership through this level's communities.
        for m in membership.iter_mut() {
            *m = local[*m];
        }
        adjacency = aggregate(&adjacency, &local);
        if adjacency.len() <= 1 {
            break;
        }
    }

    // Renumber communities densely.
    let mut dense: FxHashMap<usize, usize> = FxHashMap::default();
    for m in membership.iter_mut() {
        let next = dense.len();
        *m = *dense.entry(*m).or_insert(next);
    }

    let q = modularity(neighbors, &membership);
    (membership, q)
}

fn louvain_level(adjacency: &[FxHashMap<usize, f64>]) -> (Vec<usize>, bool) {
    let n = adjacency.len();
    let mut community: Vec<usize> = (0..n).collect();
    let degree: Vec<f64> = adjacency.iter().map(|a| a.values().sum()).collect();
    let two_m: f64 = degree.iter().sum();
    if two_m <= 0.0 {
        return (community, false);
    }
    let mut community_total = degree.clone();
    let mut improved_any = false;

    loop {
        let mut moved = false;
        for node in 0..n {
            let current = community[node];
            community_total[current] -= degree[node];

            // Weight from node into each neighboring community.
            let mut links: FxHashMap<usize, f64> = FxHashMap::default();
            for (&peer, &w) in &adjacency[node] {
                if peer != node {
                    *links.entry(community[peer]).or_insert(0.0) += w;
                }
            }

            let mut best = current;
            let mut best_gain = links.get(&current).copied().unwrap_or(0.0)
                - community_total[current] * degree[node] / two_m;
            for (&candidate, &weight) in &links {
                let gain = weight - community_total[candidate] * degree[node] / two_m;
                if gain > best_gain + f64::EPSILON {
                    best_gain = gain;
                    best = candidate;
                }
            }

            community_total[best] += degree[node];
            community[node] = best;
            if best != current {
                moved = true;
                improved_any = true;
            }
        }
        if !moved {
            break;
        }
    }

    // Renumber level communities densely.
    let mut dense: FxHashMap<usize, usize> = FxHashMap::default();
    for c in community.iter_mut() {
        let next = dense.len();
        *c = *dense.entry(*c).or_insert(next);
    }
    (community, improved_any)
}

fn aggregate(
    adjacency: &[FxHashMap<usize, f64>],
    community: &[usize],
) -> Vec<FxHashMap<usize, f64>> {
    let count = community.iter().max().map(|&m| m + 1).unwrap_or(0);
    let mut merged: Vec<FxHashMap<usize, f64>> = vec![FxHashMap::default(); count];
    for (node, links) in adjacency.iter().enumerate() {
        let cu = community[node];
        for (&peer, &w) in links {
            let cv = community[peer];
            *merged[cu].entry(cv).or_insert(0.0) += w;
        }
    }
    merged
}

fn modularity(neighbors: &[FxHashSet<usize>], membership: &[usize]) -> f64 {
    let degree: Vec<f64> = neighbors.iter().map(|s| s.len() as f64).collect();
    let two_m: f64 = degree.iter().sum();
    if two_m <= 0.0 {
        return 0.0;
    }

    // Q = sum_c [ intra_c/2m - (tot_c/2m)^2 ] over ordered pairs.
    let mut intra: FxHashMap<usize, f64> = FxHashMap::default();
    let mut tot: FxHashMap<usize, f64> = FxHashMap::default();
    for (u, set) in neighbors.iter().enumerate() {
        *tot.entry(membership[u]).or_insert(0.0) += degree[u];
        for &v in set {
            if membership[u] == membership[v] {
                *intra.entry(membership[u]).or_insert(0.0) += 1.0;
            }
        }
    }

    tot.iter()
        .map(|(community, &t)| {
            let i = intra.get(community).copied().unwrap_or(0.0);
            i / two_m - (t / two_m).powi(2)
        })
        .sum()
}

/// BFS eccentricities from up to 100 evenly spaced sources; sources that
/// reach nothing are ignored.
fn diameter_radius(out: &[Vec<u32>], n: usize) -> (usize, usize) {
    let step = (n / ECCENTRICITY_SAMPLES).max(1);
    let mut diameter = 0usize;
    let mut radius = usize::MAX;

    for s in (0..n).step_by(step) {
        let dist = bfs_distances(out, s);
        let ecc = dist.iter().filter(|&&d| d > 0).max().copied().unwrap_or(-1);
        if ecc < 0 {
            continue;
        }
        diameter = diameter.max(ecc as usize);
        radius = radius.min(ecc as usize);
    }

    if radius == usize::MAX {
        (0, 0)
    } else {
        (diameter, radius)
    }
}
