//! Chain partitioning
//!
//! Siblings sharing a coordinate band on one axis are regrouped into chains.
//! A band whose ends sit on the container edges becomes a chain directly;
//! otherwise chains grow transitively from the adjacency anchors the resolver
//! left behind. Chain anchors replace whatever the resolver produced for the
//! members on that axis.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::debug;

use crate::snapshot::{Axis, ContainerLayout, Flow};

use super::bias::bias;
use super::engine::ContainerPass;
use super::tolerance::touches;
use super::types::*;

/// Adjacency between chain candidates, symmetric
type AdjacencyMap = BTreeMap<usize, Vec<usize>>;

impl ContainerPass<'_> {
    pub(super) fn partition_chains(&mut self) {
        if !self.qualifies_for_chains() {
            return;
        }

        let mut signatures = HashSet::new();
        for axis in Axis::BOTH {
            let candidates: Vec<usize> = (0..self.children.len())
                .filter(|&i| self.chain_eligible(i, axis))
                .collect();
            if candidates.len() < 2 {
                continue;
            }
            let adjacency = self.adjacency_map(&candidates, axis);

            for band in self.bands(&candidates, axis) {
                if band.len() < 2 {
                    continue;
                }
                let ordered = self.sorted_along(band, axis);
                if self.is_direct_chain(&ordered, axis) {
                    self.commit_chain(ordered, axis, &mut signatures);
                    continue;
                }

                for &seed in &ordered {
                    if !self.chain_eligible(seed, axis) {
                        continue;
                    }
                    let group = grow_chain(seed, &adjacency, |m| self.chain_eligible(m, axis));
                    if group.len() < 2 {
                        continue;
                    }
                    let members = self.sorted_along(group.into_iter().collect(), axis);
                    if self.is_ordered_run(&members, axis) {
                        self.commit_chain(members, axis, &mut signatures);
                    }
                }
            }
        }
    }

    fn qualifies_for_chains(&self) -> bool {
        match self.container.layout {
            ContainerLayout::Flex | ContainerLayout::Columns | ContainerLayout::Percent => true,
            ContainerLayout::Block => {
                self.config.chains_enabled
                    && self
                        .children
                        .iter()
                        .filter(|c| c.flow == Flow::Pageflow)
                        .count()
                        >= 2
            }
        }
    }

    /// Percent and column containers pin chains to one side
    fn forces_packing(&self) -> bool {
        matches!(
            self.container.layout,
            ContainerLayout::Columns | ContainerLayout::Percent
        )
    }

    fn chain_eligible(&self, i: usize, axis: Axis) -> bool {
        let flow = match self.children[i].flow {
            Flow::Pageflow => true,
            Flow::FloatLeft | Flow::FloatRight => self.forces_packing(),
            Flow::Absolute => false,
        };
        flow && !self.nodes[i].state.get(axis).is_settled()
    }

    fn adjacency_map(&self, candidates: &[usize], axis: Axis) -> AdjacencyMap {
        let mut map = AdjacencyMap::new();
        for &i in candidates {
            for anchor in self.nodes[i].on_axis(axis) {
                if !anchor.attribute.is_adjacency() {
                    continue;
                }
                let Some(&j) = anchor.target.node_id().and_then(|id| self.index.get(id)) else {
                    continue;
                };
                if candidates.contains(&j) {
                    map.entry(i).or_default().push(j);
                    map.entry(j).or_default().push(i);
                }
            }
        }
        map
    }

    /// Groups of candidates connected by overlapping cross-axis projections
    fn bands(&self, candidates: &[usize], axis: Axis) -> Vec<Vec<usize>> {
        let mut assigned = vec![false; candidates.len()];
        let mut bands = Vec::new();
        for start in 0..candidates.len() {
            if assigned[start] {
                continue;
            }
            assigned[start] = true;
            let mut band = vec![candidates[start]];
            let mut worklist = vec![start];
            while let Some(k) = worklist.pop() {
                let rect = self.children[candidates[k]].linear();
                for other in 0..candidates.len() {
                    let other_rect = self.children[candidates[other]].linear();
                    if !assigned[other] && rect.overlaps_on(&other_rect, axis.cross()) {
                        assigned[other] = true;
                        band.push(candidates[other]);
                        worklist.push(other);
                    }
                }
            }
            band.sort_unstable();
            bands.push(band);
        }
        bands
    }

    fn sorted_along(&self, mut members: Vec<usize>, axis: Axis) -> Vec<usize> {
        members.sort_by(|&a, &b| {
            self.edge_coord(a, axis, Edge::Near)
                .total_cmp(&self.edge_coord(b, axis, Edge::Near))
                .then(a.cmp(&b))
        });
        members
    }

    /// Members follow each other along the axis without overlapping
    fn is_ordered_run(&self, members: &[usize], axis: Axis) -> bool {
        members.windows(2).all(|pair| {
            let prev_far = self.edge_coord(pair[0], axis, Edge::Far);
            let next_near = self.edge_coord(pair[1], axis, Edge::Near);
            next_near >= prev_far || touches(next_near, prev_far, self.config.edge_tolerance)
        })
    }

    /// A band spanning the container from edge to edge
    fn is_direct_chain(&self, ordered: &[usize], axis: Axis) -> bool {
        let (Some(&first), Some(&last)) = (ordered.first(), ordered.last()) else {
            return false;
        };
        self.is_ordered_run(ordered, axis)
            && self.nodes[first].has_parent_edge(axis, Edge::Near)
            && self.nodes[last].has_parent_edge(axis, Edge::Far)
            && ordered[1..ordered.len() - 1]
                .iter()
                .all(|&m| self.nodes[m].state.get(axis).is_resolved())
    }

    fn chain_distribution(&self, members: &[usize], axis: Axis) -> (ChainStyle, Option<f64>) {
        let first = members[0];
        let last = members[members.len() - 1];

        if self.forces_packing() {
            let bias = if self.children[first].flow == Flow::FloatRight {
                1.0
            } else {
                0.0
            };
            return (ChainStyle::Packed, Some(bias));
        }

        let content = self.frame.content;
        let tolerance = self.config.edge_tolerance;
        let start = self.edge_coord(first, axis, Edge::Near) - content.near(axis);
        let end = content.far(axis) - self.edge_coord(last, axis, Edge::Far);
        let near_aligned = touches(start, 0.0, tolerance);
        let far_aligned = touches(end, 0.0, tolerance);
        let max_gap = members
            .windows(2)
            .map(|pair| {
                self.edge_coord(pair[1], axis, Edge::Near)
                    - self.edge_coord(pair[0], axis, Edge::Far)
            })
            .fold(0.0, f64::max);

        if near_aligned
            && far_aligned
            && (members.len() > 2 || self.container.layout == ContainerLayout::Flex)
        {
            (ChainStyle::SpreadInside, None)
        } else if max_gap < self.config.chain_gap_threshold || near_aligned || far_aligned {
            let bias = if near_aligned {
                0.0
            } else if far_aligned {
                1.0
            } else {
                bias(start.max(0.0), end.max(0.0), self.config.accuracy)
            };
            (ChainStyle::Packed, Some(bias))
        } else {
            (ChainStyle::Spread, None)
        }
    }

    /// Rewrite the members' anchors on `axis` into a chain
    fn commit_chain(
        &mut self,
        members: Vec<usize>,
        axis: Axis,
        signatures: &mut HashSet<(Axis, Vec<String>)>,
    ) {
        let ids: Vec<String> = members.iter().map(|&m| self.children[m].id.clone()).collect();
        let mut signature = ids.clone();
        signature.sort();
        if !signatures.insert((axis, signature)) {
            return;
        }

        let (style, bias) = self.chain_distribution(&members, axis);
        for &m in &members {
            self.nodes[m].clear_axis(axis);
        }

        let first = members[0];
        let last = members[members.len() - 1];
        self.place(first, AnchorAttribute::align(axis, Edge::Near), Target::Parent, false, true);
        for pair in members.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            let next_target = Target::Node(self.children[next].id.clone());
            let prev_target = Target::Node(self.children[prev].id.clone());
            self.place(prev, AnchorAttribute::adjacent(axis, Edge::Far), next_target, false, true);
            self.place(next, AnchorAttribute::adjacent(axis, Edge::Near), prev_target, false, true);
        }
        self.place(last, AnchorAttribute::align(axis, Edge::Far), Target::Parent, false, true);

        for &m in &members {
            self.nodes[m].advance(axis, AxisState::ChainResolved);
        }
        *self.nodes[first].chain.get_mut(axis) = Some(ChainHead { style, bias });

        debug!(?axis, %style, members = ?ids, "chain committed");
        self.chains.push(Chain {
            axis,
            members: ids,
            style,
            bias,
        });
    }
}

/// Grow a chain from `seed` over the adjacency map until nothing changes
fn grow_chain(
    seed: usize,
    adjacency: &AdjacencyMap,
    available: impl Fn(usize) -> bool,
) -> BTreeSet<usize> {
    let mut members = BTreeSet::from([seed]);
    let mut worklist = vec![seed];
    while let Some(current) = worklist.pop() {
        for &next in adjacency.get(&current).into_iter().flatten() {
            if available(next) && members.insert(next) {
                worklist.push(next);
            }
        }
    }
    members
}
