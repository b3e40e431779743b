//! Parent/child lineage and lateral-movement jumps over an event list.
//!
//! [`Lineage`] is built once per layout invocation. It interns the event list
//! into dense indices (input order, first occurrence wins on duplicate ids),
//! loads the resolvable parent links into a [`petgraph`] graph and cuts one
//! link per parent cycle so that the remaining *effective* parent relation is
//! a forest. Every later stage walks that forest.
//!
//! Two kinds of parent information are kept apart:
//!
//! - **raw** links: every `parent_id` that names an existing event, cycles
//!   included. Edges are drawn from these.
//! - **effective** links: raw links minus the cycle cuts. Levels and positions
//!   are computed from these.
//!
//! All traversals are iterative and guarded by visited sets, so malformed
//! input cannot make a query loop.

use std::collections::{HashSet, VecDeque};

use indexmap::IndexMap;
use log::{debug, trace, warn};
use petgraph::{
    Direction,
    algo::tarjan_scc,
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
};

use trailmap_core::event::Event;

/// A resolved lateral-movement jump between two events.
///
/// Both ends are dense indices into the owning [`Lineage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jump {
    source: usize,
    destination: usize,
}

impl Jump {
    /// Index of the lateral-movement event.
    pub fn source(self) -> usize {
        self.source
    }

    /// Index of the event the jump lands on.
    pub fn destination(self) -> usize {
        self.destination
    }
}

/// Read-only lineage queries over an event list.
///
/// # Examples
///
/// ```
/// use trailmap::structure::Lineage;
/// use trailmap_core::event::Event;
///
/// let events = vec![
///     Event::new("root", "2024-01-01T00:00:00"),
///     Event::new("child", "2024-01-01T00:01:00").with_parent("root"),
///     Event::new("grandchild", "2024-01-01T00:02:00").with_parent("child"),
/// ];
/// let lineage = Lineage::new(&events);
///
/// assert!(lineage.is_descendant("grandchild", "root"));
/// assert!(!lineage.is_descendant("root", "grandchild"));
/// assert_eq!(lineage.children("root").len(), 1);
/// ```
#[derive(Debug)]
pub struct Lineage<'a> {
    events: Vec<&'a Event>,
    index: IndexMap<&'a str, usize>,
    raw_parents: Vec<Option<usize>>,
    raw_children: Vec<Vec<usize>>,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
    jump_targets: Vec<bool>,
    host_links: Vec<Jump>,
    host_jumps: Vec<Jump>,
    destinations: Vec<usize>,
    is_destination: Vec<bool>,
}

impl<'a> Lineage<'a> {
    /// Builds the lineage for `events`.
    ///
    /// Never fails: dangling references are dropped, duplicate ids keep their
    /// first occurrence and parent cycles are cut at their earliest member.
    pub fn new(events: &'a [Event]) -> Self {
        let mut index = IndexMap::with_capacity(events.len());
        let mut entries = Vec::with_capacity(events.len());
        for event in events {
            if index.contains_key(event.id.as_str()) {
                warn!(event_id = event.id.as_str(); "Duplicate event id, keeping first occurrence");
                continue;
            }
            index.insert(event.id.as_str(), entries.len());
            entries.push(event);
        }

        let raw_parents: Vec<Option<usize>> = entries
            .iter()
            .map(|event| {
                let parent_id = event.parent_id.as_deref()?;
                let parent = index.get(parent_id).copied();
                if parent.is_none() {
                    debug!(
                        event_id = event.id.as_str(),
                        parent_id = parent_id;
                        "Parent not found, treating event as a root"
                    );
                }
                parent
            })
            .collect();

        let mut raw_children = vec![Vec::new(); entries.len()];
        for (child, parent) in raw_parents.iter().enumerate() {
            if let Some(parent) = parent {
                raw_children[*parent].push(child);
            }
        }

        let (parents, children) = Self::break_cycles(&entries, &raw_parents);
        let roots = (0..entries.len())
            .filter(|&idx| parents[idx].is_none())
            .collect();

        let mut lineage = Self {
            jump_targets: vec![false; entries.len()],
            is_destination: vec![false; entries.len()],
            events: entries,
            index,
            raw_parents,
            raw_children,
            parents,
            children,
            roots,
            host_links: Vec::new(),
            host_jumps: Vec::new(),
            destinations: Vec::new(),
        };
        lineage.resolve_jumps();

        debug!(
            events_count = lineage.len(),
            roots_count = lineage.roots.len(),
            host_links_count = lineage.host_links.len(),
            jumps_count = lineage.host_jumps.len(),
            destinations_count = lineage.destinations.len();
            "Lineage resolved"
        );

        lineage
    }

    /// Loads raw parent links into a graph, cuts one link per cycle and reads
    /// the effective parent and child lists back out.
    fn break_cycles(
        entries: &[&Event],
        raw_parents: &[Option<usize>],
    ) -> (Vec<Option<usize>>, Vec<Vec<usize>>) {
        let mut graph = DiGraph::<(), ()>::with_capacity(entries.len(), entries.len());
        for _ in entries {
            graph.add_node(());
        }
        for (child, parent) in raw_parents.iter().enumerate() {
            if let Some(parent) = parent {
                graph.add_edge(NodeIndex::new(*parent), NodeIndex::new(child), ());
            }
        }

        for component in tarjan_scc(&graph) {
            let Some(&entry) = component.iter().min() else {
                continue;
            };
            let is_cycle = component.len() > 1 || graph.contains_edge(entry, entry);
            if !is_cycle {
                continue;
            }

            // Every node has at most one incoming link, so removing the
            // earliest member's link opens the whole cycle.
            let incoming = graph
                .edges_directed(entry, Direction::Incoming)
                .next()
                .map(|edge| edge.id());
            if let Some(edge) = incoming {
                graph.remove_edge(edge);
            }
            debug!(
                event_id = entries[entry.index()].id.as_str(),
                cycle_len = component.len();
                "Parent cycle detected, cutting parent link"
            );
        }

        let parents = (0..entries.len())
            .map(|idx| {
                graph
                    .neighbors_directed(NodeIndex::new(idx), Direction::Incoming)
                    .next()
                    .map(NodeIndex::index)
            })
            .collect();
        let children = (0..entries.len())
            .map(|idx| {
                let mut children: Vec<usize> = graph
                    .neighbors_directed(NodeIndex::new(idx), Direction::Outgoing)
                    .map(NodeIndex::index)
                    .collect();
                children.sort_unstable();
                children
            })
            .collect();

        (parents, children)
    }

    /// Resolves host-matched jumps and `lateral_movement_target` references.
    ///
    /// Every host match is kept as a link. Only links that land outside the
    /// source's own branch become jumps that move their destination.
    fn resolve_jumps(&mut self) {
        let mut hosts: IndexMap<&'a str, usize> = IndexMap::new();
        for (idx, &event) in self.events.iter().enumerate() {
            if let Some(host) = event.host.as_deref().filter(|_| event.is_initial_access()) {
                hosts.entry(host).or_insert(idx);
            }
        }

        for source in 0..self.events.len() {
            let event = self.events[source];

            if event.is_lateral_movement() {
                if let Some(host) = event.destination_host() {
                    match hosts.get(host).copied() {
                        Some(destination) => {
                            trace!(source = event.id.as_str(), host = host; "Host link resolved");
                            let link = Jump {
                                source,
                                destination,
                            };
                            self.host_links.push(link);
                            if self.accepts_jump(source, destination) {
                                self.host_jumps.push(link);
                                self.mark_destination(destination);
                            }
                        }
                        None => {
                            debug!(
                                event_id = event.id.as_str(),
                                host = host;
                                "No Initial Access event on destination host"
                            );
                        }
                    }
                }
            }

            if let Some(target) = event.lateral_movement_target.as_deref() {
                match self.index.get(target).copied() {
                    Some(destination) if self.accepts_jump(source, destination) => {
                        self.jump_targets[destination] = true;
                        self.mark_destination(destination);
                    }
                    Some(_) => {}
                    None => {
                        debug!(
                            event_id = event.id.as_str(),
                            target = target;
                            "Lateral movement target not found, ignoring jump"
                        );
                    }
                }
            }
        }
    }

    /// A jump may not land on its own source or on one of the source's
    /// ancestors, since relocating the destination would drag the source along.
    fn accepts_jump(&self, source: usize, destination: usize) -> bool {
        let accepted = source != destination && !self.is_tree_ancestor(destination, source);
        if !accepted {
            debug!(
                source = self.events[source].id.as_str(),
                destination = self.events[destination].id.as_str();
                "Jump lands inside its own branch, ignoring"
            );
        }
        accepted
    }

    fn mark_destination(&mut self, destination: usize) {
        if !self.is_destination[destination] {
            self.is_destination[destination] = true;
            self.destinations.push(destination);
        }
    }

    fn is_tree_ancestor(&self, ancestor: usize, node: usize) -> bool {
        let mut current = self.parents[node];
        while let Some(idx) = current {
            if idx == ancestor {
                return true;
            }
            current = self.parents[idx];
        }
        false
    }

    // =========================================================================
    // Id-based queries
    // =========================================================================

    /// Events whose `parent_id` equals `id`, in input order.
    pub fn children(&self, id: &str) -> Vec<&'a Event> {
        self.index_of(id)
            .map(|idx| {
                self.raw_children[idx]
                    .iter()
                    .map(|&child| self.events[child])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Walks `parent_id` links from `id`, nearest first.
    ///
    /// Stops at a dangling link or at the first id already visited, so a
    /// parent cycle yields each of its members at most once.
    pub fn ancestors(&self, id: &str) -> Vec<&'a Event> {
        let Some(start) = self.index_of(id) else {
            return Vec::new();
        };

        let mut visited = HashSet::from([start]);
        let mut ancestors = Vec::new();
        let mut current = self.raw_parents[start];
        while let Some(idx) = current {
            if !visited.insert(idx) {
                break;
            }
            ancestors.push(self.events[idx]);
            current = self.raw_parents[idx];
        }
        ancestors
    }

    /// Events below `id` in the effective forest, breadth first.
    pub fn descendants(&self, id: &str) -> Vec<&'a Event> {
        self.index_of(id)
            .map(|idx| {
                self.subtree_with_depth(idx)
                    .into_iter()
                    .map(|(descendant, _)| self.events[descendant])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns true if `ancestor_id` appears among the ancestors of `candidate_id`.
    ///
    /// Hosts use this to forbid re-parenting an event into its own subtree.
    pub fn is_descendant(&self, candidate_id: &str, ancestor_id: &str) -> bool {
        self.ancestors(candidate_id)
            .iter()
            .any(|event| event.id == ancestor_id)
    }

    /// The effective parent of `id`, if any.
    pub fn parent(&self, id: &str) -> Option<&'a Event> {
        let idx = self.index_of(id)?;
        self.parents[idx].map(|parent| self.events[parent])
    }

    /// Events without an effective parent, in input order.
    pub fn roots(&self) -> impl Iterator<Item = &'a Event> + '_ {
        self.roots.iter().map(|&idx| self.events[idx])
    }

    // =========================================================================
    // Index-based queries used by the layout stages
    // =========================================================================

    /// Number of distinct events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The event at dense index `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len()`.
    pub fn event(&self, idx: usize) -> &'a Event {
        self.events[idx]
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Effective parent index.
    pub fn parent_index(&self, idx: usize) -> Option<usize> {
        self.parents[idx]
    }

    /// Parent index as written in the input, cycles included.
    pub fn raw_parent_index(&self, idx: usize) -> Option<usize> {
        self.raw_parents[idx]
    }

    /// Effective children, in input order.
    pub fn child_indices(&self, idx: usize) -> &[usize] {
        &self.children[idx]
    }

    pub fn root_indices(&self) -> &[usize] {
        &self.roots
    }

    /// Effective descendants of `idx` with their depth below it, breadth first.
    pub fn subtree_with_depth(&self, idx: usize) -> Vec<(usize, u32)> {
        let mut subtree = Vec::new();
        let mut visited = HashSet::from([idx]);
        let mut queue = VecDeque::from([(idx, 0u32)]);
        while let Some((current, depth)) = queue.pop_front() {
            for &child in &self.children[current] {
                if visited.insert(child) {
                    subtree.push((child, depth + 1));
                    queue.push_back((child, depth + 1));
                }
            }
        }
        subtree
    }

    /// Every index in depth-first pre-order, roots in input order.
    pub fn tree_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.len());
        let mut visited = vec![false; self.len()];
        for &root in &self.roots {
            let mut stack = vec![root];
            while let Some(idx) = stack.pop() {
                if std::mem::replace(&mut visited[idx], true) {
                    continue;
                }
                order.push(idx);
                stack.extend(self.children[idx].iter().rev());
            }
        }
        order
    }

    /// Every match of a "Destination Host" artifact to an Initial Access
    /// event's host, in source order. Lateral-movement edges are drawn from
    /// these.
    pub fn host_links(&self) -> &[Jump] {
        &self.host_links
    }

    /// Host links whose destination lies outside the source's branch, in
    /// source order. Only these move and re-level their destination.
    pub fn host_jumps(&self) -> &[Jump] {
        &self.host_jumps
    }

    /// True if some event's `lateral_movement_target` names `idx`.
    pub fn is_jump_target(&self, idx: usize) -> bool {
        self.jump_targets[idx]
    }

    /// Destinations of every accepted jump, by source order, without repeats.
    pub fn destinations(&self) -> &[usize] {
        &self.destinations
    }

    pub fn is_destination(&self, idx: usize) -> bool {
        self.is_destination[idx]
    }
}
