//! Dependency graph and build ordering
//!
//! Nodes are installed modules keyed by their lowercased repository URL;
//! `depends` edges point from a module to what it requires and `used_by`
//! edges point back. The graph is rebuilt every run from the manifests of
//! checked-out modules and is never persisted.
//!
//! Building a queue happens in two steps: dirtiness is first spread from
//! every dirty node to all of its transitive consumers, then the dirty set
//! is ordered with Kahn's algorithm so a node only appears after everything
//! it depends on.
//!
//! There is no lock around the graph: installs run serially and `queue`
//! takes the dirty tracker (normally the `PackageLock`) by `&mut`, so the
//! borrow checker already rules out concurrent mutation. A parallel
//! builder would need to wrap both in an `RwLock`.

use crate::error::{BossError, BossResult};
use crate::manifest::{Dependency, Package};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// Source of truth for which nodes need a rebuild
pub trait DirtyTracker {
    /// Whether the node identified by `key` must be rebuilt
    fn is_dirty(&self, key: &str) -> bool;

    /// Flag the node identified by `key` for rebuild
    fn mark_dirty(&mut self, key: &str);
}

/// A module in the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub key: String,
    pub dependency: Dependency,
}

impl Node {
    pub fn new(dependency: Dependency) -> Self {
        Self {
            key: dependency.key(),
            dependency,
        }
    }

    /// Module directory name
    pub fn name(&self) -> &str {
        self.dependency.name()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Nodes plus forward (`depends`) and reverse (`used_by`) edges
#[derive(Debug, Default, Clone)]
pub struct GraphItem {
    nodes: BTreeMap<String, Node>,
    depends: HashMap<String, Vec<String>>,
    used_by: HashMap<String, Vec<String>>,
}

impl GraphItem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph for `deps` by walking the manifests found under
    /// `modules_dir/<name>` until modules without a manifest are reached
    pub fn load(deps: &[Dependency], modules_dir: &Path) -> Self {
        let mut graph = Self::new();
        let mut pending: VecDeque<Dependency> = deps.iter().cloned().collect();
        let mut walked = BTreeSet::new();

        while let Some(dep) = pending.pop_front() {
            let key = graph.add_node(&dep);
            if !walked.insert(key) {
                continue;
            }

            let module_dir = modules_dir.join(dep.name());
            let children = match Package::load_optional(&module_dir) {
                Ok(Some(package)) => package.dependency_list(),
                Ok(None) => continue,
                Err(e) => Err(e),
            };
            let children = match children {
                Ok(children) => children,
                Err(e) => {
                    warn!("Ignoring dependencies of {}: {}", dep.name(), e);
                    continue;
                }
            };

            for child in children {
                graph.add_edge(&dep, &child);
                pending.push_back(child);
            }
        }

        debug!("Dependency graph has {} node(s)", graph.len());
        graph
    }

    /// Add a node if absent, returning its key
    pub fn add_node(&mut self, dep: &Dependency) -> String {
        let key = dep.key();
        if !self.nodes.contains_key(&key) {
            if let Some(other) = self
                .nodes
                .values()
                .find(|n| n.name().eq_ignore_ascii_case(dep.name()))
            {
                warn!(
                    "{} and {} share the module directory name '{}'",
                    other.dependency.repository,
                    dep.repository,
                    dep.name()
                );
            }
            self.nodes.insert(key.clone(), Node::new(dep.clone()));
        }
        key
    }

    /// Record that `dependent` requires `dependency`
    pub fn add_edge(&mut self, dependent: &Dependency, dependency: &Dependency) {
        let from = self.add_node(dependent);
        let to = self.add_node(dependency);

        let targets = self.depends.entry(from.clone()).or_default();
        if !targets.contains(&to) {
            targets.push(to.clone());
        }
        let consumers = self.used_by.entry(to).or_default();
        if !consumers.contains(&from) {
            consumers.push(from);
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, key: &str) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Nodes `key` depends on
    pub fn depends_on(&self, key: &str) -> &[String] {
        self.depends.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Nodes depending on `key`
    pub fn used_by(&self, key: &str) -> &[String] {
        self.used_by.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Nodes nothing else depends on
    pub fn top_level(&self) -> Vec<&Node> {
        self.nodes
            .values()
            .filter(|n| self.used_by(&n.key).is_empty())
            .collect()
    }

    /// Build order for the dirty part of the graph
    ///
    /// Starts from every node when `include_all` is set, otherwise from the
    /// nodes `tracker` reports dirty. Every transitive consumer of a node in
    /// the set joins it and is marked dirty in `tracker`. The result lists a
    /// node only after all of its dependencies in the set.
    pub fn queue<T: DirtyTracker>(
        &self,
        tracker: &mut T,
        include_all: bool,
    ) -> BossResult<Vec<Node>> {
        let mut working: BTreeSet<&str> = self
            .nodes
            .keys()
            .map(String::as_str)
            .filter(|key| include_all || tracker.is_dirty(key))
            .collect();

        let mut frontier: VecDeque<&str> = working.iter().copied().collect();
        while let Some(key) = frontier.pop_front() {
            for consumer in self.used_by(key) {
                if working.insert(consumer.as_str()) {
                    debug!("{} is dirty because it uses {}", consumer, key);
                    tracker.mark_dirty(consumer);
                    frontier.push_back(consumer.as_str());
                }
            }
        }

        let mut in_degree: BTreeMap<&str, usize> = working
            .iter()
            .map(|&key| {
                let pending = self
                    .depends_on(key)
                    .iter()
                    .filter(|dep| working.contains(dep.as_str()))
                    .count();
                (key, pending)
            })
            .collect();

        let mut ready: VecDeque<&str> = in_degree
            .iter()
            .filter(|&(_, &pending)| pending == 0)
            .map(|(&key, _)| key)
            .collect();

        let mut order = Vec::with_capacity(working.len());
        while let Some(key) = ready.pop_front() {
            in_degree.remove(key);
            if let Some(node) = self.nodes.get(key) {
                order.push(node.clone());
            }
            for consumer in self.used_by(key) {
                if let Some(pending) = in_degree.get_mut(consumer.as_str()) {
                    *pending -= 1;
                    if *pending == 0 {
                        ready.push_back(consumer.as_str());
                    }
                }
            }
        }

        if !in_degree.is_empty() {
            let cycle = in_degree.keys().map(|k| k.to_string()).collect();
            return Err(BossError::CycleDetected(cycle));
        }

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Dirty(HashSet<String>);

    impl DirtyTracker for Dirty {
        fn is_dirty(&self, key: &str) -> bool {
            self.0.contains(key)
        }

        fn mark_dirty(&mut self, key: &str) {
            self.0.insert(key.to_string());
        }
    }

    fn dep(name: &str) -> Dependency {
        Dependency::parse(&format!("github.com/test/{}", name)).unwrap()
    }

    fn key(name: &str) -> String {
        dep(name).key()
    }

    fn names(queue: &[Node]) -> Vec<&str> {
        queue.iter().map(Node::name).collect()
    }

    fn chain() -> GraphItem {
        // a -> b -> c
        let mut graph = GraphItem::new();
        graph.add_edge(&dep("a"), &dep("b"));
        graph.add_edge(&dep("b"), &dep("c"));
        graph
    }

    #[test]
    fn dirty_leaf_rebuilds_whole_chain() {
        let graph = chain();
        let mut dirty = Dirty::default();
        dirty.mark_dirty(&key("c"));

        let queue = graph.queue(&mut dirty, false).unwrap();
        assert_eq!(names(&queue), vec!["c", "b", "a"]);
        assert!(dirty.is_dirty(&key("a")));
        assert!(dirty.is_dirty(&key("b")));
    }

    #[test]
    fn clean_graph_builds_nothing() {
        let graph = chain();
        let mut dirty = Dirty::default();
        assert!(graph.queue(&mut dirty, false).unwrap().is_empty());
    }

    #[test]
    fn dirty_middle_leaves_dependencies_alone() {
        let graph = chain();
        let mut dirty = Dirty::default();
        dirty.mark_dirty(&key("b"));

        let queue = graph.queue(&mut dirty, false).unwrap();
        assert_eq!(names(&queue), vec!["b", "a"]);
        assert!(!dirty.is_dirty(&key("c")));
    }

    #[test]
    fn include_all_orders_every_node() {
        let graph = chain();
        let mut dirty = Dirty::default();
        let queue = graph.queue(&mut dirty, true).unwrap();
        assert_eq!(names(&queue), vec!["c", "b", "a"]);
    }

    #[test]
    fn diamond_schedules_shared_dependency_once() {
        // app -> (x, y) -> base
        let mut graph = GraphItem::new();
        graph.add_edge(&dep("app"), &dep("x"));
        graph.add_edge(&dep("app"), &dep("y"));
        graph.add_edge(&dep("x"), &dep("base"));
        graph.add_edge(&dep("y"), &dep("base"));
        graph.add_edge(&dep("y"), &dep("base"));

        let mut dirty = Dirty::default();
        dirty.mark_dirty(&key("base"));
        let queue = graph.queue(&mut dirty, false).unwrap();

        assert_eq!(queue.len(), 4);
        assert_eq!(queue[0].name(), "base");
        assert_eq!(queue[3].name(), "app");
    }

    #[test]
    fn leaf_dirt_reaches_every_ancestor() {
        // root -> (m1 -> leaf, m2 -> m1), other independent
        let mut graph = GraphItem::new();
        graph.add_edge(&dep("root"), &dep("m1"));
        graph.add_edge(&dep("root"), &dep("m2"));
        graph.add_edge(&dep("m2"), &dep("m1"));
        graph.add_edge(&dep("m1"), &dep("leaf"));
        graph.add_node(&dep("other"));

        let mut dirty = Dirty::default();
        dirty.mark_dirty(&key("leaf"));
        let queue = graph.queue(&mut dirty, false).unwrap();

        let built: HashSet<&str> = names(&queue).into_iter().collect();
        let expected: HashSet<&str> = ["leaf", "m1", "m2", "root"].into_iter().collect();
        assert_eq!(built, expected);
        assert!(!dirty.is_dirty(&key("other")));
    }

    #[test]
    fn random_dags_respect_dependencies() {
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move || {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            seed
        };

        for _ in 0..50 {
            let size = 2 + (next() % 14) as usize;
            let mut graph = GraphItem::new();
            for i in 0..size {
                graph.add_node(&dep(&format!("n{}", i)));
            }
            // Edges only from higher to lower index keep the graph acyclic
            for from in 1..size {
                for to in 0..from {
                    if next() % 3 == 0 {
                        graph.add_edge(&dep(&format!("n{}", from)), &dep(&format!("n{}", to)));
                    }
                }
            }

            let mut dirty = Dirty::default();
            for i in 0..size {
                if next() % 4 == 0 {
                    dirty.mark_dirty(&key(&format!("n{}", i)));
                }
            }

            let queue = graph.queue(&mut dirty, next() % 2 == 0).unwrap();
            let position: HashMap<&str, usize> = queue
                .iter()
                .enumerate()
                .map(|(i, n)| (n.key.as_str(), i))
                .collect();

            for node in &queue {
                for target in graph.depends_on(&node.key) {
                    if let Some(&at) = position.get(target.as_str()) {
                        assert!(at < position[node.key.as_str()]);
                    }
                }
                for consumer in graph.used_by(&node.key) {
                    assert!(position.contains_key(consumer.as_str()));
                }
            }
        }
    }

    #[test]
    fn graph_and_lock_can_be_shared_across_threads() {
        fn shareable<T: Send + Sync>() {}
        shareable::<GraphItem>();
        shareable::<crate::lock::PackageLock>();
    }

    #[test]
    fn cycle_is_reported() {
        let mut graph = GraphItem::new();
        graph.add_edge(&dep("a"), &dep("b"));
        graph.add_edge(&dep("b"), &dep("c"));
        graph.add_edge(&dep("c"), &dep("a"));
        graph.add_edge(&dep("d"), &dep("a"));
        graph.add_node(&dep("e"));

        let mut dirty = Dirty::default();
        let err = graph.queue(&mut dirty, true).unwrap_err();
        match err {
            BossError::CycleDetected(members) => {
                assert!(members.contains(&key("a")));
                assert!(members.contains(&key("c")));
                assert!(!members.contains(&key("e")));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn load_walks_module_manifests() {
        let temp = TempDir::new().unwrap();
        let modules = temp.path();

        fs::create_dir_all(modules.join("a")).unwrap();
        fs::write(
            modules.join("a/boss.json"),
            r#"{"name":"a","dependencies":{"github.com/test/b":"^1.0.0"}}"#,
        )
        .unwrap();
        fs::create_dir_all(modules.join("b")).unwrap();
        fs::write(
            modules.join("b/boss.json"),
            r#"{"name":"b","dependencies":{"github.com/test/c":"^1.0.0"}}"#,
        )
        .unwrap();
        // c has no manifest: leaf
        fs::create_dir_all(modules.join("c")).unwrap();

        let graph = GraphItem::load(&[dep("a")], modules);
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.depends_on(&key("a")), &[key("b")]);
        assert_eq!(graph.used_by(&key("c")), &[key("b")]);
        assert_eq!(
            graph.top_level().iter().map(|n| n.name()).collect::<Vec<_>>(),
            vec!["a"]
        );
    }

    #[test]
    fn load_treats_broken_manifest_as_leaf() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("a")).unwrap();
        fs::write(temp.path().join("a/boss.json"), "not json").unwrap();

        let graph = GraphItem::load(&[dep("a")], temp.path());
        assert_eq!(graph.len(), 1);
        assert!(graph.depends_on(&key("a")).is_empty());
    }
}
