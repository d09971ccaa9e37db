// SPDX-FileCopyrightText: 2026 Armature Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin dependency resolution.
//!
//! Builds the dependency graph over a set of descriptors, rejects duplicate
//! ids, unknown dependencies, and cycles, and produces the deterministic
//! start order: topological, with ties broken by declaration order.

use std::collections::{BTreeSet, HashMap};

use armature_core::ArmatureError;

use crate::descriptor::PluginDescriptor;

/// Resolved dependency graph over a descriptor slice.
///
/// All node references are indices into the slice passed to
/// [`DependencyGraph::resolve`], which is also the declaration order.
#[derive(Debug)]
pub struct DependencyGraph {
    order: Vec<usize>,
    dependencies: Vec<Vec<usize>>,
    dependents: Vec<Vec<usize>>,
    // Position of each node in `order`, for sorting transitive sets.
    rank: Vec<usize>,
}

impl DependencyGraph {
    /// Resolve the graph, failing on duplicate ids, unknown dependencies,
    /// and cycles.
    pub fn resolve(descriptors: &[PluginDescriptor]) -> Result<Self, ArmatureError> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        for (i, descriptor) in descriptors.iter().enumerate() {
            descriptor.validate()?;
            if index.insert(descriptor.id.as_str(), i).is_some() {
                return Err(ArmatureError::DuplicatePluginId {
                    id: descriptor.id.clone(),
                });
            }
        }

        let mut dependencies = vec![Vec::new(); descriptors.len()];
        let mut dependents = vec![Vec::new(); descriptors.len()];
        for (i, descriptor) in descriptors.iter().enumerate() {
            for dep in &descriptor.requires {
                let Some(&j) = index.get(dep.as_str()) else {
                    return Err(ArmatureError::UnknownPlugin { id: dep.clone() });
                };
                dependencies[i].push(j);
                dependents[j].push(i);
            }
        }

        // Kahn's algorithm; the ready set is ordered by declaration index so
        // unrelated plugins start in declaration order.
        let mut in_degree: Vec<usize> = dependencies.iter().map(Vec::len).collect();
        let mut ready: BTreeSet<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|&(_, &deg)| deg == 0)
            .map(|(i, _)| i)
            .collect();

        let mut order = Vec::with_capacity(descriptors.len());
        while let Some(&next) = ready.iter().next() {
            ready.remove(&next);
            order.push(next);
            for &dependent in &dependents[next] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if order.len() != descriptors.len() {
            let cycle = extract_cycle(descriptors, &dependencies, &in_degree);
            return Err(ArmatureError::CyclicDependency { cycle });
        }

        let mut rank = vec![0; descriptors.len()];
        for (pos, &i) in order.iter().enumerate() {
            rank[i] = pos;
        }

        Ok(Self {
            order,
            dependencies,
            dependents,
            rank,
        })
    }

    /// Topological start order (indices in declaration-order tie-break).
    pub fn start_order(&self) -> &[usize] {
        &self.order
    }

    /// Direct dependencies of a node.
    pub fn dependencies_of(&self, node: usize) -> &[usize] {
        &self.dependencies[node]
    }

    /// Direct dependents of a node.
    pub fn dependents_of(&self, node: usize) -> &[usize] {
        &self.dependents[node]
    }

    /// All transitive dependencies of `node`, in start order.
    pub fn transitive_dependencies(&self, node: usize) -> Vec<usize> {
        let mut set = self.reachable(node, &self.dependencies);
        set.sort_by_key(|&i| self.rank[i]);
        set
    }

    /// All transitive dependents of `node`, in stop order (reverse start
    /// order), i.e. the order they must be stopped in before `node`.
    pub fn transitive_dependents(&self, node: usize) -> Vec<usize> {
        let mut set = self.reachable(node, &self.dependents);
        set.sort_by_key(|&i| std::cmp::Reverse(self.rank[i]));
        set
    }

    fn reachable(&self, node: usize, edges: &[Vec<usize>]) -> Vec<usize> {
        let mut seen = vec![false; edges.len()];
        let mut stack: Vec<usize> = edges[node].to_vec();
        let mut result = Vec::new();
        while let Some(current) = stack.pop() {
            if seen[current] {
                continue;
            }
            seen[current] = true;
            result.push(current);
            stack.extend(edges[current].iter().copied());
        }
        result
    }
}

/// Walk the unprocessed subgraph to name one dependency cycle.
///
/// Every node with remaining in-degree sits on or upstream of a cycle, so
/// following dependency edges through unprocessed nodes must revisit one.
fn extract_cycle(
    descriptors: &[PluginDescriptor],
    dependencies: &[Vec<usize>],
    in_degree: &[usize],
) -> Vec<String> {
    let start = in_degree
        .iter()
        .position(|&deg| deg > 0)
        .expect("a cycle implies an unprocessed node");

    let mut path: Vec<usize> = Vec::new();
    let mut current = start;
    loop {
        if let Some(pos) = path.iter().position(|&n| n == current) {
            return path[pos..]
                .iter()
                .map(|&n| descriptors[n].id.clone())
                .collect();
        }
        path.push(current);
        current = *dependencies[current]
            .iter()
            .find(|&&dep| in_degree[dep] > 0)
            .expect("unprocessed node must have an unprocessed dependency");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plugin(id: &str, requires: &[&str]) -> PluginDescriptor {
        let mut descriptor = PluginDescriptor::new(id);
        for dep in requires {
            descriptor = descriptor.requires(*dep);
        }
        descriptor
    }

    fn ids(descriptors: &[PluginDescriptor], order: &[usize]) -> Vec<String> {
        order.iter().map(|&i| descriptors[i].id.clone()).collect()
    }

    #[test]
    fn chain_starts_dependencies_first() {
        let descriptors = vec![
            plugin("c", &["b"]),
            plugin("b", &["a"]),
            plugin("a", &[]),
        ];
        let graph = DependencyGraph::resolve(&descriptors).unwrap();
        assert_eq!(ids(&descriptors, graph.start_order()), vec!["a", "b", "c"]);
    }

    #[test]
    fn unrelated_plugins_keep_declaration_order() {
        let descriptors = vec![
            plugin("z", &[]),
            plugin("m", &[]),
            plugin("a", &[]),
        ];
        let graph = DependencyGraph::resolve(&descriptors).unwrap();
        assert_eq!(ids(&descriptors, graph.start_order()), vec!["z", "m", "a"]);
    }

    #[test]
    fn diamond_resolves_deterministically() {
        let descriptors = vec![
            plugin("base", &[]),
            plugin("left", &["base"]),
            plugin("right", &["base"]),
            plugin("top", &["left", "right"]),
        ];
        let graph = DependencyGraph::resolve(&descriptors).unwrap();
        assert_eq!(
            ids(&descriptors, graph.start_order()),
            vec!["base", "left", "right", "top"]
        );
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let descriptors = vec![plugin("a", &[]), plugin("a", &[])];
        let err = DependencyGraph::resolve(&descriptors).unwrap_err();
        assert!(matches!(
            err,
            ArmatureError::DuplicatePluginId { ref id } if id == "a"
        ));
    }

    #[test]
    fn unknown_dependency_is_rejected() {
        let descriptors = vec![plugin("a", &["ghost"])];
        let err = DependencyGraph::resolve(&descriptors).unwrap_err();
        assert!(matches!(
            err,
            ArmatureError::UnknownPlugin { ref id } if id == "ghost"
        ));
    }

    #[test]
    fn three_cycle_names_all_members() {
        let descriptors = vec![
            plugin("a", &["b"]),
            plugin("b", &["c"]),
            plugin("c", &["a"]),
        ];
        let err = DependencyGraph::resolve(&descriptors).unwrap_err();
        let ArmatureError::CyclicDependency { cycle } = err else {
            panic!("expected CyclicDependency, got {err:?}");
        };
        let mut sorted = cycle.clone();
        sorted.sort();
        assert_eq!(sorted, vec!["a", "b", "c"]);
    }

    #[test]
    fn cycle_detection_ignores_the_acyclic_part() {
        let descriptors = vec![
            plugin("ok", &[]),
            plugin("a", &["b"]),
            plugin("b", &["a"]),
        ];
        let err = DependencyGraph::resolve(&descriptors).unwrap_err();
        let ArmatureError::CyclicDependency { cycle } = err else {
            panic!("expected CyclicDependency, got {err:?}");
        };
        assert!(!cycle.contains(&"ok".to_string()));
        assert_eq!(cycle.len(), 2);
    }

    #[test]
    fn transitive_dependencies_come_in_start_order() {
        let descriptors = vec![
            plugin("base", &[]),
            plugin("mid", &["base"]),
            plugin("top", &["mid"]),
        ];
        let graph = DependencyGraph::resolve(&descriptors).unwrap();
        assert_eq!(ids(&descriptors, &graph.transitive_dependencies(2)), vec!["base", "mid"]);
    }

    #[test]
    fn transitive_dependents_come_in_stop_order() {
        let descriptors = vec![
            plugin("base", &[]),
            plugin("mid", &["base"]),
            plugin("top", &["mid"]),
        ];
        let graph = DependencyGraph::resolve(&descriptors).unwrap();
        // To stop `base`, `top` must stop before `mid`.
        assert_eq!(ids(&descriptors, &graph.transitive_dependents(0)), vec!["top", "mid"]);
    }
}
