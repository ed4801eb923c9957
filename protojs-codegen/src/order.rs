//! Ordering of files combined into one output.
//!
//! Files in one dependency cycle form an atomic block. Blocks are emitted
//! dependencies first; among blocks that are ready at the same time, the one
//! whose earliest member comes first in the input wins.

use crate::error::CodegenError;
use protojs_schema::{SchemaSet, strongly_connected_components};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// File names of one atomic block, sorted by name.
pub type OrderedBlock = Vec<String>;

/// Dependency edges between requested files: `edges[f]` holds the requested
/// files `f` depends on.
///
/// Edges are followed transitively through files that were not requested,
/// so a requested file reaches every requested file it imports indirectly.
#[must_use]
pub fn file_dependency_edges(set: &SchemaSet, requested: &[&str]) -> BTreeMap<String, BTreeSet<String>> {
    let wanted: BTreeSet<&str> = requested.iter().copied().collect();
    let mut edges = BTreeMap::new();
    for &name in requested {
        let mut reached = BTreeSet::new();
        let mut visited = BTreeSet::new();
        let mut pending: Vec<&str> = set
            .file(name)
            .map(|f| f.dependencies.iter().map(String::as_str).collect())
            .unwrap_or_default();
        while let Some(dep) = pending.pop() {
            if !visited.insert(dep) {
                continue;
            }
            if wanted.contains(dep) {
                if dep != name {
                    reached.insert(dep.to_string());
                }
                continue;
            }
            if let Some(file) = set.file(dep) {
                pending.extend(file.dependencies.iter().map(String::as_str));
            }
        }
        edges.insert(name.to_string(), reached);
    }
    edges
}

/// Groups files into strongly-connected components of the edge graph.
#[must_use]
pub fn dependency_groups(files: &[String], edges: &BTreeMap<String, BTreeSet<String>>) -> Vec<OrderedBlock> {
    let index: HashMap<&str, usize> = files
        .iter()
        .enumerate()
        .map(|(i, f)| (f.as_str(), i))
        .collect();
    let adjacency: Vec<Vec<usize>> = files
        .iter()
        .map(|f| {
            edges
                .get(f)
                .map(|deps| deps.iter().filter_map(|d| index.get(d.as_str()).copied()).collect())
                .unwrap_or_default()
        })
        .collect();
    strongly_connected_components(&adjacency)
        .into_iter()
        .map(|component| component.into_iter().map(|i| files[i].clone()).collect())
        .collect()
}

/// Orders `files` into blocks.
///
/// # Arguments
/// * `files` - File names in input order
/// * `edges` - Dependency edges between the files
/// * `groups` - Partition of `files` into dependency cycles
///
/// # Errors
/// Returns `CodegenError::Internal` when `groups` is not a partition of
/// `files`, an edge names an unknown file, or the groups depend on each other
/// cyclically.
pub fn order_units(
    files: &[String],
    edges: &BTreeMap<String, BTreeSet<String>>,
    groups: &[Vec<String>],
) -> Result<Vec<OrderedBlock>, CodegenError> {
    let position: HashMap<&str, usize> = files
        .iter()
        .enumerate()
        .map(|(i, f)| (f.as_str(), i))
        .collect();

    let mut group_of: HashMap<&str, usize> = HashMap::new();
    for (g, group) in groups.iter().enumerate() {
        for member in group {
            if !position.contains_key(member.as_str()) {
                return Err(CodegenError::internal(format!(
                    "group member '{member}' is not an input file"
                )));
            }
            if group_of.insert(member.as_str(), g).is_some() {
                return Err(CodegenError::internal(format!(
                    "file '{member}' appears in more than one group"
                )));
            }
        }
    }
    if let Some(missing) = files.iter().find(|f| !group_of.contains_key(f.as_str())) {
        return Err(CodegenError::internal(format!(
            "file '{missing}' belongs to no group"
        )));
    }

    let mut depends_on: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); groups.len()];
    for (file, deps) in edges {
        let Some(&from) = group_of.get(file.as_str()) else {
            return Err(CodegenError::internal(format!(
                "dependency edge from unknown file '{file}'"
            )));
        };
        for dep in deps {
            let Some(&to) = group_of.get(dep.as_str()) else {
                return Err(CodegenError::internal(format!(
                    "dependency edge to unknown file '{dep}'"
                )));
            };
            if from != to {
                depends_on[from].insert(to);
            }
        }
    }

    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); groups.len()];
    let mut pending: Vec<usize> = depends_on.iter().map(BTreeSet::len).collect();
    for (g, deps) in depends_on.iter().enumerate() {
        for &d in deps {
            dependents[d].push(g);
        }
    }
    let earliest = |g: usize| {
        groups[g]
            .iter()
            .filter_map(|m| position.get(m.as_str()).copied())
            .min()
            .unwrap_or(usize::MAX)
    };

    let mut ready: BTreeSet<(usize, usize)> = (0..groups.len())
        .filter(|&g| pending[g] == 0)
        .map(|g| (earliest(g), g))
        .collect();
    let mut ordered = Vec::with_capacity(groups.len());
    while let Some((_, g)) = ready.pop_first() {
        let mut block = groups[g].clone();
        block.sort();
        ordered.push(block);
        for &dependent in &dependents[g] {
            pending[dependent] -= 1;
            if pending[dependent] == 0 {
                ready.insert((earliest(dependent), dependent));
            }
        }
    }

    if ordered.len() != groups.len() {
        return Err(CodegenError::internal(
            "file groups depend on each other cyclically",
        ));
    }
    tracing::debug!("ordered {} files into {} blocks", files.len(), ordered.len());
    Ok(ordered)
}

/// Orders the requested files of `set` for a combined output.
///
/// # Errors
/// Returns `CodegenError::Internal` on an inconsistent grouping.
pub fn order_files(set: &SchemaSet, requested: &[&str]) -> Result<Vec<OrderedBlock>, CodegenError> {
    let files: Vec<String> = requested.iter().map(|s| s.to_string()).collect();
    let edges = file_dependency_edges(set, requested);
    let groups = dependency_groups(&files, &edges);
    order_units(&files, &edges, &groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use protojs_schema::SchemaFile;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn edges(pairs: &[(&str, &[&str])]) -> BTreeMap<String, BTreeSet<String>> {
        pairs
            .iter()
            .map(|(f, deps)| (f.to_string(), deps.iter().map(|d| d.to_string()).collect()))
            .collect()
    }

    #[test]
    fn test_dependencies_first() {
        let files = names(&["a.proto", "b.proto", "c.proto"]);
        let e = edges(&[("a.proto", &["b.proto"]), ("b.proto", &["c.proto"]), ("c.proto", &[])]);
        let groups = vec![names(&["a.proto"]), names(&["b.proto"]), names(&["c.proto"])];
        let ordered = order_units(&files, &e, &groups).expect("Failed to order");
        assert_eq!(ordered, vec![names(&["c.proto"]), names(&["b.proto"]), names(&["a.proto"])]);
    }

    #[test]
    fn test_ties_follow_input_order() {
        let files = names(&["z.proto", "a.proto", "m.proto"]);
        let e = edges(&[("z.proto", &[]), ("a.proto", &[]), ("m.proto", &[])]);
        let groups = dependency_groups(&files, &e);
        let ordered = order_units(&files, &e, &groups).expect("Failed to order");
        assert_eq!(
            ordered,
            vec![names(&["z.proto"]), names(&["a.proto"]), names(&["m.proto"])]
        );
    }

    #[test]
    fn test_cycle_is_contiguous_and_sorted() {
        let files = names(&["top.proto", "y.proto", "x.proto", "base.proto"]);
        let e = edges(&[
            ("top.proto", &["x.proto"]),
            ("x.proto", &["y.proto"]),
            ("y.proto", &["x.proto", "base.proto"]),
            ("base.proto", &[]),
        ]);
        let groups = dependency_groups(&files, &e);
        let ordered = order_units(&files, &e, &groups).expect("Failed to order");
        assert_eq!(
            ordered,
            vec![
                names(&["base.proto"]),
                names(&["x.proto", "y.proto"]),
                names(&["top.proto"]),
            ]
        );
    }

    #[test]
    fn test_inconsistent_grouping_rejected() {
        let files = names(&["a.proto", "b.proto"]);
        let e = edges(&[("a.proto", &["b.proto"]), ("b.proto", &["a.proto"])]);

        let split = vec![names(&["a.proto"]), names(&["b.proto"])];
        assert!(matches!(
            order_units(&files, &e, &split),
            Err(CodegenError::Internal { .. })
        ));

        let missing = vec![names(&["a.proto"])];
        assert!(order_units(&files, &e, &missing).is_err());

        let duplicated = vec![names(&["a.proto", "b.proto"]), names(&["b.proto"])];
        assert!(order_units(&files, &e, &duplicated).is_err());
    }

    #[test]
    fn test_edges_pass_through_unrequested_files() {
        let base = SchemaFile::new("base.proto", "p");
        let mid = SchemaFile::new("mid.proto", "p").with_dependency("base.proto");
        let top = SchemaFile::new("top.proto", "p").with_dependency("mid.proto");
        let set = SchemaSet::new(vec![base, mid, top]).expect("Failed to link");

        let e = file_dependency_edges(&set, &["top.proto", "base.proto"]);
        assert_eq!(e["top.proto"], ["base.proto".to_string()].into_iter().collect());
        assert!(e["base.proto"].is_empty());

        let ordered = order_files(&set, &["top.proto", "base.proto"]).expect("Failed to order");
        assert_eq!(ordered, vec![names(&["base.proto"]), names(&["top.proto"])]);
    }
}
