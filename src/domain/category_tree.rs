//! Hierarchical category display.
//!
//! Categories are flattened depth-first into `(category, level)` pairs.
//! A parent id that does not resolve makes the category a root. Parent
//! chains that loop back are broken at the member that comes first in input
//! order, which is then treated as a root.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::warn;
use crate::domain::aggregates::Category;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FlatCategory {
    #[serde(flatten)]
    pub category: Category,
    pub level: usize,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit { Unseen, OnPath, Done }

pub fn flatten_hierarchy(categories: &[Category]) -> Vec<FlatCategory> {
    let n = categories.len();
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(n);
    for (i, c) in categories.iter().enumerate() {
        index.entry(c.id.as_str()).or_insert(i);
    }

    let mut parents: Vec<Option<usize>> = categories
        .iter()
        .enumerate()
        .map(|(i, c)| c.parent_id.as_deref().and_then(|p| index.get(p).copied()).filter(|&p| p != i))
        .collect();

    break_cycles(categories, &mut parents);

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut roots = Vec::new();
    for (i, parent) in parents.iter().enumerate() {
        match parent {
            Some(p) => children[*p].push(i),
            None => roots.push(i),
        }
    }

    let mut flat = Vec::with_capacity(n);
    let mut emitted = vec![false; n];
    let mut stack: Vec<(usize, usize)> = roots.iter().rev().map(|&r| (r, 0)).collect();
    while let Some((i, level)) = stack.pop() {
        if emitted[i] { continue; }
        emitted[i] = true;
        flat.push(FlatCategory { category: categories[i].clone(), level });
        stack.extend(children[i].iter().rev().map(|&c| (c, level + 1)));
    }
    flat
}

fn break_cycles(categories: &[Category], parents: &mut [Option<usize>]) {
    let mut state = vec![Visit::Unseen; parents.len()];
    for start in 0..parents.len() {
        let mut path: Vec<usize> = Vec::new();
        let mut cursor = Some(start);
        while let Some(i) = cursor {
            match state[i] {
                Visit::Done => break,
                Visit::OnPath => {
                    if let Some(pos) = path.iter().position(|&p| p == i) {
                        if let Some(&root) = path[pos..].iter().min() {
                            warn!(category_id = %categories[root].id, "category parent cycle detected, promoting to root");
                            parents[root] = None;
                        }
                    }
                    break;
                }
                Visit::Unseen => {
                    state[i] = Visit::OnPath;
                    path.push(i);
                    cursor = parents[i];
                }
            }
        }
        for i in path { state[i] = Visit::Done; }
    }
}

/// Whether making `parent_id` the parent of `id` would close a loop.
pub fn would_create_cycle(categories: &[Category], id: &str, parent_id: &str) -> bool {
    let by_id: HashMap<&str, Option<&str>> = categories
        .iter()
        .map(|c| (c.id.as_str(), c.parent_id.as_deref()))
        .collect();
    let mut seen = HashSet::new();
    let mut cursor = Some(parent_id);
    while let Some(current) = cursor {
        if current == id { return true; }
        if !seen.insert(current) { return false; }
        cursor = by_id.get(current).copied().flatten();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat(id: &str, parent: Option<&str>) -> Category {
        Category { id: id.into(), name: id.to_uppercase(), parent_id: parent.map(String::from) }
    }

    fn shape(flat: &[FlatCategory]) -> Vec<(&str, usize)> {
        flat.iter().map(|f| (f.category.id.as_str(), f.level)).collect()
    }

    #[test]
    fn test_flatten_depth_first() {
        let cats = vec![cat("phones", None), cat("iphone", Some("phones")), cat("used", None), cat("swap", Some("iphone")), cat("xiaomi", Some("phones"))];
        let flat = flatten_hierarchy(&cats);
        assert_eq!(shape(&flat), vec![("phones", 0), ("iphone", 1), ("swap", 2), ("xiaomi", 1), ("used", 0)]);
    }

    #[test]
    fn test_dangling_parent_becomes_root() {
        let flat = flatten_hierarchy(&[cat("a", Some("gone")), cat("b", Some("a"))]);
        assert_eq!(shape(&flat), vec![("a", 0), ("b", 1)]);
    }

    #[test]
    fn test_cycle_is_broken_without_looping() {
        let cats = vec![cat("x", None), cat("a", Some("c")), cat("b", Some("a")), cat("c", Some("b")), cat("self", Some("self"))];
        let flat = flatten_hierarchy(&cats);
        assert_eq!(flat.len(), cats.len());
        assert_eq!(shape(&flat), vec![("x", 0), ("a", 0), ("b", 1), ("c", 2), ("self", 0)]);
    }

    #[test]
    fn test_would_create_cycle() {
        let cats = vec![cat("a", None), cat("b", Some("a")), cat("c", Some("b"))];
        assert!(would_create_cycle(&cats, "a", "c"));
        assert!(would_create_cycle(&cats, "a", "a"));
        assert!(!would_create_cycle(&cats, "c", "a"));
        assert!(!would_create_cycle(&cats, "a", "missing"));
    }
}
