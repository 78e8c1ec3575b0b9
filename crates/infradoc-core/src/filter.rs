//! Filter engine for flattened option lists
//!
//! A node is visible when its display name contains the query
//! (case-insensitive), or when it is an ancestor of such a node. Ancestors are
//! found by walking backwards through the flattened list to the nearest node
//! of strictly smaller depth. Order is never changed.

use crate::model::{OptionId, OptionNode};
use std::collections::BTreeSet;

/// Why a node is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Name contains the query
    Match,
    /// Kept only so a matching descendant stays reachable
    Ancestor,
    Hidden,
}

impl Visibility {
    pub fn is_visible(&self) -> bool {
        !matches!(self, Visibility::Hidden)
    }
}

/// Visibility overlay over one flattened list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterResult {
    entries: Vec<(OptionId, Visibility)>,
}

impl FilterResult {
    /// Visibility per node, in list order
    pub fn entries(&self) -> &[(OptionId, Visibility)] {
        &self.entries
    }

    pub fn visibility(&self, id: &OptionId) -> Visibility {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == id)
            .map(|(_, v)| *v)
            .unwrap_or(Visibility::Hidden)
    }

    pub fn is_visible(&self, id: &OptionId) -> bool {
        self.visibility(id).is_visible()
    }

    pub fn visible_count(&self) -> usize {
        self.entries.iter().filter(|(_, v)| v.is_visible()).count()
    }

    pub fn visible_ids(&self) -> BTreeSet<OptionId> {
        self.entries
            .iter()
            .filter(|(_, v)| v.is_visible())
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn matched_ids(&self) -> BTreeSet<OptionId> {
        self.entries
            .iter()
            .filter(|(_, v)| *v == Visibility::Match)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// The nodes of `nodes` that stay visible, in their original order.
    ///
    /// `nodes` must be the list this result was computed from.
    pub fn visible_nodes<'a>(&'a self, nodes: &'a [OptionNode]) -> impl Iterator<Item = &'a OptionNode> + 'a {
        nodes
            .iter()
            .zip(self.entries.iter())
            .filter(|(_, (_, v))| v.is_visible())
            .map(|(node, _)| node)
    }
}

/// Compute the visible subset of `nodes` for `query`.
///
/// A blank query shows everything.
pub fn apply_filter(query: &str, nodes: &[OptionNode]) -> FilterResult {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return FilterResult {
            entries: nodes
                .iter()
                .map(|n| (n.id.clone(), Visibility::Match))
                .collect(),
        };
    }

    let mut marks: Vec<Visibility> = nodes
        .iter()
        .map(|n| {
            if n.display_name.to_lowercase().contains(&needle) {
                Visibility::Match
            } else {
                Visibility::Hidden
            }
        })
        .collect();

    // Matches are visited in list order, so an ancestor that is itself a
    // match has already had its own chain marked.
    for index in 0..nodes.len() {
        if marks[index] != Visibility::Match {
            continue;
        }
        let mut target = nodes[index].depth;
        let mut cursor = index;
        while target > 0 {
            let Some(parent) = (0..cursor).rev().find(|&k| nodes[k].depth < target) else {
                break;
            };
            if marks[parent].is_visible() {
                break;
            }
            marks[parent] = Visibility::Ancestor;
            target = nodes[parent].depth;
            cursor = parent;
        }
    }

    FilterResult {
        entries: nodes
            .iter()
            .zip(marks)
            .map(|(n, v)| (n.id.clone(), v))
            .collect(),
    }
}
