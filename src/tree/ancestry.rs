//! Parent-chain analysis over the flat document list.
//!
//! The remote store does not guarantee the `parentPath` relation is a forest. Nodes
//! whose chain never reaches the anchor (missing parent, or a loop) are marked so the
//! tree can leave them out of listings.

use crate::model::Document;
use crate::types::ROOT_ANCHOR;
use std::collections::{HashMap, HashSet};

/// Why a chain walk stopped short of the anchor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anomaly {
    /// A parent id that no known document carries
    Orphan { id: String, missing_parent: String },
    /// The walk came back to a node it already visited
    Cycle { id: String },
    /// The walk exceeded the configured depth cap
    TooDeep { id: String, max_depth: usize },
}

/// Indices of documents whose parent chain does not reach the anchor
pub(crate) fn unreachable(documents: &[Document], index: &HashMap<String, usize>) -> HashSet<usize> {
    let mut verdicts: Vec<Option<bool>> = vec![None; documents.len()];

    for start in 0..documents.len() {
        if verdicts[start].is_some() {
            continue;
        }
        let mut trail = Vec::new();
        let mut on_trail = HashSet::new();
        let mut current = start;
        let reachable = loop {
            if let Some(known) = verdicts[current] {
                break known;
            }
            if !on_trail.insert(current) {
                break false;
            }
            trail.push(current);
            let parent = &documents[current].parent_path;
            if parent == ROOT_ANCHOR {
                break true;
            }
            match index.get(parent) {
                Some(&next) => current = next,
                None => break false,
            }
        };
        for i in trail {
            verdicts[i] = Some(reachable);
        }
    }

    verdicts
        .into_iter()
        .enumerate()
        .filter_map(|(i, v)| if v == Some(true) { None } else { Some(i) })
        .collect()
}

/// Walk from `start` up to the anchor. Returns indices ordered top-down, ending at `start`.
pub(crate) fn chain_to_anchor(
    documents: &[Document],
    index: &HashMap<String, usize>,
    start: usize,
    max_depth: usize,
) -> Result<Vec<usize>, Anomaly> {
    let mut chain = vec![start];
    let mut seen = HashSet::from([start]);
    let mut current = start;

    loop {
        let doc = &documents[current];
        if doc.parent_path == ROOT_ANCHOR {
            break;
        }
        if chain.len() > max_depth {
            return Err(Anomaly::TooDeep {
                id: documents[start].id.clone(),
                max_depth,
            });
        }
        let Some(&parent) = index.get(&doc.parent_path) else {
            return Err(Anomaly::Orphan {
                id: doc.id.clone(),
                missing_parent: doc.parent_path.clone(),
            });
        };
        if !seen.insert(parent) {
            return Err(Anomaly::Cycle {
                id: documents[parent].id.clone(),
            });
        }
        chain.push(parent);
        current = parent;
    }

    chain.reverse();
    Ok(chain)
}
