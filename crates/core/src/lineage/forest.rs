#![forbid(unsafe_code)]

use super::types::{Batch, BatchNode};
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ForestError {
    DuplicateId { id: String },
    SelfParent { id: String },
    UnknownParent { id: String, parent_id: String },
}

impl ForestError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::DuplicateId { .. } => "duplicate batch id",
            Self::SelfParent { .. } => "batch references itself as parent",
            Self::UnknownParent { .. } => "batch references a parent outside the set",
        }
    }
}

impl std::fmt::Display for ForestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateId { id } => write!(f, "duplicate batch id: {id}"),
            Self::SelfParent { id } => write!(f, "batch {id} references itself as parent"),
            Self::UnknownParent { id, parent_id } => {
                write!(f, "batch {id} references unknown parent {parent_id}")
            }
        }
    }
}

impl std::error::Error for ForestError {}

/// Arena-indexed view of a tenant's batches. Batches live in one flat slice;
/// parent/child relations are integer indices, so every traversal is
/// iterative and bounded by the slice length.
#[derive(Clone, Debug)]
pub struct Forest {
    batches: Vec<Batch>,
    by_id: HashMap<String, usize>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
}

impl Forest {
    /// Builds the index from a flat batch list. The list must be in the
    /// order children should keep (the store reads it sorted by
    /// `created_at_ms`, so child order is insertion order).
    pub fn build(batches: Vec<Batch>) -> Result<Self, ForestError> {
        let mut by_id = HashMap::with_capacity(batches.len());
        for (index, batch) in batches.iter().enumerate() {
            if by_id.insert(batch.id.clone(), index).is_some() {
                return Err(ForestError::DuplicateId {
                    id: batch.id.clone(),
                });
            }
        }

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); batches.len()];
        let mut roots = Vec::new();
        for (index, batch) in batches.iter().enumerate() {
            match batch.parent_id.as_deref() {
                None => roots.push(index),
                Some(parent_id) => {
                    if parent_id == batch.id {
                        return Err(ForestError::SelfParent {
                            id: batch.id.clone(),
                        });
                    }
                    let Some(&parent_index) = by_id.get(parent_id) else {
                        return Err(ForestError::UnknownParent {
                            id: batch.id.clone(),
                            parent_id: parent_id.to_string(),
                        });
                    };
                    children[parent_index].push(index);
                }
            }
        }

        Ok(Self {
            batches,
            by_id,
            children,
            roots,
        })
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Batch> {
        self.batches.get(index)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn children_of(&self, index: usize) -> &[usize] {
        self.children.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Indices of `index` and everything reachable below it, in stack order.
    pub fn descendants(&self, index: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![index];
        while let Some(current) = stack.pop() {
            out.push(current);
            for &child in self.children_of(current) {
                stack.push(child);
            }
        }
        out
    }

    /// Ancestor chain of `index` in root-to-leaf order, ending at `index`.
    /// Bounded by `MAX_TRACE_DEPTH`; `None` means the walk hit the cap,
    /// which only happens when a parent cycle corrupted the data.
    pub fn ancestry(&self, index: usize) -> Option<Vec<usize>> {
        let mut chain = Vec::new();
        let mut current = Some(index);
        while let Some(at) = current {
            if chain.len() >= super::MAX_TRACE_DEPTH {
                return None;
            }
            chain.push(at);
            current = self
                .batches
                .get(at)
                .and_then(|batch| batch.parent_id.as_deref())
                .and_then(|parent_id| self.index_of(parent_id));
        }
        chain.reverse();
        Some(chain)
    }

    /// Materializes the nested dashboard view, consuming the index. Children
    /// keep their insertion order. Iterative post-order: a node is boxed up
    /// only after all of its children are.
    pub fn into_nodes(self) -> Vec<BatchNode> {
        let Forest {
            batches,
            children,
            roots,
            ..
        } = self;

        let mut slots: Vec<Option<BatchNode>> = batches
            .into_iter()
            .map(|batch| {
                Some(BatchNode {
                    batch,
                    children: Vec::new(),
                })
            })
            .collect();

        let mut out = Vec::with_capacity(roots.len());
        for &root in &roots {
            let mut stack = vec![(root, false)];
            while let Some((index, visited)) = stack.pop() {
                if visited {
                    let kids: Vec<BatchNode> = children[index]
                        .iter()
                        .filter_map(|&child| slots[child].take())
                        .collect();
                    if let Some(node) = slots[index].as_mut() {
                        node.children = kids;
                    }
                } else {
                    stack.push((index, true));
                    for &child in children[index].iter().rev() {
                        stack.push((child, false));
                    }
                }
            }
            if let Some(node) = slots[root].take() {
                out.push(node);
            }
        }
        out
    }
}
