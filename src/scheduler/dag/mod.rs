// The scheduler is static: the graph is fully wired before any stage is
// generated, and nothing mutates a node except its own execution.

use crate::dset::node::{ExecState, NodeId, OpKind, OpNode, TaskError};
use crate::utils;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DagError {
    UnknownParent { parent: NodeId, op: &'static str },
    SourceNotMaterialized { node: NodeId },
    CrossContext { node: NodeId },
}

/// Arena of operator nodes, owned by the pipeline context. Ids are arena
/// indices; a node's parents must already be in the arena when it is
/// added, so the graph is acyclic by construction.
pub struct Dag {
    nodes: Vec<OpNode>,
}

impl Dag {
    pub fn new() -> Dag {
        Dag { nodes: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&OpNode> {
        self.nodes.get(id.0 as usize)
    }

    pub(crate) fn add_node(
        &mut self,
        kind: OpKind,
        parents: Vec<Option<NodeId>>,
    ) -> Result<NodeId, DagError> {
        for parent in parents.iter().flatten() {
            if parent.0 as usize >= self.nodes.len() {
                return Err(DagError::UnknownParent {
                    parent: *parent,
                    op: kind.name(),
                });
            }
        }
        let id = NodeId(self.nodes.len() as u32);
        let node = OpNode::new(id, kind, parents);
        debug!(
            "built {} with {} dependency slots",
            node.describe(),
            node.parents().len()
        );
        self.nodes.push(node);
        Ok(id)
    }

    /// Deterministic hash of the graph shape: kinds, function ids and
    /// parent wiring in construction order. Replicas running the same
    /// program agree on it; anything else is a configuration bug.
    pub fn fingerprint(&self) -> u64 {
        let mut hash = utils::hash_bytes(0xdab5_7a9e, b"dag");
        for node in &self.nodes {
            hash = utils::hash_bytes(hash, node.describe().as_bytes());
            for parent in node.parents() {
                let slot = match parent {
                    Some(p) => p.0 as u64 + 1,
                    None => 0,
                };
                hash = utils::hash_bytes(hash, &slot.to_le_bytes());
            }
        }
        hash
    }

    /// Execute one node, assuming its non-elided parents are already
    /// materialized. Running a `Done` node is a no-op; that is what makes
    /// re-running a stage safe.
    pub(crate) fn execute_node(&mut self, id: NodeId) -> Result<(), TaskError> {
        let index = id.0 as usize;
        let node = match self.nodes.get(index) {
            Some(node) => node,
            None => return Err(TaskError::UnknownNode(id)),
        };
        match node.state() {
            ExecState::Done => {
                debug!("{} already materialized, skipping", node.describe());
                return Ok(());
            }
            ExecState::Running => return Err(TaskError::ReentrantExecute(id)),
            ExecState::Pending => {}
        }
        let mut inputs = Vec::with_capacity(node.parents().len());
        for (slot, parent) in node.parents().iter().enumerate() {
            let parent = match parent {
                Some(parent) => *parent,
                None => {
                    debug!("{} input {} elided", node.describe(), slot);
                    continue;
                }
            };
            let parent_node = match self.nodes.get(parent.0 as usize) {
                Some(parent_node) => parent_node,
                None => return Err(TaskError::UnknownNode(parent)),
            };
            match parent_node.result() {
                Some(data) => inputs.push(data.clone()),
                None => return Err(TaskError::InputNotMaterialized { node: id, parent }),
            }
        }
        self.nodes[index].set_state(ExecState::Running);
        let outcome = self.nodes[index].kind().compute(&inputs);
        match outcome {
            Ok(data) => {
                debug!(
                    "{} materialized {} items",
                    self.nodes[index].describe(),
                    data.len()
                );
                self.nodes[index].set_result(data);
                self.nodes[index].set_state(ExecState::Done);
                Ok(())
            }
            Err(e) => {
                // the node never completed; leave it runnable for a retry
                // by a later job
                self.nodes[index].set_state(ExecState::Pending);
                Err(e)
            }
        }
    }
}

impl Default for Dag {
    fn default() -> Dag {
        Dag::new()
    }
}
