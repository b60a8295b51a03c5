use itertools::Itertools;

use super::dag::Dag;
use crate::dset::node::{NodeId, TaskError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    UnknownAction(NodeId),
    DependencyCycle { node: NodeId },
}

/// A schedulable unit wrapping exactly one node. Disposable and
/// single-use: `run` delegates to the node's execution and translates
/// nothing, and re-running one is the same no-op as re-executing a
/// materialized node.
#[derive(Debug)]
pub struct Stage {
    node: NodeId,
    desc: String,
}

impl Stage {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn describe(&self) -> &str {
        &self.desc
    }

    pub fn run(&self, dag: &mut Dag) -> Result<(), TaskError> {
        debug!("running stage for {}", self.desc);
        dag.execute_node(self.node)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Open,
    Closed,
}

pub struct StageBuilder;

impl StageBuilder {
    /// Discover every node the action depends on, transitively, and
    /// return one stage per node, parents strictly before children.
    ///
    /// Iterative post-order walk over explicit `(node, next slot)`
    /// frames: no recursion to blow on deep pipelines, a visited map so a
    /// shared ancestor is scheduled exactly once however many paths reach
    /// it, and the open marks double as a cycle guard. Elided (`None`)
    /// dependencies are skipped, never dereferenced. The walk expands
    /// parent slots in order, so every replica of the program discovers
    /// the identical sequence.
    pub fn discover(dag: &Dag, action: NodeId) -> Result<Vec<Stage>, ScheduleError> {
        let root = match dag.get(action) {
            Some(root) => root,
            None => return Err(ScheduleError::UnknownAction(action)),
        };
        debug!("discovering stages for {}", root.describe());

        let mut marks: Vec<Option<Visit>> = vec![None; dag.len()];
        let mut order: Vec<NodeId> = Vec::new();
        let mut work: Vec<(NodeId, usize)> = vec![(action, 0)];
        marks[action.0 as usize] = Some(Visit::Open);

        while let Some((id, slot)) = work.pop() {
            let node = match dag.get(id) {
                Some(node) => node,
                None => return Err(ScheduleError::UnknownAction(id)),
            };
            let parents = node.parents();
            if slot < parents.len() {
                work.push((id, slot + 1));
                match parents[slot] {
                    None => {
                        debug!("{} dependency {} elided, not scheduled", node.describe(), slot);
                    }
                    Some(parent) => match marks[parent.0 as usize] {
                        Some(Visit::Open) => {
                            return Err(ScheduleError::DependencyCycle { node: parent });
                        }
                        Some(Visit::Closed) => {}
                        None => {
                            marks[parent.0 as usize] = Some(Visit::Open);
                            work.push((parent, 0));
                        }
                    },
                }
            } else {
                marks[id.0 as usize] = Some(Visit::Closed);
                order.push(id);
            }
        }

        let mut stages = Vec::with_capacity(order.len());
        for id in order {
            if let Some(node) = dag.get(id) {
                stages.push(Stage {
                    node: id,
                    desc: node.describe(),
                });
            }
        }
        debug!(
            "discovered {} stages: {}",
            stages.len(),
            stages.iter().map(|s| s.describe()).join(" -> ")
        );
        Ok(stages)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dset::node::{ExecState, OpKind, PartitionData};
    use std::sync::Arc;

    fn source(dag: &mut Dag, items: Vec<u64>) -> NodeId {
        let data = Arc::new(PartitionData::from_vec(items));
        dag.add_node(OpKind::Source { data }, vec![]).unwrap()
    }

    fn identity(dag: &mut Dag, parent: NodeId) -> NodeId {
        let func: crate::dset::node::UnaryFn = Arc::new(|input: &PartitionData| {
            Ok(PartitionData::from_vec(input.as_slice::<u64>()?.to_vec()))
        });
        dag.add_node(OpKind::Map { func_id: 0, func }, vec![Some(parent)])
            .unwrap()
    }

    #[test]
    fn rerunning_one_stage_is_a_noop() {
        let mut dag = Dag::new();
        let a = source(&mut dag, vec![1, 2, 3]);
        let stages = StageBuilder::discover(&dag, a).unwrap();
        assert_eq!(stages.len(), 1);

        stages[0].run(&mut dag).unwrap();
        assert_eq!(dag.get(a).unwrap().state(), ExecState::Done);
        let first = Arc::as_ptr(dag.get(a).unwrap().result().unwrap());

        // same stage object again: the node stays done, the partition is
        // the same allocation, nothing recomputes
        stages[0].run(&mut dag).unwrap();
        assert_eq!(dag.get(a).unwrap().state(), ExecState::Done);
        assert_eq!(Arc::as_ptr(dag.get(a).unwrap().result().unwrap()), first);
    }

    #[test]
    fn running_a_stage_before_its_parent_fails() {
        let mut dag = Dag::new();
        let a = source(&mut dag, vec![1, 2, 3]);
        let b = identity(&mut dag, a);
        let stages = StageBuilder::discover(&dag, b).unwrap();

        // run the child stage without its parent
        let err = stages[1].run(&mut dag).unwrap_err();
        assert!(matches!(
            err,
            crate::dset::node::TaskError::InputNotMaterialized { .. }
        ));
        assert_eq!(dag.get(b).unwrap().state(), ExecState::Pending);
    }
}
