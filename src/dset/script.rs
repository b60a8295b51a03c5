use std::collections::BTreeMap;

use crate::contexts::Context;
use crate::dset::funcs::{FuncError, OpFunc};
use crate::dset::node::{NodeId, OpKind};
use crate::dset::transformations::TRANSFORMERS;
use crate::scheduler::dag::DagError;

// graph transport only: a plan describes a transformation subgraph by
// function id and closure bytes, never by function pointer. Sources and
// distributed operators do not travel; their data and cluster handles are
// bound where the plan is compiled.

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OpCode {
    Input,
    Map,
    Filter,
    FlatMap,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NodePlan {
    pub op: OpCode,
    pub func_id: u64,
    pub closure: Vec<u8>,
    pub deps: Vec<Option<u32>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct GraphPlan {
    pub nodes: BTreeMap<u32, NodePlan>,
}

#[derive(Debug)]
pub enum PlanError {
    UnboundInput(u32),
    UnknownDep { node: u32, dep: u32 },
    Func(FuncError),
    Build(DagError),
    Codec(String),
}

impl GraphPlan {
    pub fn new() -> GraphPlan {
        GraphPlan {
            nodes: BTreeMap::new(),
        }
    }

    fn push(&mut self, plan: NodePlan) -> u32 {
        let id = self.nodes.len() as u32;
        self.nodes.insert(id, plan);
        id
    }

    /// Declare an input slot, to be bound to an existing node at compile
    /// time.
    pub fn input(&mut self) -> u32 {
        self.push(NodePlan {
            op: OpCode::Input,
            func_id: 0,
            closure: Vec::new(),
            deps: Vec::new(),
        })
    }

    pub fn map<F: OpFunc>(&mut self, dep: u32, func: &F) -> Result<u32, PlanError> {
        self.transform(OpCode::Map, dep, F::id(), func)
    }

    pub fn filter<F: OpFunc>(&mut self, dep: u32, func: &F) -> Result<u32, PlanError> {
        self.transform(OpCode::Filter, dep, F::id(), func)
    }

    pub fn flat_map<F: OpFunc>(&mut self, dep: u32, func: &F) -> Result<u32, PlanError> {
        self.transform(OpCode::FlatMap, dep, F::id(), func)
    }

    fn transform<F: OpFunc>(
        &mut self,
        op: OpCode,
        dep: u32,
        func_id: u64,
        func: &F,
    ) -> Result<u32, PlanError> {
        if !self.nodes.contains_key(&dep) {
            return Err(PlanError::UnknownDep {
                node: self.nodes.len() as u32,
                dep,
            });
        }
        let closure = func.encode().map_err(PlanError::Func)?;
        Ok(self.push(NodePlan {
            op,
            func_id,
            closure,
            deps: vec![Some(dep)],
        }))
    }

    pub fn encode(&self) -> Result<Vec<u8>, PlanError> {
        bincode::serialize(self).map_err(|e| PlanError::Codec(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<GraphPlan, PlanError> {
        bincode::deserialize(bytes).map_err(|e| PlanError::Codec(e.to_string()))
    }

    /// Rebuild the plan's nodes inside `ctx`, resolving function ids
    /// through the transformer registry. `bindings` maps the plan's input
    /// slots to nodes that already exist in `ctx`. Returns the mapping
    /// from plan ids to arena ids.
    pub fn compile(
        &self,
        ctx: &Context,
        bindings: &BTreeMap<u32, NodeId>,
    ) -> Result<BTreeMap<u32, NodeId>, PlanError> {
        let mut built: BTreeMap<u32, NodeId> = BTreeMap::new();
        for (pid, node) in &self.nodes {
            if node.op == OpCode::Input {
                let bound = match bindings.get(pid) {
                    Some(bound) => *bound,
                    None => return Err(PlanError::UnboundInput(*pid)),
                };
                built.insert(*pid, bound);
                continue;
            }
            let ctor = match TRANSFORMERS.get(node.op, node.func_id) {
                Some(ctor) => ctor,
                None => return Err(PlanError::Func(FuncError::NotRegistered(node.func_id))),
            };
            let func = ctor(&node.closure).map_err(PlanError::Func)?;
            let mut parents = Vec::with_capacity(node.deps.len());
            for dep in &node.deps {
                match dep {
                    None => parents.push(None),
                    Some(dep) => match built.get(dep) {
                        Some(parent) => parents.push(Some(*parent)),
                        None => {
                            return Err(PlanError::UnknownDep {
                                node: *pid,
                                dep: *dep,
                            })
                        }
                    },
                }
            }
            let kind = match node.op {
                OpCode::Map => OpKind::Map {
                    func_id: node.func_id,
                    func,
                },
                OpCode::Filter => OpKind::Filter {
                    func_id: node.func_id,
                    func,
                },
                OpCode::FlatMap => OpKind::FlatMap {
                    func_id: node.func_id,
                    func,
                },
                OpCode::Input => continue,
            };
            let id = ctx.add_node(kind, parents).map_err(PlanError::Build)?;
            built.insert(*pid, id);
        }
        Ok(built)
    }
}
