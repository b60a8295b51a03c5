use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::cluster::{ClusterError, Collectives};

/// Node identity is the arena index, assigned in construction order. Since
/// every host builds the graph by running the same program, ids agree
/// across the cluster without any coordination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecState {
    Pending,
    Running,
    Done,
}

#[derive(Debug)]
pub enum TaskError {
    UnknownNode(NodeId),
    NotMaterialized(NodeId),
    InputNotMaterialized { node: NodeId, parent: NodeId },
    MissingInput { slot: usize },
    ReentrantExecute(NodeId),
    TypeMismatch { expected: &'static str },
    Codec(String),
    Net(ClusterError),
}

/// The host-local partition of a distributed collection, type-erased so
/// nodes of different element types can share one arena. The typed layer
/// casts back with `as_slice`.
pub struct PartitionData {
    items: Box<dyn Any + Send + Sync>,
    len: usize,
}

impl PartitionData {
    pub fn from_vec<T: Send + Sync + 'static>(items: Vec<T>) -> PartitionData {
        let len = items.len();
        PartitionData {
            items: Box::new(items),
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice<T: 'static>(&self) -> Result<&[T], TaskError> {
        match self.items.downcast_ref::<Vec<T>>() {
            Some(items) => Ok(items.as_slice()),
            None => Err(TaskError::TypeMismatch {
                expected: std::any::type_name::<T>(),
            }),
        }
    }
}

pub type UnaryFn = Arc<dyn Fn(&PartitionData) -> Result<PartitionData, TaskError> + Send + Sync>;
pub type MergeFn =
    Arc<dyn Fn(&PartitionData, &PartitionData) -> Result<PartitionData, TaskError> + Send + Sync>;
pub type GenFn = Arc<dyn Fn(u64, u64) -> PartitionData + Send + Sync>;

/// Element codec for collectives. Built by the typed layer, where the
/// element type is still known; the wire sees only bytes.
#[derive(Clone)]
pub struct Codec {
    pub enc: Arc<dyn Fn(&PartitionData) -> Result<Vec<u8>, TaskError> + Send + Sync>,
    pub dec: Arc<dyn Fn(&[u8]) -> Result<PartitionData, TaskError> + Send + Sync>,
    pub concat: Arc<dyn Fn(Vec<PartitionData>) -> Result<PartitionData, TaskError> + Send + Sync>,
}

/// One variant per operator kind. Pure transformations carry only their
/// partition closure; distributed operations also carry the cluster handle
/// they were constructed with.
pub enum OpKind {
    Source { data: Arc<PartitionData> },
    Checkpoint { data: Arc<PartitionData> },
    Map { func_id: u64, func: UnaryFn },
    Filter { func_id: u64, func: UnaryFn },
    FlatMap { func_id: u64, func: UnaryFn },
    Union { merge: MergeFn },
    Generate { size: u64, func_id: u64, func: GenFn, net: Arc<dyn Collectives> },
    Gather { codec: Codec, net: Arc<dyn Collectives> },
    Reduce { func_id: u64, fold: UnaryFn, codec: Codec, net: Arc<dyn Collectives> },
}

impl OpKind {
    pub fn name(&self) -> &'static str {
        match self {
            OpKind::Source { .. } => "source",
            OpKind::Checkpoint { .. } => "checkpoint",
            OpKind::Map { .. } => "map",
            OpKind::Filter { .. } => "filter",
            OpKind::FlatMap { .. } => "flat_map",
            OpKind::Union { .. } => "union",
            OpKind::Generate { .. } => "generate",
            OpKind::Gather { .. } => "all_gather",
            OpKind::Reduce { .. } => "all_reduce",
        }
    }

    pub fn func_id(&self) -> Option<u64> {
        match self {
            OpKind::Map { func_id, .. }
            | OpKind::Filter { func_id, .. }
            | OpKind::FlatMap { func_id, .. }
            | OpKind::Generate { func_id, .. }
            | OpKind::Reduce { func_id, .. } => Some(*func_id),
            _ => None,
        }
    }

    /// True for operators that move or aggregate data across hosts.
    pub fn is_distributed(&self) -> bool {
        matches!(
            self,
            OpKind::Generate { .. } | OpKind::Gather { .. } | OpKind::Reduce { .. }
        )
    }

    /// Compute this operator's partition from its materialized inputs
    /// (the non-elided parents, in parent order).
    pub(crate) fn compute(
        &self,
        inputs: &[Arc<PartitionData>],
    ) -> Result<Arc<PartitionData>, TaskError> {
        match self {
            OpKind::Source { data } | OpKind::Checkpoint { data } => Ok(data.clone()),
            OpKind::Map { func, .. } | OpKind::Filter { func, .. } | OpKind::FlatMap { func, .. } => {
                func(input(inputs, 0)?).map(Arc::new)
            }
            OpKind::Union { merge } => {
                merge(input(inputs, 0)?, input(inputs, 1)?).map(Arc::new)
            }
            OpKind::Generate { size, func, net, .. } => {
                let (lo, hi) = block_range(*size, net.rank(), net.hosts());
                Ok(Arc::new(func(lo, hi)))
            }
            OpKind::Gather { codec, net } => {
                let payload = (codec.enc)(input(inputs, 0)?)?;
                let payloads = net.all_gather(payload).map_err(TaskError::Net)?;
                let parts = payloads
                    .iter()
                    .map(|bytes| (codec.dec)(bytes))
                    .collect::<Result<Vec<_>, _>>()?;
                (codec.concat)(parts).map(Arc::new)
            }
            OpKind::Reduce { fold, codec, net, .. } => {
                // local fold first, so at most one element per host crosses
                // the wire
                let local = fold(input(inputs, 0)?)?;
                let payload = (codec.enc)(&local)?;
                let payloads = net.all_gather(payload).map_err(TaskError::Net)?;
                let parts = payloads
                    .iter()
                    .map(|bytes| (codec.dec)(bytes))
                    .collect::<Result<Vec<_>, _>>()?;
                let merged = (codec.concat)(parts)?;
                fold(&merged).map(Arc::new)
            }
        }
    }
}

fn input<'a>(inputs: &'a [Arc<PartitionData>], slot: usize) -> Result<&'a PartitionData, TaskError> {
    match inputs.get(slot) {
        Some(data) => Ok(data),
        None => Err(TaskError::MissingInput { slot }),
    }
}

/// Even block split of `[0, size)` by host rank.
fn block_range(size: u64, rank: usize, hosts: usize) -> (u64, u64) {
    let rank = rank as u64;
    let hosts = hosts as u64;
    (rank * size / hosts, (rank + 1) * size / hosts)
}

/// One operator instance in the pipeline. Parent slots are fixed at
/// construction and never change; `None` marks a dependency that was
/// intentionally elided (the upstream is already materialized and
/// detached), which the scheduler skips rather than traverses.
pub struct OpNode {
    id: NodeId,
    kind: OpKind,
    parents: Vec<Option<NodeId>>,
    state: ExecState,
    result: Option<Arc<PartitionData>>,
}

impl OpNode {
    pub(crate) fn new(id: NodeId, kind: OpKind, parents: Vec<Option<NodeId>>) -> OpNode {
        OpNode {
            id,
            kind,
            parents,
            state: ExecState::Pending,
            result: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parents(&self) -> &[Option<NodeId>] {
        &self.parents
    }

    pub fn state(&self) -> ExecState {
        self.state
    }

    pub fn result(&self) -> Option<&Arc<PartitionData>> {
        self.result.as_ref()
    }

    pub(crate) fn kind(&self) -> &OpKind {
        &self.kind
    }

    pub(crate) fn set_state(&mut self, state: ExecState) {
        self.state = state;
    }

    pub(crate) fn set_result(&mut self, data: Arc<PartitionData>) {
        self.result = Some(data);
    }

    /// Diagnostic identity: operator kind, function id if any, arena id.
    /// Never used for equality or scheduling.
    pub fn describe(&self) -> String {
        match self.kind.func_id() {
            Some(func_id) => format!("{}<{:x}>{}", self.kind.name(), func_id, self.id),
            None => format!("{}{}", self.kind.name(), self.id),
        }
    }
}
