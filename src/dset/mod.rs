pub mod distributed;
pub mod funcs;
pub mod macros;
pub mod node;
pub mod script;
pub mod transformations;

use std::marker::PhantomData;

use self::node::{ExecState, NodeId, OpKind};
use crate::contexts::Context;
use crate::scheduler::dag::DagError;
use crate::scheduler::JobError;

/// A typed handle over one node in the pipeline's graph. Cheap to copy;
/// the context owns the node, the handle only names it. Operators append
/// new nodes and hand back new handles — nothing computes until an
/// action materializes the graph.
pub struct DSet<'a, T> {
    ctx: &'a Context,
    id: NodeId,
    marker: PhantomData<T>,
}

impl<'a, T> Clone for DSet<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T> Copy for DSet<'a, T> {}

impl<'a, T> std::fmt::Debug for DSet<'a, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DSet").field("id", &self.id).finish()
    }
}

impl<'a, T> DSet<'a, T> {
    pub(crate) fn new(ctx: &'a Context, id: NodeId) -> DSet<'a, T> {
        DSet {
            ctx,
            id,
            marker: PhantomData,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn ctx(&self) -> &'a Context {
        self.ctx
    }

    pub fn state(&self) -> Option<ExecState> {
        self.ctx.node_state(self.id)
    }

    /// Run this node's dependency closure to completion.
    pub fn materialize(&self) -> Result<(), JobError> {
        self.ctx.materialize(self.id)
    }
}

impl<'a, T: Clone + Send + Sync + 'static> DSet<'a, T> {
    /// Truncate lineage: snapshot this node's materialized partition into
    /// a new source-like node whose dependency slot is recorded as
    /// elided. The producing subtree is never rescheduled through the
    /// new node. Requires the node to be materialized already.
    pub fn checkpoint(&self) -> Result<DSet<'a, T>, DagError> {
        let data = match self.ctx.materialized_data(self.id) {
            Some(data) => data,
            None => return Err(DagError::SourceNotMaterialized { node: self.id }),
        };
        let id = self
            .ctx
            .add_node(OpKind::Checkpoint { data }, vec![None])?;
        Ok(DSet::new(self.ctx, id))
    }

    pub(crate) fn check_same_ctx(&self, other: &DSet<'a, T>) -> Result<(), DagError> {
        if std::ptr::eq(self.ctx, other.ctx) {
            Ok(())
        } else {
            Err(DagError::CrossContext { node: other.id })
        }
    }
}
