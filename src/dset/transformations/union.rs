use std::sync::Arc;

use crate::dset::node::{MergeFn, OpKind, PartitionData};
use crate::dset::DSet;
use crate::scheduler::dag::DagError;

pub(crate) fn union_fn<I: Clone + Send + Sync + 'static>() -> MergeFn {
    Arc::new(|left: &PartitionData, right: &PartitionData| {
        let mut out: Vec<I> = left.as_slice::<I>()?.to_vec();
        out.extend_from_slice(right.as_slice::<I>()?);
        Ok(PartitionData::from_vec(out))
    })
}

impl<'a, T: Clone + Send + Sync + 'static> DSet<'a, T> {
    /// Lazily concatenate two collections, left elements first. Both
    /// operands must belong to the same context.
    pub fn union(&self, other: &DSet<'a, T>) -> Result<DSet<'a, T>, DagError> {
        self.check_same_ctx(other)?;
        let kind = OpKind::Union {
            merge: union_fn::<T>(),
        };
        let id = self
            .ctx()
            .add_node(kind, vec![Some(self.id()), Some(other.id())])?;
        Ok(DSet::new(self.ctx(), id))
    }
}
