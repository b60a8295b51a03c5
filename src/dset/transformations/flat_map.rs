use std::sync::Arc;

use crate::dset::funcs::OpFunc;
use crate::dset::node::{OpKind, PartitionData, UnaryFn};
use crate::dset::DSet;
use crate::scheduler::dag::DagError;

pub(crate) fn flat_map_fn<F, I, O>(func: F) -> UnaryFn
where
    F: OpFunc<In = (I,)>,
    F::Out: IntoIterator<Item = O>,
    I: Clone + Send + Sync + 'static,
    O: Send + Sync + 'static,
{
    Arc::new(move |input: &PartitionData| {
        let items = input.as_slice::<I>()?;
        let mut out: Vec<O> = Vec::new();
        for x in items {
            out.extend(func.apply((x.clone(),)));
        }
        Ok(PartitionData::from_vec(out))
    })
}

impl<'a, T: Clone + Send + Sync + 'static> DSet<'a, T> {
    /// Lazily expand every element into zero or more elements.
    pub fn flat_map<F, O>(&self, func: F) -> Result<DSet<'a, O>, DagError>
    where
        F: OpFunc<In = (T,)>,
        F::Out: IntoIterator<Item = O>,
        O: Clone + Send + Sync + 'static,
    {
        let kind = OpKind::FlatMap {
            func_id: F::id(),
            func: flat_map_fn(func),
        };
        let id = self.ctx().add_node(kind, vec![Some(self.id())])?;
        Ok(DSet::new(self.ctx(), id))
    }
}
