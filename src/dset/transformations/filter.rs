use std::sync::Arc;

use crate::dset::funcs::OpFunc;
use crate::dset::node::{OpKind, PartitionData, UnaryFn};
use crate::dset::DSet;
use crate::scheduler::dag::DagError;

pub(crate) fn filter_fn<F, I>(func: F) -> UnaryFn
where
    F: OpFunc<In = (I,), Out = bool>,
    I: Clone + Send + Sync + 'static,
{
    Arc::new(move |input: &PartitionData| {
        let items = input.as_slice::<I>()?;
        let out: Vec<I> = items
            .iter()
            .filter(|x| func.apply(((*x).clone(),)))
            .cloned()
            .collect();
        Ok(PartitionData::from_vec(out))
    })
}

impl<'a, T: Clone + Send + Sync + 'static> DSet<'a, T> {
    /// Lazily keep the elements `func` accepts.
    pub fn filter<F>(&self, func: F) -> Result<DSet<'a, T>, DagError>
    where
        F: OpFunc<In = (T,), Out = bool>,
    {
        let kind = OpKind::Filter {
            func_id: F::id(),
            func: filter_fn(func),
        };
        let id = self.ctx().add_node(kind, vec![Some(self.id())])?;
        Ok(DSet::new(self.ctx(), id))
    }
}
