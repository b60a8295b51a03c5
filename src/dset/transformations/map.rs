use std::sync::Arc;

use crate::dset::funcs::OpFunc;
use crate::dset::node::{OpKind, PartitionData, UnaryFn};
use crate::dset::DSet;
use crate::scheduler::dag::DagError;

pub(crate) fn map_fn<F, I, O>(func: F) -> UnaryFn
where
    F: OpFunc<In = (I,), Out = O>,
    I: Clone + Send + Sync + 'static,
    O: Send + Sync + 'static,
{
    Arc::new(move |input: &PartitionData| {
        let items = input.as_slice::<I>()?;
        let out: Vec<O> = items.iter().map(|x| func.apply((x.clone(),))).collect();
        Ok(PartitionData::from_vec(out))
    })
}

impl<'a, T: Clone + Send + Sync + 'static> DSet<'a, T> {
    /// Lazily re-express every element through `func`.
    pub fn map<F, O>(&self, func: F) -> Result<DSet<'a, O>, DagError>
    where
        F: OpFunc<In = (T,), Out = O>,
        O: Clone + Send + Sync + 'static,
    {
        let kind = OpKind::Map {
            func_id: F::id(),
            func: map_fn(func),
        };
        let id = self.ctx().add_node(kind, vec![Some(self.id())])?;
        Ok(DSet::new(self.ctx(), id))
    }
}
