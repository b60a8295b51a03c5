use std::sync::Arc;

use crate::contexts::Context;
use crate::dset::funcs::OpFunc;
use crate::dset::node::{GenFn, OpKind, PartitionData};
use crate::dset::DSet;
use crate::scheduler::dag::DagError;

pub(crate) fn gen_fn<F, O>(func: F) -> GenFn
where
    F: OpFunc<In = (u64,), Out = O>,
    O: Send + Sync + 'static,
{
    Arc::new(move |lo: u64, hi: u64| {
        let items: Vec<O> = (lo..hi).map(|i| func.apply((i,))).collect();
        PartitionData::from_vec(items)
    })
}

impl Context {
    /// Distributed source: conceptually `func` over `[0, size)`, with each
    /// host generating only its own block of the index range.
    pub fn generate<F, O>(&self, size: u64, func: F) -> Result<DSet<O>, DagError>
    where
        F: OpFunc<In = (u64,), Out = O>,
        O: Clone + Send + Sync + 'static,
    {
        let kind = OpKind::Generate {
            size,
            func_id: F::id(),
            func: gen_fn(func),
            net: self.cluster(),
        };
        let id = self.add_node(kind, vec![])?;
        Ok(DSet::new(self, id))
    }
}
