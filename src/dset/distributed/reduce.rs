use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use super::codec;
use crate::dset::funcs::OpFunc;
use crate::dset::node::{OpKind, PartitionData, UnaryFn};
use crate::dset::DSet;
use crate::scheduler::dag::DagError;
use crate::scheduler::JobError;

// fold order is partition order locally, then host rank order; `func`
// should be associative for the result to be meaningful
pub(crate) fn fold_fn<F, I>(func: F) -> UnaryFn
where
    F: OpFunc<In = (I, I), Out = I>,
    I: Clone + Send + Sync + 'static,
{
    Arc::new(move |input: &PartitionData| {
        let items = input.as_slice::<I>()?;
        let mut acc: Option<I> = None;
        for x in items {
            acc = Some(match acc {
                Some(a) => func.apply((a, x.clone())),
                None => x.clone(),
            });
        }
        let out: Vec<I> = acc.into_iter().collect();
        Ok(PartitionData::from_vec(out))
    })
}

impl<'a, T> DSet<'a, T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Lazily combine the whole collection into at most one element,
    /// identical on every host: local fold, then a cross-host combine of
    /// the per-host partials.
    pub fn all_reduce<F>(&self, func: F) -> Result<DSet<'a, T>, DagError>
    where
        F: OpFunc<In = (T, T), Out = T>,
    {
        let kind = OpKind::Reduce {
            func_id: F::id(),
            fold: fold_fn(func),
            codec: codec::<T>(),
            net: self.ctx().cluster(),
        };
        let id = self.ctx().add_node(kind, vec![Some(self.id())])?;
        Ok(DSet::new(self.ctx(), id))
    }

    /// Action: materialize the combined value and return it. `None` for
    /// an empty collection.
    pub fn reduce<F>(&self, func: F) -> Result<Option<T>, JobError>
    where
        F: OpFunc<In = (T, T), Out = T>,
    {
        let reduced = self.all_reduce(func).map_err(JobError::Build)?;
        reduced.materialize()?;
        let items = self.ctx().collect_result::<T>(reduced.id())?;
        Ok(items.into_iter().next())
    }
}
