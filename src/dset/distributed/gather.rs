use serde::de::DeserializeOwned;
use serde::Serialize;

use super::codec;
use crate::dset::node::OpKind;
use crate::dset::DSet;
use crate::scheduler::dag::DagError;
use crate::scheduler::JobError;

impl<'a, T> DSet<'a, T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Lazily re-express this collection so that, once materialized,
    /// every host holds all elements, ordered by producing rank.
    pub fn all_gather(&self) -> Result<DSet<'a, T>, DagError> {
        let kind = OpKind::Gather {
            codec: codec::<T>(),
            net: self.ctx().cluster(),
        };
        let id = self.ctx().add_node(kind, vec![Some(self.id())])?;
        Ok(DSet::new(self.ctx(), id))
    }

    /// Action: materialize and return the full collection on this host.
    pub fn gather(&self) -> Result<Vec<T>, JobError> {
        let gathered = self.all_gather().map_err(JobError::Build)?;
        gathered.materialize()?;
        self.ctx().collect_result::<T>(gathered.id())
    }
}
