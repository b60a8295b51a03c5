use parking_lot::{RwLock, RwLockReadGuard};
use std::sync::Arc;

use crate::cluster::{Collectives, LocalCluster};
use crate::dset::node::{ExecState, NodeId, OpKind, PartitionData, TaskError};
use crate::dset::DSet;
use crate::scheduler::dag::{Dag, DagError};
use crate::scheduler::{run_job, JobError};

/// The pipeline scope. Owns the node arena for the lifetime of the
/// pipeline — stages only ever name nodes by id — and carries the cluster
/// handle that distributed operators are constructed with.
pub struct Context {
    dag: RwLock<Dag>,
    cluster: Arc<dyn Collectives>,
}

impl Context {
    pub fn new(cluster: Arc<dyn Collectives>) -> Context {
        info!("context up on host {}/{}", cluster.rank(), cluster.hosts());
        Context {
            dag: RwLock::new(Dag::new()),
            cluster,
        }
    }

    /// Single-host context over a `LocalCluster`.
    pub fn local() -> Context {
        Context::new(Arc::new(LocalCluster::new()))
    }

    pub fn cluster(&self) -> Arc<dyn Collectives> {
        self.cluster.clone()
    }

    pub fn rank(&self) -> usize {
        self.cluster.rank()
    }

    pub fn hosts(&self) -> usize {
        self.cluster.hosts()
    }

    pub fn dag(&self) -> RwLockReadGuard<Dag> {
        self.dag.read()
    }

    pub(crate) fn add_node(
        &self,
        kind: OpKind,
        parents: Vec<Option<NodeId>>,
    ) -> Result<NodeId, DagError> {
        self.dag.write().add_node(kind, parents)
    }

    /// Wrap host-local data as a parentless source node.
    pub fn from_vec<T: Clone + Send + Sync + 'static>(
        &self,
        items: Vec<T>,
    ) -> Result<DSet<T>, DagError> {
        let data = Arc::new(PartitionData::from_vec(items));
        let id = self.add_node(OpKind::Source { data }, vec![])?;
        Ok(DSet::new(self, id))
    }

    /// Driver entry: discover the action's stage sequence and run it.
    pub fn materialize(&self, action: NodeId) -> Result<(), JobError> {
        let mut dag = self.dag.write();
        run_job(&mut dag, action)
    }

    pub fn node_state(&self, id: NodeId) -> Option<ExecState> {
        self.dag.read().get(id).map(|n| n.state())
    }

    pub(crate) fn materialized_data(&self, id: NodeId) -> Option<Arc<PartitionData>> {
        self.dag.read().get(id).and_then(|n| n.result().cloned())
    }

    /// Read a materialized node's partition back out as a typed vector.
    pub fn collect_result<T: Clone + 'static>(&self, id: NodeId) -> Result<Vec<T>, JobError> {
        let dag = self.dag.read();
        let node = match dag.get(id) {
            Some(node) => node,
            None => return Err(JobError::Result(TaskError::UnknownNode(id))),
        };
        let data = match node.result() {
            Some(data) => data,
            None => return Err(JobError::Result(TaskError::NotMaterialized(id))),
        };
        let items = data.as_slice::<T>().map_err(JobError::Result)?;
        Ok(items.to_vec())
    }

    pub fn fingerprint(&self) -> u64 {
        self.dag.read().fingerprint()
    }

    /// Check that every host built the same graph. Replicated pipelines
    /// rely on matching collective calls stage by stage; a diverging
    /// graph is a configuration bug, caught here instead of as a hang.
    pub fn verify_plan(&self) -> Result<(), JobError> {
        let local = self.fingerprint().to_le_bytes();
        let all = self
            .cluster
            .all_gather(local.to_vec())
            .map_err(JobError::Net)?;
        for (host, remote) in all.iter().enumerate() {
            if remote.as_slice() != local {
                error!(
                    "graph fingerprint diverges on host {}: {:?} != {:?}",
                    host, remote, local
                );
                return Err(JobError::PlanDiverged { host });
            }
        }
        Ok(())
    }
}
