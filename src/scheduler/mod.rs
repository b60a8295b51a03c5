pub mod dag;
pub mod stages;

use self::dag::{Dag, DagError};
use self::stages::{ScheduleError, StageBuilder};
use crate::cluster::ClusterError;
use crate::dset::node::{NodeId, TaskError};
use crate::utils::uuid::UUID;

#[derive(Debug)]
pub enum JobError {
    Build(DagError),
    Schedule(ScheduleError),
    Stage { stage: String, cause: TaskError },
    Result(TaskError),
    Net(ClusterError),
    PlanDiverged { host: usize },
}

/// Materialize `action` and everything it depends on. Stages run strictly
/// in discovery order, one at a time; the first failure aborts the rest
/// of the sequence and surfaces unchanged.
pub fn run_job(dag: &mut Dag, action: NodeId) -> Result<(), JobError> {
    let job = UUID::rand();
    let stages = StageBuilder::discover(dag, action).map_err(JobError::Schedule)?;
    let distributed = stages
        .iter()
        .filter(|s| dag.get(s.node()).is_some_and(|n| n.kind().is_distributed()))
        .count();
    info!(
        "job {}: {} stages ({} distributed), graph fingerprint {:x}",
        job,
        stages.len(),
        distributed,
        dag.fingerprint()
    );
    for stage in &stages {
        stage.run(dag).map_err(|cause| {
            error!("job {}: stage for {} failed: {:?}", job, stage.describe(), cause);
            JobError::Stage {
                stage: stage.describe().to_owned(),
                cause,
            }
        })?;
    }
    info!("job {} complete", job);
    Ok(())
}
