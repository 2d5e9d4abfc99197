use crate::device::DeviceAuthorizationService;
use crate::entities;
use crate::errors::DeviceError;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, Set,
};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

pub const CLEANUP_EXPIRED_DEVICE_CODES: &str = "cleanup_expired_device_codes";
pub const CLEANUP_CONSUMED_DEVICE_CODES: &str = "cleanup_consumed_device_codes";

/// Names accepted by [`trigger_job_manually`].
pub fn available_jobs() -> &'static [&'static str] {
    &[CLEANUP_EXPIRED_DEVICE_CODES, CLEANUP_CONSUMED_DEVICE_CODES]
}

/// Initialize and start the job scheduler with the device code sweeps.
/// Both jobs repeat every `cleanup_interval` from the service config.
pub async fn init_scheduler(
    db: DatabaseConnection,
    service: DeviceAuthorizationService,
) -> Result<JobScheduler, DeviceError> {
    let sched = JobScheduler::new()
        .await
        .map_err(|e| DeviceError::Scheduler(format!("Failed to create job scheduler: {}", e)))?;

    let every = service.config().cleanup_interval;

    for &job_name in available_jobs() {
        let db = db.clone();
        let service = service.clone();

        let job = Job::new_repeated_async(every, move |_uuid, _l| {
            let db = db.clone();
            let service = service.clone();
            Box::pin(async move {
                info!("Running {} job", job_name);
                // Failures are logged and recorded in job_executions
                let _ = run_tracked(&db, &service, job_name).await;
            })
        })
        .map_err(|e| {
            DeviceError::Scheduler(format!("Failed to create {} job: {}", job_name, e))
        })?;

        sched
            .add(job)
            .await
            .map_err(|e| DeviceError::Scheduler(format!("Failed to add {} job: {}", job_name, e)))?;
    }

    sched
        .start()
        .await
        .map_err(|e| DeviceError::Scheduler(format!("Failed to start job scheduler: {}", e)))?;

    info!(
        "Job scheduler started with {} jobs, interval {:?}",
        available_jobs().len(),
        every
    );

    Ok(sched)
}

/// Record the start of a job execution
pub async fn start_job_execution(
    db: &DatabaseConnection,
    job_name: &str,
) -> Result<i64, DeviceError> {
    use entities::job_execution;

    let now = Utc::now().timestamp();

    let execution = job_execution::ActiveModel {
        id: NotSet,
        job_name: Set(job_name.to_string()),
        started_at: Set(now),
        completed_at: Set(None),
        success: Set(None),
        error_message: Set(None),
        records_processed: Set(None),
    };

    let result = execution
        .insert(db)
        .await
        .map_err(DeviceError::db("record job start"))?;
    Ok(result.id)
}

/// Record the completion of a job execution
pub async fn complete_job_execution(
    db: &DatabaseConnection,
    execution_id: i64,
    success: bool,
    error_message: Option<String>,
    records_processed: Option<i64>,
) -> Result<(), DeviceError> {
    use entities::job_execution::{Column, Entity};

    let now = Utc::now().timestamp();

    if let Some(execution) = Entity::find()
        .filter(Column::Id.eq(execution_id))
        .one(db)
        .await
        .map_err(DeviceError::db("find job execution"))?
    {
        let mut active: entities::job_execution::ActiveModel = execution.into_active_model();
        active.completed_at = Set(Some(now));
        active.success = Set(Some(if success { 1 } else { 0 }));
        active.error_message = Set(error_message);
        active.records_processed = Set(records_processed);
        active
            .update(db)
            .await
            .map_err(DeviceError::db("record job completion"))?;
    }

    Ok(())
}

/// Manually trigger a job by name. Returns the number of deleted records.
pub async fn trigger_job_manually(
    db: &DatabaseConnection,
    service: &DeviceAuthorizationService,
    job_name: &str,
) -> Result<u64, DeviceError> {
    let job_name = available_jobs()
        .iter()
        .copied()
        .find(|name| *name == job_name)
        .ok_or_else(|| DeviceError::UnknownJob(job_name.to_string()))?;

    info!("Manually triggering job: {}", job_name);
    run_tracked(db, service, job_name).await
}

async fn run_job(service: &DeviceAuthorizationService, job_name: &str) -> Result<u64, DeviceError> {
    match job_name {
        CLEANUP_EXPIRED_DEVICE_CODES => service.cleanup_expired().await,
        CLEANUP_CONSUMED_DEVICE_CODES => {
            service
                .cleanup_old_consumed(service.config().consumed_retention)
                .await
        }
        _ => Err(DeviceError::UnknownJob(job_name.to_string())),
    }
}

/// Run one job and record it in `job_executions`. A failure to write the
/// audit row does not stop the sweep itself.
async fn run_tracked(
    db: &DatabaseConnection,
    service: &DeviceAuthorizationService,
    job_name: &str,
) -> Result<u64, DeviceError> {
    let execution_id = match start_job_execution(db, job_name).await {
        Ok(id) => Some(id),
        Err(e) => {
            error!("Failed to record start of {}: {}", job_name, e);
            None
        }
    };

    let result = run_job(service, job_name).await;

    let audit = match (&result, execution_id) {
        (Ok(count), Some(id)) => {
            info!("Job {} removed {} device authorizations", job_name, count);
            complete_job_execution(db, id, true, None, Some(*count as i64)).await
        }
        (Err(e), Some(id)) => {
            error!("Job {} failed: {}", job_name, e);
            complete_job_execution(db, id, false, Some(e.to_string()), None).await
        }
        (Ok(count), None) => {
            info!("Job {} removed {} device authorizations", job_name, count);
            Ok(())
        }
        (Err(e), None) => {
            error!("Job {} failed: {}", job_name, e);
            Ok(())
        }
    };
    if let Err(e) = audit {
        error!("Failed to record completion of {}: {}", job_name, e);
    }

    result
}
