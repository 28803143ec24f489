use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use super::AppContext;
use super::Application;
use super::ComputeError;
use super::ComputeJob;
use super::ExceptionKind;
use super::JobClosure;
use super::JobKind;
use super::UserException;
use crate::Result;
use crate::ScenarioError;

pub const EXCEPTION_GENERATION_APP: &str = "compute.ExceptionGenerationApplication";

const MSG: &str = "Message from Exception";
const CODE: i32 = 127;
const DETAILS: &str = "Details from Exception";

/// Generates custom exceptions on remote nodes through every compute entry
/// point (run, call, apply) and checks they reach the caller intact.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExceptionGenerationApplication;

#[async_trait]
impl Application for ExceptionGenerationApplication {
    fn entry_point(&self) -> &'static str {
        EXCEPTION_GENERATION_APP
    }

    async fn run(
        &self,
        ctx: &AppContext,
        _params: Value,
    ) -> Result<()> {
        ctx.mark_initialized();

        let compute = ctx.compute_for_remotes();
        for job_kind in [JobKind::Run, JobKind::Call, JobKind::Apply] {
            for kind in [ExceptionKind::Serializable, ExceptionKind::Externalizable] {
                let closure = JobClosure::throwing(kind, MSG, CODE);
                let job = match job_kind {
                    JobKind::Run => ComputeJob::run(closure, DETAILS),
                    JobKind::Call => ComputeJob::call(closure, DETAILS),
                    JobKind::Apply => ComputeJob::apply(closure, DETAILS),
                };
                let job_name = job.name();
                assert_throws(compute.execute(job).await, &expected_exception(kind))
                    .map_err(|e| ScenarioError::Assertion(format!("{job_name} {kind:?}: {e}")))?;
            }
        }

        info!("Exception generation finished successfully.");

        ctx.mark_finished();
        Ok(())
    }
}

/// Way in which a compute call failed to surface the expected exception
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExceptionMismatch {
    #[error("Exception has not been thrown.")]
    NotThrown,

    #[error("Unexpected exception has been thrown: {0}")]
    UnexpectedException(String),

    #[error("Unexpected message for thrown exception.")]
    Message,

    #[error("Unexpected code for thrown exception.")]
    Code,

    #[error("Unexpected details for thrown exception.")]
    Details,

    #[error("Exception has no stacktrace.")]
    NoStackTrace,
}

fn expected_exception(kind: ExceptionKind) -> UserException {
    UserException::new(kind, MSG, CODE, Some(DETAILS.to_string()))
}

/// Checks that a compute call failed with `expected`, looking through
/// remote job wrappers.
pub fn assert_throws(
    result: std::result::Result<Value, ComputeError>,
    expected: &UserException,
) -> std::result::Result<(), ExceptionMismatch> {
    let err = match result {
        Ok(_) => return Err(ExceptionMismatch::NotThrown),
        Err(e) => e,
    };

    let actual = match err.cause_for_remote_job() {
        ComputeError::User(actual) if actual.kind.is_instance_of(expected.kind) => actual,
        _ => return Err(ExceptionMismatch::UnexpectedException(err.to_string())),
    };

    if !actual.message.contains(&expected.message) {
        info!("Unexpected exception message: [msg={}]", actual.message);
        return Err(ExceptionMismatch::Message);
    }

    if actual.code != expected.code {
        info!("Unexpected exception code: [code={}]", actual.code);
        return Err(ExceptionMismatch::Code);
    }

    if let Some(details) = &expected.details {
        if !actual.details.as_deref().is_some_and(|d| d.contains(details.as_str())) {
            info!("Unexpected exception details: [details={:?}]", actual.details);
            return Err(ExceptionMismatch::Details);
        }
    }

    if actual.stack_trace.is_empty() {
        return Err(ExceptionMismatch::NoStackTrace);
    }

    Ok(())
}
