use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use serde_json::Value;

use super::*;
use crate::constants::REMOTE_JOB_USER_EXCEPTION;
use crate::Error;
use crate::NodeConfiguration;
use crate::ScenarioError;

/// Runs jobs in place, the way a remote node would, and records them
#[derive(Default)]
struct InPlaceCompute {
    executed: Mutex<Vec<ComputeJob>>,
}

#[async_trait]
impl ComputeApi for InPlaceCompute {
    async fn execute(
        &self,
        job: ComputeJob,
    ) -> std::result::Result<Value, ComputeError> {
        self.executed.lock().push(job.clone());
        job.execute("remote-0").map_err(ComputeError::remote_user_exception)
    }
}

/// Compute whose jobs never throw
struct SwallowingCompute;

#[async_trait]
impl ComputeApi for SwallowingCompute {
    async fn execute(
        &self,
        _job: ComputeJob,
    ) -> std::result::Result<Value, ComputeError> {
        Ok(Value::Null)
    }
}

fn thrown(kind: ExceptionKind) -> UserException {
    let mut e = UserException::new(kind, "Message from Exception", 127, Some("Details from Exception".into()));
    e.stack_trace.push("JobClosure.apply(remote-0)".into());
    e
}

fn expected(kind: ExceptionKind) -> UserException {
    UserException::new(kind, "Message from Exception", 127, Some("Details from Exception".into()))
}

fn wrap(
    cause: ComputeError,
    times: usize,
) -> ComputeError {
    (0..times).fold(cause, |cause, _| ComputeError::RemoteJob {
        message: format!("{REMOTE_JOB_USER_EXCEPTION}: nested"),
        cause: Box::new(cause),
    })
}

#[test]
fn externalizable_should_satisfy_serializable_expectation() {
    assert!(ExceptionKind::Externalizable.is_instance_of(ExceptionKind::Serializable));
    assert!(ExceptionKind::Serializable.is_instance_of(ExceptionKind::Serializable));
    assert!(!ExceptionKind::Serializable.is_instance_of(ExceptionKind::Externalizable));
}

#[test]
fn marshalling_should_preserve_both_exception_kinds() {
    for kind in [ExceptionKind::Serializable, ExceptionKind::Externalizable] {
        let original = thrown(kind);
        let restored = UserException::unmarshal(&original.marshal().unwrap()).unwrap();
        assert_eq!(restored, original);
    }

    assert!(matches!(
        UserException::unmarshal(b"not json"),
        Err(ComputeError::Marshalling(_))
    ));
}

#[test]
fn cause_for_remote_job_should_strip_marked_wrappers() {
    let err = ComputeError::remote_user_exception(thrown(ExceptionKind::Serializable));
    assert!(err.to_string().starts_with(REMOTE_JOB_USER_EXCEPTION));
    assert!(matches!(err.cause_for_remote_job(), ComputeError::User(_)));

    let nested = wrap(ComputeError::User(thrown(ExceptionKind::Serializable)), 3);
    assert!(matches!(nested.cause_for_remote_job(), ComputeError::User(_)));

    let unmarked = ComputeError::RemoteJob {
        message: "Remote job failed".into(),
        cause: Box::new(ComputeError::EmptyClusterGroup),
    };
    assert!(matches!(unmarked.cause_for_remote_job(), ComputeError::RemoteJob { .. }));
}

#[test]
fn cause_for_remote_job_should_stop_at_depth_limit() {
    let deep = wrap(ComputeError::User(thrown(ExceptionKind::Serializable)), 11);

    assert!(matches!(deep.cause_for_remote_job(), ComputeError::RemoteJob { .. }));
}

#[test]
fn assert_throws_should_accept_matching_exception() {
    for kind in [ExceptionKind::Serializable, ExceptionKind::Externalizable] {
        let result = Err(ComputeError::remote_user_exception(thrown(kind)));
        assert_eq!(assert_throws(result, &expected(kind)), Ok(()));
    }
}

#[test]
fn assert_throws_should_report_each_mismatch() {
    let expected = expected(ExceptionKind::Externalizable);

    let cases: Vec<(std::result::Result<Value, ComputeError>, ExceptionMismatch)> = vec![
        (Ok(json!(null)), ExceptionMismatch::NotThrown),
        (
            Err(ComputeError::EmptyClusterGroup),
            ExceptionMismatch::UnexpectedException("Cluster group is empty".into()),
        ),
        (
            Err(ComputeError::User(thrown(ExceptionKind::Serializable))),
            ExceptionMismatch::UnexpectedException("Message from Exception".into()),
        ),
        (
            Err(ComputeError::User(UserException {
                message: "other".into(),
                ..thrown(ExceptionKind::Externalizable)
            })),
            ExceptionMismatch::Message,
        ),
        (
            Err(ComputeError::User(UserException {
                code: 1,
                ..thrown(ExceptionKind::Externalizable)
            })),
            ExceptionMismatch::Code,
        ),
        (
            Err(ComputeError::User(UserException {
                details: None,
                ..thrown(ExceptionKind::Externalizable)
            })),
            ExceptionMismatch::Details,
        ),
        (
            Err(ComputeError::User(UserException {
                stack_trace: vec![],
                ..thrown(ExceptionKind::Externalizable)
            })),
            ExceptionMismatch::NoStackTrace,
        ),
    ];

    for (result, mismatch) in cases {
        assert_eq!(assert_throws(result, &expected), Err(mismatch));
    }
}

#[test]
fn mismatch_should_keep_assertion_messages() {
    assert_eq!(ExceptionMismatch::NotThrown.to_string(), "Exception has not been thrown.");
    assert_eq!(
        ExceptionMismatch::UnexpectedException("Cluster group is empty".into()).to_string(),
        "Unexpected exception has been thrown: Cluster group is empty"
    );
    assert_eq!(ExceptionMismatch::NoStackTrace.to_string(), "Exception has no stacktrace.");
}

#[test]
fn jobs_should_apply_closure_by_kind() {
    let echo = JobClosure::Echo;

    assert_eq!(ComputeJob::run(echo.clone(), "x").execute("n").unwrap(), Value::Null);
    assert_eq!(ComputeJob::call(echo.clone(), "x").execute("n").unwrap(), Value::Null);
    assert_eq!(ComputeJob::apply(echo, "x").execute("n").unwrap(), json!("x"));

    let err = ComputeJob::apply(JobClosure::throwing(ExceptionKind::Serializable, "boom", 3), "arg")
        .execute("n")
        .unwrap_err();
    assert_eq!(err.details.as_deref(), Some("arg"));
    assert_eq!(err.stack_trace, vec!["JobClosure.apply(n)".to_string()]);
}

#[tokio::test]
async fn application_should_check_every_job_kind() {
    let compute = Arc::new(InPlaceCompute::default());
    let (ctx, state) = AppContext::new("client", NodeConfiguration::default(), compute.clone());

    ExceptionGenerationApplication.run(&ctx, json!({})).await.unwrap();

    assert_eq!(*state.borrow(), AppState::Finished);
    let executed = compute.executed.lock();
    assert_eq!(executed.len(), 6);
    for job_kind in [JobKind::Run, JobKind::Call, JobKind::Apply] {
        assert_eq!(executed.iter().filter(|j| j.kind == job_kind).count(), 2);
    }
    assert!(executed.iter().all(|j| j.arg == "Details from Exception"));
    assert_eq!(
        executed[0],
        ComputeJob::run(
            JobClosure::throwing(ExceptionKind::Serializable, "Message from Exception", 127),
            "Details from Exception"
        )
    );
    assert_eq!(executed[5].name(), "apply");
}

#[tokio::test]
async fn application_should_fail_when_job_does_not_throw() {
    let (ctx, state) = AppContext::new("client", NodeConfiguration::default(), Arc::new(SwallowingCompute));

    let result = ExceptionGenerationApplication.run(&ctx, json!({})).await;

    match result {
        Err(Error::Scenario(ScenarioError::Assertion(msg))) => {
            assert_eq!(msg, "run Serializable: Exception has not been thrown.");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(*state.borrow(), AppState::Initialized);
}

#[test]
fn lookup_should_resolve_registered_entry_points() {
    let app = lookup(EXCEPTION_GENERATION_APP).unwrap();
    assert_eq!(app.entry_point(), EXCEPTION_GENERATION_APP);

    assert!(lookup("compute.DataGenerationApplication").is_none());
}
