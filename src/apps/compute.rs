use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::constants::MAX_REMOTE_CAUSE_DEPTH;
use crate::constants::REMOTE_JOB_USER_EXCEPTION;

/// Marshalling flavour of a user exception.
///
/// `Externalizable` is a refinement of `Serializable`: it writes its own
/// wire form instead of the derived one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExceptionKind {
    Serializable,
    Externalizable,
}

impl ExceptionKind {
    /// Whether an exception of this kind satisfies an expectation of `expected`
    pub fn is_instance_of(
        &self,
        expected: ExceptionKind,
    ) -> bool {
        match expected {
            ExceptionKind::Serializable => true,
            ExceptionKind::Externalizable => *self == ExceptionKind::Externalizable,
        }
    }
}

/// Exception thrown by user code inside a compute job
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct UserException {
    pub kind: ExceptionKind,
    pub message: String,
    pub code: i32,
    pub details: Option<String>,
    pub stack_trace: Vec<String>,
}

/// Wire form of a user exception travelling back from a remote node
#[derive(Serialize, Deserialize)]
enum MarshalledException {
    Serializable(UserException),
    /// message, code, details, stack trace
    Externalizable(String, i32, Option<String>, Vec<String>),
}

impl UserException {
    pub fn new(
        kind: ExceptionKind,
        message: impl Into<String>,
        code: i32,
        details: Option<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            code,
            details,
            stack_trace: vec![],
        }
    }

    pub(crate) fn marshal(&self) -> Result<Vec<u8>, ComputeError> {
        let form = match self.kind {
            ExceptionKind::Serializable => MarshalledException::Serializable(self.clone()),
            ExceptionKind::Externalizable => MarshalledException::Externalizable(
                self.message.clone(),
                self.code,
                self.details.clone(),
                self.stack_trace.clone(),
            ),
        };
        serde_json::to_vec(&form).map_err(|e| ComputeError::Marshalling(e.to_string()))
    }

    pub(crate) fn unmarshal(bytes: &[u8]) -> Result<Self, ComputeError> {
        let form: MarshalledException =
            serde_json::from_slice(bytes).map_err(|e| ComputeError::Marshalling(e.to_string()))?;
        Ok(match form {
            MarshalledException::Serializable(e) => e,
            MarshalledException::Externalizable(message, code, details, stack_trace) => Self {
                kind: ExceptionKind::Externalizable,
                message,
                code,
                details,
                stack_trace,
            },
        })
    }
}

/// User code shipped to remote nodes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobClosure {
    /// Returns its argument
    #[cfg(test)]
    Echo,
    /// Throws a user exception carrying its argument as details
    Throw {
        kind: ExceptionKind,
        message: String,
        code: i32,
    },
}

impl JobClosure {
    pub fn throwing(
        kind: ExceptionKind,
        message: impl Into<String>,
        code: i32,
    ) -> Self {
        JobClosure::Throw {
            kind,
            message: message.into(),
            code,
        }
    }

    pub(crate) fn apply(
        &self,
        arg: &str,
        node_id: &str,
    ) -> Result<Value, UserException> {
        match self {
            #[cfg(test)]
            JobClosure::Echo => Ok(Value::String(arg.to_string())),
            JobClosure::Throw {
                kind,
                message,
                code,
            } => {
                let mut e = UserException::new(*kind, message.clone(), *code, Some(arg.to_string()));
                e.stack_trace.push(format!("JobClosure.apply({node_id})"));
                Err(e)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobKind {
    /// No result
    Run,
    /// Result of the closure applied to the job's fixed details
    Call,
    /// Result of the closure applied to a caller argument
    Apply,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComputeJob {
    pub kind: JobKind,
    pub closure: JobClosure,
    pub arg: String,
}

impl ComputeJob {
    pub fn run(
        closure: JobClosure,
        details: impl Into<String>,
    ) -> Self {
        Self {
            kind: JobKind::Run,
            closure,
            arg: details.into(),
        }
    }

    pub fn call(
        closure: JobClosure,
        details: impl Into<String>,
    ) -> Self {
        Self {
            kind: JobKind::Call,
            closure,
            arg: details.into(),
        }
    }

    pub fn apply(
        closure: JobClosure,
        arg: impl Into<String>,
    ) -> Self {
        Self {
            kind: JobKind::Apply,
            closure,
            arg: arg.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            JobKind::Run => "run",
            JobKind::Call => "call",
            JobKind::Apply => "apply",
        }
    }

    /// Runs the job on the node identified by `node_id`
    pub(crate) fn execute(
        &self,
        node_id: &str,
    ) -> Result<Value, UserException> {
        let result = self.closure.apply(&self.arg, node_id)?;
        match self.kind {
            JobKind::Run | JobKind::Call => Ok(Value::Null),
            JobKind::Apply => Ok(result),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ComputeError {
    /// A remote node wrapped the failure of a job it executed
    #[error("{message}")]
    RemoteJob {
        message: String,
        #[source]
        cause: Box<ComputeError>,
    },

    #[error(transparent)]
    User(#[from] UserException),

    /// No node matched the job's projection
    #[error("Cluster group is empty")]
    EmptyClusterGroup,

    #[error("Failed to deploy job {job}: {reason}")]
    Deployment { job: String, reason: String },

    #[error("Marshalling failed: {0}")]
    Marshalling(String),
}

impl ComputeError {
    pub(crate) fn remote_user_exception(user: UserException) -> Self {
        ComputeError::RemoteJob {
            message: format!(
                "{REMOTE_JOB_USER_EXCEPTION} (override or implement ComputeTask.result(..) method \
                 if you would like to have automatic failover for this exception): {}",
                user.message
            ),
            cause: Box::new(ComputeError::User(user)),
        }
    }

    /// Strips remote job wrappers, at most `MAX_REMOTE_CAUSE_DEPTH` of them
    pub fn cause_for_remote_job(&self) -> &ComputeError {
        let mut cause = self;
        let mut depth = 0;

        while let ComputeError::RemoteJob { message, cause: inner } = cause {
            if depth >= MAX_REMOTE_CAUSE_DEPTH || !message.contains(REMOTE_JOB_USER_EXCEPTION) {
                break;
            }
            cause = inner.as_ref();
            depth += 1;
        }

        cause
    }
}

/// Compute facade over a projection of cluster nodes
#[async_trait]
pub trait ComputeApi: Send + Sync {
    async fn execute(
        &self,
        job: ComputeJob,
    ) -> Result<Value, ComputeError>;
}
