//! In-memory fakes of the client traits.
//!
//! Each fake answers with a canned result and records the calls it received.

use crate::clients::{ObjectPresigner, WorkflowClient};
use crate::error::ClientError;
use crate::status::{ExecutionDescription, ExecutionStatus};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowCall {
    StartExecution {
        state_machine_arn: String,
        name: String,
        input: String,
    },
    DescribeExecution {
        execution_arn: String,
    },
    DescribeStateMachine {
        state_machine_arn: String,
    },
}

pub struct FakeWorkflow {
    start: Result<String, ClientError>,
    describe: Result<ExecutionDescription, ClientError>,
    state_machine: Result<(), ClientError>,
    calls: Mutex<Vec<WorkflowCall>>,
}

impl Default for FakeWorkflow {
    fn default() -> Self {
        Self {
            start: Ok(String::new()),
            describe: Ok(ExecutionDescription::new(ExecutionStatus::Running)),
            state_machine: Ok(()),
            calls: Mutex::new(vec![]),
        }
    }
}

impl FakeWorkflow {
    pub fn describing(description: ExecutionDescription) -> Self {
        Self::default().with_describe(Ok(description))
    }

    pub fn with_start(mut self, result: Result<String, ClientError>) -> Self {
        self.start = result;
        self
    }

    pub fn with_describe(mut self, result: Result<ExecutionDescription, ClientError>) -> Self {
        self.describe = result;
        self
    }

    pub fn with_state_machine(mut self, result: Result<(), ClientError>) -> Self {
        self.state_machine = result;
        self
    }

    pub fn calls(&self) -> Vec<WorkflowCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: WorkflowCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl WorkflowClient for FakeWorkflow {
    async fn start_execution(
        &self,
        state_machine_arn: &str,
        name: &str,
        input: &str,
    ) -> Result<String, ClientError> {
        self.record(WorkflowCall::StartExecution {
            state_machine_arn: state_machine_arn.into(),
            name: name.into(),
            input: input.into(),
        });
        self.start.clone()
    }

    async fn describe_execution(
        &self,
        execution_arn: &str,
    ) -> Result<ExecutionDescription, ClientError> {
        self.record(WorkflowCall::DescribeExecution {
            execution_arn: execution_arn.into(),
        });
        self.describe.clone()
    }

    async fn describe_state_machine(&self, state_machine_arn: &str) -> Result<(), ClientError> {
        self.record(WorkflowCall::DescribeStateMachine {
            state_machine_arn: state_machine_arn.into(),
        });
        self.state_machine.clone()
    }
}

/// Presigns by pasting bucket and key into a fake URL.
#[derive(Default)]
pub struct FakePresigner {
    fail: Option<ClientError>,
    requests: Mutex<Vec<(String, String, Duration)>>,
}

impl FakePresigner {
    pub fn failing(message: &str) -> Self {
        Self {
            fail: Some(ClientError::new(message)),
            ..Default::default()
        }
    }

    /// (bucket, key, expiry) of every presign request.
    pub fn requests(&self) -> Vec<(String, String, Duration)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectPresigner for FakePresigner {
    async fn presign_get_object(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, ClientError> {
        self.requests
            .lock()
            .unwrap()
            .push((bucket.into(), key.into(), expires_in));
        match &self.fail {
            Some(err) => Err(err.clone()),
            None => Ok(format!(
                "https://{}.s3.amazonaws.com/{}?presigned=true",
                bucket, key
            )),
        }
    }
}
