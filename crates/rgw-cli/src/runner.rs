//! Case runner
//!
//! Executes cases in file order against one client. A case that cannot be
//! executed is logged and reported; the run always continues with the next
//! case.

use crate::cases::{ObjectParam, ParamType, TestCase};
use crate::handlers::CaseOutcome;
use crate::routes::{self, Handler};
use crate::{HarnessError, Result};
use rgw_client::GatewayClient;
use tracing::{error, info};

/// Result of one case
#[derive(Debug)]
pub struct CaseReport {
    /// Position in the case file, starting at 0
    pub index: usize,
    pub func_name: String,
    pub result: Result<CaseOutcome>,
}

impl CaseReport {
    pub fn is_failure(&self) -> bool {
        self.result.is_err()
    }
}

/// Run a single case
pub async fn run_case(client: &GatewayClient, case: &TestCase) -> Result<CaseOutcome> {
    let operation = routes::lookup(&case.func_name)
        .ok_or_else(|| HarnessError::UnknownOperation(case.func_name.clone()))?;
    let param_type = case.param_type()?;
    let headers = case.headers()?;

    match (operation.handler, param_type) {
        (Handler::Text(handler), ParamType::Text) => {
            let arg = case.para.as_str().ok_or_else(|| mismatch(case, ParamType::Text))?;
            handler(client, arg, &headers).await
        }
        (Handler::Object(handler), ParamType::Object) => {
            let param: ObjectParam =
                serde_json::from_value(case.para.clone()).map_err(|_| mismatch(case, ParamType::Object))?;
            handler(client, param, &headers).await
        }
        (handler, _) => Err(mismatch(case, handler.param_type())),
    }
}

fn mismatch(case: &TestCase, expected: ParamType) -> HarnessError {
    HarnessError::ParameterMismatch {
        operation: case.func_name.clone(),
        expected: expected.as_str(),
        actual: format!("{} {}", case.para_type, case.para),
    }
}

/// Run every case in order
pub async fn run_cases(client: &GatewayClient, cases: &[TestCase]) -> Vec<CaseReport> {
    let mut reports = Vec::with_capacity(cases.len());

    for (index, case) in cases.iter().enumerate() {
        let result = run_case(client, case).await;
        match &result {
            Ok(outcome) => info!(
                "usecase {} --> {}, {}",
                index,
                outcome.status,
                String::from_utf8_lossy(&outcome.body)
            ),
            Err(e) => error!("usecase {} ({}) failed: {}", index, case.func_name, e),
        }
        reports.push(CaseReport {
            index,
            func_name: case.func_name.clone(),
            result,
        });
    }

    reports
}
