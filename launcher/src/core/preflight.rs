//! Ordered evaluation of pre-flight checks.

use serde::Serialize;

use crate::core::types::{CheckId, CheckRecord, CheckResult, Failure, Warning};

/// Outcome of a pre-flight pass.
///
/// Records are kept in evaluation order. A fatal record, if any, is always
/// the last one: evaluation stops there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreflightReport {
    pub checks: Vec<CheckRecord>,
}

impl PreflightReport {
    /// The failure that aborted evaluation.
    pub fn fatal(&self) -> Option<&Failure> {
        self.checks.iter().find_map(|record| match &record.result {
            CheckResult::Fatal(failure) => Some(failure),
            _ => None,
        })
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Warning> {
        self.checks.iter().filter_map(|record| match &record.result {
            CheckResult::Warning(warning) => Some(warning),
            _ => None,
        })
    }

    pub fn passed(&self) -> bool {
        self.fatal().is_none()
    }

    pub fn was_evaluated(&self, id: CheckId) -> bool {
        self.checks.iter().any(|record| record.id == id)
    }
}

/// Evaluate `checks` in order, stopping at the first fatal result.
pub fn evaluate<F>(checks: &[CheckId], mut check: F) -> PreflightReport
where
    F: FnMut(CheckId) -> CheckResult,
{
    let mut report = PreflightReport::default();
    for &id in checks {
        let result = check(id);
        let stop = result.is_fatal();
        report.checks.push(CheckRecord { id, result });
        if stop {
            break;
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing_entry() -> CheckResult {
        CheckResult::Fatal(Failure::EntryPointMissing {
            path: "main.py".to_string(),
        })
    }

    #[test]
    fn evaluates_all_checks_when_none_fatal() {
        let report = evaluate(&CheckId::ORDER, |_| CheckResult::Ok("ok".to_string()));
        assert_eq!(report.checks.len(), 4);
        assert!(report.passed());
        assert_eq!(report.warnings().count(), 0);
    }

    #[test]
    fn stops_at_first_fatal() {
        let mut seen = Vec::new();
        let report = evaluate(&CheckId::ORDER, |id| {
            seen.push(id);
            match id {
                CheckId::EntryPoint => missing_entry(),
                _ => CheckResult::Ok(String::new()),
            }
        });
        assert_eq!(
            seen,
            vec![CheckId::Interpreter, CheckId::Environment, CheckId::EntryPoint]
        );
        assert!(!report.was_evaluated(CheckId::ModelFile));
        assert_eq!(
            report.fatal(),
            Some(&Failure::EntryPointMissing {
                path: "main.py".to_string()
            })
        );
    }

    #[test]
    fn warnings_do_not_stop_evaluation() {
        let report = evaluate(
            &[CheckId::ModelFile, CheckId::EntryPoint],
            |id| match id {
                CheckId::ModelFile => CheckResult::Warning(Warning::ModelFileMissing {
                    path: "best.pt".to_string(),
                }),
                _ => CheckResult::Ok(String::new()),
            },
        );
        assert!(report.passed());
        assert_eq!(report.checks.len(), 2);
        assert_eq!(report.warnings().count(), 1);
    }
}
