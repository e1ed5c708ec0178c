//! Platform API activation through `gcloud services enable`

use crate::command::{CommandRunner, Invocation};
use crate::config::ApiEnablePolicy;
use crate::error::QuickstartError;
use anyhow::Result;
use tracing::{info, warn};

/// Enable each API in order
///
/// Under [`ApiEnablePolicy::Strict`] the first failing command aborts the
/// run. Under `BestEffort` failures are logged and returned so the caller
/// can report them.
pub async fn enable_apis(
    runner: &dyn CommandRunner,
    apis: &[String],
    policy: ApiEnablePolicy,
) -> Result<Vec<String>> {
    info!("⚙️  Enabling APIs:");

    let mut failed = Vec::new();
    for api in apis {
        info!(api = %api, "  enabling");

        let invocation = Invocation::new("gcloud").args(["services", "enable", api.as_str()]);
        let status = runner.status(&invocation).await?;

        if status.success() {
            continue;
        }

        match policy {
            ApiEnablePolicy::Strict => {
                return Err(QuickstartError::CommandFailed {
                    command: invocation.to_string(),
                    status: status.to_string(),
                }
                .into());
            }
            ApiEnablePolicy::BestEffort => {
                warn!(api = %api, status = %status, "Failed to enable API, continuing");
                failed.push(api.clone());
            }
        }
    }

    Ok(failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingRunner;

    fn apis() -> Vec<String> {
        vec![
            "compute.googleapis.com".to_string(),
            "cloudkms.googleapis.com".to_string(),
        ]
    }

    #[tokio::test]
    async fn test_one_invocation_per_api() {
        let runner = RecordingRunner::new();

        let failed = enable_apis(&runner, &apis(), ApiEnablePolicy::Strict)
            .await
            .unwrap();

        assert!(failed.is_empty());
        let calls = runner.invocations();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].program, "gcloud");
        assert_eq!(calls[1].args, vec!["services", "enable", "cloudkms.googleapis.com"]);
    }

    #[tokio::test]
    async fn test_strict_stops_at_first_failure() {
        let runner = RecordingRunner::new().with_exit_code("gcloud", 1);

        let err = enable_apis(&runner, &apis(), ApiEnablePolicy::Strict)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("gcloud services enable compute.googleapis.com"));
        assert_eq!(runner.invocations().len(), 1);
    }

    #[tokio::test]
    async fn test_best_effort_continues() {
        let runner = RecordingRunner::new().with_exit_code("gcloud", 1);

        let failed = enable_apis(&runner, &apis(), ApiEnablePolicy::BestEffort)
            .await
            .unwrap();

        assert_eq!(failed, apis());
        assert_eq!(runner.invocations().len(), 2);
    }
}
