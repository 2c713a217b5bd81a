//! Outcome → status update mapping.

use crate::models::{JobStatus, JobStatusUpdate, RenderOutcome};

/// Maps a [`RenderOutcome`] to the status fields the job store expects.
///
/// Pure mapping; the full diagnostic text is carried into
/// `error_message` without truncation.
#[derive(Debug, Clone, Copy, Default)]
pub struct JobResultReporter;

impl JobResultReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn report(&self, outcome: &RenderOutcome) -> JobStatusUpdate {
        match outcome {
            RenderOutcome::Success { output_path } => JobStatusUpdate {
                status: JobStatus::Completed,
                result_path: Some(output_path.to_string_lossy().to_string()),
                error_message: None,
            },
            RenderOutcome::Failure { kind, diagnostic } => JobStatusUpdate {
                status: JobStatus::Failed,
                result_path: None,
                error_message: Some(format!(
                    "{}: {}",
                    kind.label(),
                    String::from_utf8_lossy(diagnostic)
                )),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FailureKind;

    #[test]
    fn success_reports_path() {
        let update = JobResultReporter::new().report(&RenderOutcome::success("/mixes/song.wav"));
        assert_eq!(update.status, JobStatus::Completed);
        assert_eq!(update.result_path.as_deref(), Some("/mixes/song.wav"));
        assert!(update.error_message.is_none());
    }

    #[test]
    fn failure_keeps_full_diagnostic() {
        let stderr = "line 1\n".repeat(5000);
        let outcome = RenderOutcome::failure(FailureKind::Engine, stderr.clone());

        let update = JobResultReporter::new().report(&outcome);

        assert_eq!(update.status, JobStatus::Failed);
        assert!(update.result_path.is_none());
        assert_eq!(
            update.error_message.unwrap(),
            format!("EngineFailure: {}", stderr)
        );
    }

    #[test]
    fn serializes_for_job_store() {
        let update = JobResultReporter::new().report(&RenderOutcome::failure(
            FailureKind::UnsupportedEffect,
            "Stem 0: effect 'sidechain' is not supported by the render graph",
        ));
        let json = serde_json::to_value(&update).unwrap();

        assert_eq!(json["status"], "failed");
        assert!(json.get("result_path").is_none());
        assert!(json["error_message"]
            .as_str()
            .unwrap()
            .starts_with("UnsupportedEffectError: Stem 0"));

        let done = serde_json::to_value(JobResultReporter::new().report(&RenderOutcome::success("out.wav")))
            .unwrap();
        assert_eq!(done["status"], "completed");
        assert_eq!(done["result_path"], "out.wav");
    }
}
