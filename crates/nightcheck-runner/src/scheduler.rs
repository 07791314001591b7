//! Sources of scheduler (crontab) text.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::runner::{CommandRunner, RunnerError};

/// Provides the scheduler table as plain text.
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    async fn fetch(&self) -> Result<String, RunnerError>;
}

/// Reads a user's crontab with `crontab -l -u <user>`.
pub struct CrontabSource {
    runner: Arc<dyn CommandRunner>,
    user: String,
    timeout: Duration,
}

impl CrontabSource {
    pub fn new(runner: Arc<dyn CommandRunner>, user: impl Into<String>, timeout: Duration) -> Self {
        Self {
            runner,
            user: user.into(),
            timeout,
        }
    }

    pub fn argv(&self) -> Vec<String> {
        vec![
            "crontab".to_string(),
            "-l".to_string(),
            "-u".to_string(),
            self.user.clone(),
        ]
    }
}

#[async_trait]
impl ScheduleSource for CrontabSource {
    async fn fetch(&self) -> Result<String, RunnerError> {
        let output = self.runner.run(&self.argv(), self.timeout).await?;
        let stderr = output.stderr.trim();
        if !stderr.is_empty() {
            warn!(user = %self.user, stderr = %stderr, "crontab reported an error");
        }
        Ok(output.stdout)
    }
}

/// Fixed scheduler text, for tests and offline runs.
#[derive(Debug, Clone, Default)]
pub struct StaticSchedule {
    text: String,
}

impl StaticSchedule {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Load the text from a saved crontab file.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        Ok(Self::new(std::fs::read_to_string(path)?))
    }
}

#[async_trait]
impl ScheduleSource for StaticSchedule {
    async fn fetch(&self) -> Result<String, RunnerError> {
        Ok(self.text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::FakeCommandRunner;
    use tracing_test::traced_test;

    #[tokio::test]
    async fn test_crontab_source_returns_stdout() {
        let fake = Arc::new(FakeCommandRunner::new());
        fake.respond_stdout(
            &["crontab", "-l", "-u", "netmgt_user"],
            "0 1 * * * /opt/a.py >> /var/log/a.log\n",
        );
        let source = CrontabSource::new(fake.clone(), "netmgt_user", Duration::from_secs(5));

        let text = source.fetch().await.unwrap();

        assert_eq!(text, "0 1 * * * /opt/a.py >> /var/log/a.log\n");
        assert_eq!(fake.calls()[0], source.argv());
    }

    #[traced_test]
    #[tokio::test]
    async fn test_crontab_stderr_is_logged() {
        let fake = Arc::new(FakeCommandRunner::new());
        fake.respond(
            &["crontab", "-l", "-u", "ghost"],
            "no crontab for ghost\n",
            1,
        );
        let source = CrontabSource::new(fake, "ghost", Duration::from_secs(5));

        let text = source.fetch().await.unwrap();

        assert!(text.is_empty());
        assert!(logs_contain("no crontab for ghost"));
    }

    #[tokio::test]
    async fn test_crontab_timeout_propagates() {
        let fake = Arc::new(FakeCommandRunner::new());
        fake.time_out(&["crontab", "-l", "-u", "netmgt_user"]);
        let source = CrontabSource::new(fake, "netmgt_user", Duration::from_secs(2));

        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, RunnerError::Timeout { timeout_secs: 2, .. }));
    }

    #[tokio::test]
    async fn test_static_schedule_from_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "30 2 * * * /opt/b.pl > /var/log/b.log\n").unwrap();

        let schedule = StaticSchedule::from_file(file.path()).unwrap();
        assert!(schedule.fetch().await.unwrap().contains("/opt/b.pl"));
    }
}
