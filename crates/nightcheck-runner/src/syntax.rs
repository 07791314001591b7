//! Compile-only syntax checks.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use nightcheck_core::{FamilyConfig, Verdict};
use tracing::{debug, warn};

use crate::runner::{CommandRunner, RunnerError};

/// Substring in checker output that marks a passing check (`perl -c`
/// reports `syntax OK` on stderr).
pub const SUCCESS_MARKER: &str = "OK";

/// Map checker diagnostics to a verdict.
///
/// Empty diagnostics, or diagnostics containing [`SUCCESS_MARKER`], are clean.
pub fn verdict_from_diagnostics(stderr: &str) -> Verdict {
    let text = stderr.trim();
    if text.is_empty() || text.contains(SUCCESS_MARKER) {
        Verdict::Clean
    } else {
        Verdict::Failure(text.to_string())
    }
}

/// Runs a family's syntax command against one script.
#[derive(Clone)]
pub struct SyntaxChecker {
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
}

impl SyntaxChecker {
    pub fn new(runner: Arc<dyn CommandRunner>, timeout: Duration) -> Self {
        Self { runner, timeout }
    }

    /// Check `path` with `family`'s command.
    ///
    /// Diagnostics become the verdict. A timeout is reported as a failing
    /// verdict; launch failures are returned as errors.
    pub async fn check(&self, family: &FamilyConfig, path: &Path) -> Result<Verdict, RunnerError> {
        let argv = family.syntax_argv(path);
        match self.runner.run(&argv, self.timeout).await {
            Ok(output) => {
                debug!(path = %path.display(), exit_code = output.exit_code, "syntax check finished");
                Ok(verdict_from_diagnostics(&output.stderr))
            }
            Err(RunnerError::Timeout { timeout_secs, .. }) => {
                warn!(path = %path.display(), timeout_secs, "syntax check timed out");
                Ok(Verdict::Failure(format!(
                    "syntax check timed out after {} seconds",
                    timeout_secs
                )))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::FakeCommandRunner;
    use nightcheck_core::{Family, NightCheckConfig};

    fn perl() -> FamilyConfig {
        NightCheckConfig::default()
            .family(Family::Perl)
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_empty_diagnostics_are_clean() {
        assert_eq!(verdict_from_diagnostics(""), Verdict::Clean);
        assert_eq!(verdict_from_diagnostics("  \n"), Verdict::Clean);
    }

    #[test]
    fn test_success_marker_is_clean() {
        assert_eq!(
            verdict_from_diagnostics("/opt/sync.pl syntax OK\n"),
            Verdict::Clean
        );
    }

    #[test]
    fn test_diagnostics_become_failure() {
        let stderr = "  File \"/opt/a.py\", line 3\n    print 'x'\n          ^\nSyntaxError: invalid syntax\n";
        assert_eq!(
            verdict_from_diagnostics(stderr),
            Verdict::Failure(stderr.trim().to_string())
        );
    }

    #[tokio::test]
    async fn test_check_uses_family_command() {
        let fake = Arc::new(FakeCommandRunner::new());
        fake.respond(
            &["/usr/bin/perl", "-c", "/opt/sync.pl"],
            "syntax error at /opt/sync.pl line 4, near \"}\"\n",
            255,
        );
        let checker = SyntaxChecker::new(fake.clone(), Duration::from_secs(5));

        let verdict = checker.check(&perl(), Path::new("/opt/sync.pl")).await.unwrap();

        assert_eq!(
            verdict,
            Verdict::Failure("syntax error at /opt/sync.pl line 4, near \"}\"".to_string())
        );
        assert_eq!(
            fake.calls(),
            vec![vec![
                "/usr/bin/perl".to_string(),
                "-c".to_string(),
                "/opt/sync.pl".to_string()
            ]]
        );
    }

    #[tokio::test]
    async fn test_timeout_is_failing_verdict() {
        let fake = Arc::new(FakeCommandRunner::new());
        fake.time_out(&["/usr/bin/perl", "-c", "/opt/slow.pl"]);
        let checker = SyntaxChecker::new(fake, Duration::from_secs(3));

        let verdict = checker.check(&perl(), Path::new("/opt/slow.pl")).await.unwrap();

        assert_eq!(
            verdict,
            Verdict::Failure("syntax check timed out after 3 seconds".to_string())
        );
    }

    #[tokio::test]
    async fn test_launch_failure_propagates() {
        let mut family = perl();
        family.syntax_command = vec!["/nonexistent/bin/perl".to_string(), "-c".to_string()];
        let checker = SyntaxChecker::new(
            Arc::new(crate::runner::TokioCommandRunner),
            Duration::from_secs(3),
        );

        let err = checker
            .check(&family, Path::new("/opt/sync.pl"))
            .await
            .unwrap_err();
        assert!(matches!(err, RunnerError::Spawn { .. }));
    }
}
