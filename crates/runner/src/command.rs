//! Single command execution.
//!
//! Each configured command runs through the platform shell with stdin
//! closed. Its standard output, trimmed, must be one finite number.

use perfwatch_core::{CommandSpec, Error, Measurement, Result};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Lines of stderr kept in execution errors.
const STDERR_TAIL_LINES: usize = 5;

fn shell(command_line: &str) -> Command {
    #[cfg(windows)]
    let mut command = {
        let mut c = Command::new("cmd");
        c.arg("/C");
        c
    };
    #[cfg(not(windows))]
    let mut command = {
        let mut c = Command::new("sh");
        c.arg("-c");
        c
    };
    command
        .arg(command_line)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    command
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

/// Parse the standard output of a measurement command.
pub fn parse_output(command: &str, stdout: &str) -> Result<f64> {
    let trimmed = stdout.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(Error::parse(command, trimmed)),
    }
}

/// Run one command and turn its output into a measurement.
///
/// The measurement is timestamped when the command completes.
pub async fn measure(spec: &CommandSpec) -> Result<Measurement> {
    debug!(command = %spec.name, line = %spec.command, "Running measurement command");

    let output = shell(&spec.command)
        .output()
        .await
        .map_err(|e| Error::execution(&spec.name, format!("cannot start: {}", e)))?;

    if !output.stderr.is_empty() {
        debug!(
            command = %spec.name,
            stderr = %String::from_utf8_lossy(&output.stderr).trim_end(),
            "Command wrote to stderr"
        );
    }

    if !output.status.success() {
        let tail = stderr_tail(&output.stderr);
        let message = if tail.is_empty() {
            output.status.to_string()
        } else {
            format!("{}\n{}", output.status, tail)
        };
        return Err(Error::execution(&spec.name, message));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let value = parse_output(&spec.name, &stdout)?;
    Ok(Measurement::new(&spec.name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_output_trims_whitespace() {
        assert_eq!(parse_output("a", "  42\n").unwrap(), 42.0);
        assert_eq!(parse_output("a", "-1.5").unwrap(), -1.5);
        assert_eq!(parse_output("a", "1e3\r\n").unwrap(), 1000.0);
    }

    #[test]
    fn test_parse_output_rejects_non_numbers() {
        for output in ["", "12ms", "one", "NaN", "inf", "1 2"] {
            let err = parse_output("a", output).unwrap_err();
            assert!(
                matches!(err, Error::MeasurementParse { .. }),
                "expected parse error for {:?}",
                output
            );
        }
    }

    #[test]
    fn test_stderr_tail_keeps_last_lines() {
        let stderr = b"1\n2\n\n3\n4\n5\n6\n7\n";
        assert_eq!(stderr_tail(stderr), "3\n4\n5\n6\n7");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_measure_echo() {
        let m = measure(&CommandSpec::new("first", "echo '1'")).await.unwrap();
        assert_eq!(m.command, "first");
        assert_eq!(m.value, 1.0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_measure_non_zero_exit() {
        let err = measure(&CommandSpec::new("broken", "echo oops >&2; exit 3"))
            .await
            .unwrap_err();
        match err {
            Error::MeasurementExecution { command, message } => {
                assert_eq!(command, "broken");
                assert!(message.contains("oops"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_measure_non_numeric_output() {
        let err = measure(&CommandSpec::new("words", "echo fast"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MeasurementParse { ref output, .. } if output == "fast"));
    }
}
