//! Helpers shared by everything that drives external tools (git, msbuild)

use tokio::io::{AsyncBufReadExt, BufReader};

/// Max number of output lines to include in error messages.
const ERROR_TAIL_LINES: usize = 50;

/// Extract the useful tail of tool output for error diagnostics.
///
/// Combines stdout and stderr, then returns the last `ERROR_TAIL_LINES`
/// lines so error messages are actionable without being overwhelming.
pub(crate) fn error_tail<S: AsRef<str>>(lines: &[S]) -> String {
    let start = lines.len().saturating_sub(ERROR_TAIL_LINES);
    lines[start..]
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Same as [`error_tail`] for captured stdout and stderr buffers.
pub(crate) fn output_tail(stdout: &str, stderr: &str) -> String {
    let lines: Vec<&str> = stdout.lines().chain(stderr.lines()).collect();
    error_tail(&lines)
}

/// Stream stdout+stderr from a child process, calling `on_output` for each line.
///
/// Returns all collected output lines for error reporting. Streams that were
/// not piped are treated as already closed.
pub(crate) async fn stream_child_output(
    child: &mut tokio::process::Child,
    on_output: &(dyn Fn(String) + Send + Sync),
) -> Vec<String> {
    let mut stderr_reader = child.stderr.take().map(|s| BufReader::new(s).lines());
    let mut stdout_reader = child.stdout.take().map(|s| BufReader::new(s).lines());

    let mut all_output = Vec::new();
    let mut stderr_done = stderr_reader.is_none();
    let mut stdout_done = stdout_reader.is_none();

    while !stderr_done || !stdout_done {
        tokio::select! {
            line = async { stderr_reader.as_mut()?.next_line().await.ok().flatten() }, if !stderr_done => {
                match line {
                    Some(line) => {
                        on_output(line.clone());
                        all_output.push(line);
                    }
                    None => stderr_done = true,
                }
            }
            line = async { stdout_reader.as_mut()?.next_line().await.ok().flatten() }, if !stdout_done => {
                match line {
                    Some(line) => {
                        on_output(line.clone());
                        all_output.push(line);
                    }
                    None => stdout_done = true,
                }
            }
        }
    }

    all_output
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Stdio;
    use std::sync::Mutex;

    #[test]
    fn tail_keeps_last_lines() {
        let lines: Vec<String> = (0..80).map(|i| format!("line {i}")).collect();
        let tail = error_tail(&lines);
        assert!(tail.starts_with("line 30"));
        assert!(tail.ends_with("line 79"));
    }

    #[test]
    fn output_tail_joins_streams() {
        assert_eq!(output_tail("a\nb", "c"), "a\nb\nc");
        assert_eq!(output_tail("", ""), "");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn streams_both_pipes() {
        let mut child = tokio::process::Command::new("sh")
            .args(["-c", "echo out; echo err 1>&2"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();

        let seen = Mutex::new(Vec::new());
        let lines = stream_child_output(&mut child, &|l: String| seen.lock().unwrap().push(l)).await;
        child.wait().await.unwrap();

        assert_eq!(lines.len(), 2);
        assert!(lines.contains(&"out".to_string()));
        assert!(lines.contains(&"err".to_string()));
        assert_eq!(seen.lock().unwrap().len(), 2);
    }
}
