use std::{
    io::{self, Read as _},
    path::PathBuf,
    process::{Command, ExitStatus, Stdio},
    thread,
};

use futures::channel::oneshot;

#[derive(Debug, Clone)]
pub struct Invocation {
    pub target: String,
    pub workdir: PathBuf,
    pub exec: PathBuf,
    pub args: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("failed to start command: {0}")]
    Start(#[source] io::Error),
    #[error("failed to read command output: {0}")]
    Output(#[source] io::Error),
    #[error("command exited with {status}")]
    Failed { status: ExitStatus, output: String },
    #[error("command thread exited without a result")]
    Lost,
}

/// Runs on a fresh thread per invocation, so a hanging command only holds up
/// its own request. There is no timeout.
pub async fn execute(invocation: Invocation) -> Result<String, CommandError> {
    let span = tracing::info_span!(
        "run",
        hook = invocation.target.as_str(),
        exec = invocation.exec.to_string_lossy().as_ref(),
    );
    let dispatch = tracing::dispatcher::get_default(|dispatch| dispatch.clone());
    let (tx, rx) = oneshot::channel();

    thread::Builder::new()
        .name(format!("hook-{}", invocation.target))
        .spawn(move || {
            let res = tracing::dispatcher::with_default(&dispatch, || {
                span.in_scope(|| run(&invocation))
            });
            tx.send(res).ok();
        })
        .map_err(CommandError::Start)?;

    rx.await.map_err(|_| CommandError::Lost)?
}

pub fn run(invocation: &Invocation) -> Result<String, CommandError> {
    tracing::info!(
        workdir = invocation.workdir.to_string_lossy().as_ref(),
        "Running hook `{}` in {:?}: {:?} {}",
        invocation.target,
        invocation.workdir,
        invocation.exec,
        invocation.args.join(" "),
    );

    let (mut reader, writer) = io::pipe().map_err(CommandError::Start)?;
    let mut command = Command::new(&invocation.exec);
    command
        .args(&invocation.args)
        .current_dir(&invocation.workdir)
        .stdin(Stdio::null())
        .stdout(writer.try_clone().map_err(CommandError::Start)?)
        .stderr(writer);
    let spawned = command.spawn();
    // `command` holds the write ends; the pipe reaches EOF only once they're gone.
    drop(command);
    let mut child = spawned.map_err(CommandError::Start)?;

    let mut buf = Vec::new();
    let read = reader.read_to_end(&mut buf);
    let status = child.wait().map_err(CommandError::Output)?;
    read.map_err(CommandError::Output)?;

    let output = String::from_utf8_lossy(&buf).into_owned();
    tracing::info!("Command output: {}", output);

    if status.success() {
        Ok(output)
    } else {
        Err(CommandError::Failed { status, output })
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    fn invocation(exec: &str, workdir: PathBuf) -> Invocation {
        Invocation {
            target: "octocat/hello".into(),
            workdir,
            exec: exec.into(),
            args: vec![
                "octocat".into(),
                "octocat@github.com".into(),
                "6dcb09b".into(),
                "Fix all the bugs".into(),
                "2015-05-05T19:40:15-04:00".into(),
            ],
        }
    }

    #[test]
    fn passes_arguments_in_order() {
        let output = run(&invocation("echo", std::env::temp_dir())).unwrap();
        assert_eq!(
            output,
            "octocat octocat@github.com 6dcb09b Fix all the bugs 2015-05-05T19:40:15-04:00\n"
        );
    }

    #[test]
    fn runs_in_workdir() {
        let dir = tempfile::tempdir().unwrap();
        run(&invocation("touch", dir.path().to_owned())).unwrap();
        assert!(dir.path().join("octocat@github.com").exists());
        assert!(dir.path().join("Fix all the bugs").exists());
    }

    #[test]
    fn captures_stderr_of_failed_command() {
        let dir = tempfile::tempdir().unwrap();
        match run(&invocation("ls", dir.path().to_owned())) {
            Err(CommandError::Failed { status, output }) => {
                assert!(!status.success());
                assert!(output.contains("octocat@github.com"), "{}", output);
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn non_zero_exit_is_failure() {
        assert!(matches!(
            run(&invocation("false", std::env::temp_dir())),
            Err(CommandError::Failed { .. })
        ));
    }

    #[test]
    fn missing_executable_fails_to_start() {
        assert!(matches!(
            run(&invocation("/nonexistent/hookd-deploy", std::env::temp_dir())),
            Err(CommandError::Start(_))
        ));
    }

    #[test]
    fn missing_workdir_fails_to_start() {
        assert!(matches!(
            run(&invocation("echo", "/nonexistent/hookd".into())),
            Err(CommandError::Start(_))
        ));
    }

    #[actix_rt::test]
    async fn execute_runs_off_thread() {
        let output = execute(invocation("echo", std::env::temp_dir()))
            .await
            .unwrap();
        assert!(output.starts_with("octocat "));
    }

    #[actix_rt::test]
    async fn slow_command_does_not_delay_another() {
        let slow = Invocation {
            target: "a/slow".into(),
            workdir: std::env::temp_dir(),
            exec: "sleep".into(),
            args: vec!["2".into()],
        };
        let fast = Invocation {
            target: "b/fast".into(),
            workdir: std::env::temp_dir(),
            exec: "true".into(),
            args: vec![],
        };

        let started = Instant::now();
        let fast = async {
            let res = execute(fast).await;
            (res, started.elapsed())
        };
        let (slow_res, (fast_res, fast_elapsed)) = futures::join!(execute(slow), fast);

        slow_res.unwrap();
        fast_res.unwrap();
        assert!(
            fast_elapsed < Duration::from_secs(1),
            "fast command took {:?}",
            fast_elapsed
        );
        assert!(started.elapsed() >= Duration::from_secs(2));
    }
}
