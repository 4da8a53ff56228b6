//! `zfs` command line collaborator
//!
//! Every call is a blocking process invocation. Argument lists are built by
//! small pure functions so they can be checked without a pool.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{ChildStderr, Command, Stdio};
use std::thread;

use snapkeep_core::naming::{dataset_of, suffix_of, SNAPSHOT_SEPARATOR};
use snapkeep_core::ExErrorKind;

use crate::collaborator::SnapshotStore;
use crate::errors::{command_failed, dataset_missing, pipe_error, spawn_error, Result};

/// What `zfs` prints when asked about a dataset that is not there
const MISSING_DATASET: &str = "dataset does not exist";

/// Output of one `zfs` invocation
#[derive(Debug, Clone)]
pub struct ZfsOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl From<std::process::Output> for ZfsOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

pub(crate) fn list_args(dataset: &str) -> Vec<String> {
    ["list", "-H", "-t", "snapshot", "-o", "name", "-d", "1", dataset]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub(crate) fn snapshot_args(full_name: &str, recursive: bool) -> Vec<String> {
    let mut args = vec!["snapshot".to_string()];
    if recursive {
        args.push("-r".to_string());
    }
    args.push(full_name.to_string());
    args
}

pub(crate) fn destroy_args(full_name: &str) -> Vec<String> {
    vec!["destroy".to_string(), full_name.to_string()]
}

pub(crate) fn send_args(source_name: &str, incremental_base: Option<&str>) -> Vec<String> {
    let mut args = vec!["send".to_string()];
    if let Some(base) = incremental_base {
        args.push("-i".to_string());
        args.push(base.to_string());
    }
    args.push(source_name.to_string());
    args
}

pub(crate) fn receive_args(target_dataset: &str) -> Vec<String> {
    vec![
        "receive".to_string(),
        "-F".to_string(),
        target_dataset.to_string(),
    ]
}

/// Read a child's stderr to the end on its own thread
///
/// The pipe has to keep draining while the other end of a send/receive pair
/// runs, or a chatty sender blocks on a full stderr buffer.
fn drain_stderr(pipe: Option<ChildStderr>) -> thread::JoinHandle<std::io::Result<String>> {
    thread::spawn(move || {
        let mut bytes = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut bytes)?;
        }
        Ok(String::from_utf8_lossy(&bytes).to_string())
    })
}

pub(crate) fn parse_list_output(stdout: &str) -> BTreeSet<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| line.contains(SNAPSHOT_SEPARATOR))
        .map(str::to_string)
        .collect()
}

/// Collaborator backed by the `zfs` binary
#[derive(Debug, Clone)]
pub struct ZfsCli {
    binary: PathBuf,
}

impl ZfsCli {
    pub fn new() -> Self {
        Self::with_binary("zfs")
    }

    /// Use a specific `zfs` executable
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn describe(&self, args: &[String]) -> String {
        format!("{} {}", self.binary.display(), args.join(" "))
    }

    fn invoke(&self, op: &str, args: &[String]) -> Result<ZfsOutput> {
        tracing::debug!(op = op, command = %self.describe(args), "running zfs");

        Ok(Command::new(&self.binary)
            .args(args)
            .output()
            .map_err(|e| spawn_error(op, &self.binary.display().to_string(), e))?
            .into())
    }

    fn run(&self, op: &str, args: &[String]) -> Result<ZfsOutput> {
        let output = self.invoke(op, args)?;
        if !output.success {
            return Err(command_failed(op, &self.describe(args), &output.stderr));
        }
        Ok(output)
    }
}

impl Default for ZfsCli {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore for ZfsCli {
    fn enumerate(&self, dataset: &str) -> Result<BTreeSet<String>> {
        const OP: &str = "enumerate";
        let args = list_args(dataset);
        let output = self
            .invoke(OP, &args)
            .map_err(|e| e.with_dataset(dataset))?;

        if output.success {
            return Ok(parse_list_output(&output.stdout));
        }
        if output.stderr.contains(MISSING_DATASET) {
            return Err(dataset_missing(OP, dataset));
        }
        Err(command_failed(OP, &self.describe(&args), &output.stderr).with_dataset(dataset))
    }

    fn create(&self, dataset: &str, full_name: &str, recursive: bool) -> Result<()> {
        if self.enumerate(dataset)?.contains(full_name) {
            return Ok(());
        }
        self.run("create", &snapshot_args(full_name, recursive))
            .map_err(|e| e.with_dataset(dataset).with_snapshot(full_name))?;
        Ok(())
    }

    fn destroy(&self, full_name: &str) -> Result<()> {
        if !self.enumerate(dataset_of(full_name))?.contains(full_name) {
            return Ok(());
        }
        self.run("destroy", &destroy_args(full_name))
            .map_err(|e| e.with_snapshot(full_name))?;
        Ok(())
    }

    fn transfer(
        &self,
        source_name: &str,
        target_dataset: &str,
        incremental_base: Option<&str>,
    ) -> Result<()> {
        const OP: &str = "transfer";
        let context = |e: snapkeep_core::ExError| {
            e.with_snapshot(source_name).with_target(target_dataset)
        };

        // A full send creates the target, so a missing target is only an
        // error for an incremental send
        let already_there = match self.enumerate(target_dataset) {
            Ok(existing) => suffix_of(source_name).is_some_and(|suffix| {
                existing.contains(&format!("{}{}{}", target_dataset, SNAPSHOT_SEPARATOR, suffix))
            }),
            Err(e) if e.kind() == ExErrorKind::DatasetMissing && incremental_base.is_none() => {
                false
            }
            Err(e) => return Err(context(e)),
        };
        if already_there {
            return Ok(());
        }

        let send = send_args(source_name, incremental_base);
        let receive = receive_args(target_dataset);
        let program = self.binary.display().to_string();
        tracing::debug!(
            op = OP,
            send = %self.describe(&send),
            receive = %self.describe(&receive),
            "running zfs send | zfs receive"
        );

        let mut sender = Command::new(&self.binary)
            .args(&send)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| context(spawn_error(OP, &program, e)))?;

        let stream = match sender.stdout.take() {
            Some(stream) => stream,
            None => {
                let _ = sender.kill();
                return Err(context(command_failed(
                    OP,
                    &self.describe(&send),
                    "send produced no output stream",
                )));
            }
        };

        let sender_stderr = drain_stderr(sender.stderr.take());

        let receiver = Command::new(&self.binary)
            .args(&receive)
            .stdin(Stdio::from(stream))
            .output();

        let sent = sender
            .wait()
            .map_err(|e| context(spawn_error(OP, &program, e)))?;
        let sent_stderr = match sender_stderr.join() {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => return Err(context(pipe_error(OP, &self.describe(&send), e))),
            Err(_) => {
                let e = std::io::Error::other("stderr reader panicked");
                return Err(context(pipe_error(OP, &self.describe(&send), e)));
            }
        };
        let received: ZfsOutput = receiver
            .map_err(|e| context(spawn_error(OP, &program, e)))?
            .into();

        if !sent.success() {
            return Err(context(command_failed(OP, &self.describe(&send), &sent_stderr)));
        }
        if !received.success {
            return Err(context(command_failed(
                OP,
                &self.describe(&receive),
                &received.stderr,
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_args_select_direct_snapshots() {
        assert_eq!(
            list_args("tank/data"),
            vec!["list", "-H", "-t", "snapshot", "-o", "name", "-d", "1", "tank/data"]
        );
    }

    #[test]
    fn test_snapshot_args_recursive_flag() {
        assert_eq!(
            snapshot_args("tank@p_1", true),
            vec!["snapshot", "-r", "tank@p_1"]
        );
        assert_eq!(snapshot_args("tank@p_1", false), vec!["snapshot", "tank@p_1"]);
    }

    #[test]
    fn test_send_args_incremental() {
        assert_eq!(send_args("tank@b", None), vec!["send", "tank@b"]);
        assert_eq!(
            send_args("tank@b", Some("tank@a")),
            vec!["send", "-i", "tank@a", "tank@b"]
        );
    }

    #[test]
    fn test_receive_and_destroy_args() {
        assert_eq!(receive_args("backup/tank"), vec!["receive", "-F", "backup/tank"]);
        assert_eq!(destroy_args("tank@a"), vec!["destroy", "tank@a"]);
    }

    #[test]
    fn test_parse_list_output_skips_blank_lines() {
        let parsed = parse_list_output("tank@a\n\ntank@b\n");
        assert_eq!(
            parsed.into_iter().collect::<Vec<_>>(),
            vec!["tank@a".to_string(), "tank@b".to_string()]
        );
    }

    #[test]
    fn test_missing_binary_is_collaborator_error() {
        let zfs = ZfsCli::with_binary("/nonexistent/zfs");
        let err = zfs.enumerate("tank").unwrap_err();
        assert_eq!(err.kind(), snapkeep_core::ExErrorKind::Collaborator);
        assert_eq!(err.dataset(), Some("tank"));
    }
}
