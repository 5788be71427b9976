//! Execution engine: walks a [`Chain`] and realizes each pipeline as
//! in-process builtins and forked children.
//!
//! The chain is consumed. Each stage's descriptors are closed as soon as the
//! stage has been started, and stages a failure skips are dropped, so no
//! pipe end outlives the pipeline that created it.

pub mod process;
pub mod reaper;
pub mod stdio;

pub use stdio::StdioGuard;

use nix::unistd::Pid;

use crate::builtins::{self, FAILURE};
use crate::config::{ChainPolicy, WaitPolicy};
use crate::error::ExecError;
use crate::parse::{Chain, Operator, Pipeline, Runner, Stage};
use crate::shell::Shell;

/// Run every pipeline of `chain` and return the status of the last one run.
///
/// Only fatal errors are returned; anything else is reported on stderr and
/// becomes the failing stage's status.
pub fn execute(shell: &mut Shell, chain: Chain) -> Result<i32, ExecError> {
    let policy = shell.config().exec.chain_policy;
    let mut status = 0;
    let mut previous: Option<Operator> = None;

    for pipeline in chain.pipelines {
        if shell.exit_requested().is_some() {
            break;
        }
        let chained_by = pipeline.chained_by;
        if permits(policy, previous, status) {
            status = run_pipeline(shell, pipeline)?;
        } else {
            log::debug!(
                "skipping pipeline after {:?} with status {status}",
                previous.map(|op| op.as_str())
            );
        }
        previous = chained_by;
    }
    Ok(status)
}

/// Whether a pipeline preceded by `previous` runs, given the last status.
pub fn permits(policy: ChainPolicy, previous: Option<Operator>, last_status: i32) -> bool {
    match (policy, previous) {
        (ChainPolicy::Unconditional, _) => true,
        (ChainPolicy::ShortCircuit, Some(Operator::And)) => last_status == 0,
        (ChainPolicy::ShortCircuit, Some(Operator::Or)) => last_status != 0,
        (ChainPolicy::ShortCircuit, _) => true,
    }
}

fn run_pipeline(shell: &mut Shell, pipeline: Pipeline) -> Result<i32, ExecError> {
    log::debug!(
        "pipeline of {} stage(s), background={}",
        pipeline.stages.len(),
        pipeline.background
    );
    match shell.config().exec.wait_policy {
        WaitPolicy::PerStage => run_per_stage(shell, pipeline.stages),
        WaitPolicy::AfterLaunch => run_after_launch(shell, pipeline.stages),
    }
}

/// Start and finish each stage before the next; the first failure ends the pipeline.
fn run_per_stage(shell: &mut Shell, stages: Vec<Stage>) -> Result<i32, ExecError> {
    for mut stage in stages {
        let status = match start(shell, &mut stage)? {
            Started::Finished(status) => status,
            Started::Running(pid) => finish(pid),
        };
        if status != 0 {
            log::debug!("stage {:?} failed with {status}", stage.args());
            return Ok(status);
        }
        if shell.exit_requested().is_some() {
            break;
        }
    }
    Ok(0)
}

/// Start every stage, then wait for all of them. A stage that fails to start
/// ends the launch. The status is the first non-zero one in stage order.
fn run_after_launch(shell: &mut Shell, stages: Vec<Stage>) -> Result<i32, ExecError> {
    let mut started = Vec::with_capacity(stages.len());
    for mut stage in stages {
        let outcome = start(shell, &mut stage)?;
        let failed = matches!(outcome, Started::Finished(s) if s != 0);
        started.push(outcome);
        if failed || shell.exit_requested().is_some() {
            break;
        }
    }

    let mut status = 0;
    for outcome in started {
        let code = match outcome {
            Started::Finished(code) => code,
            Started::Running(pid) => finish(pid),
        };
        if status == 0 {
            status = code;
        }
    }
    Ok(status)
}

#[derive(Debug)]
enum Started {
    Finished(i32),
    Running(Pid),
}

/// Run a builtin or spawn an external stage, then close the stage's descriptors.
fn start(shell: &mut Shell, stage: &mut Stage) -> Result<Started, ExecError> {
    let result = match stage.runner() {
        Runner::Builtin(builtin) => builtins::run(builtin, stage, shell).map(Started::Finished),
        Runner::External => process::spawn(stage).map(|pid| {
            if stage.deferred_wait() {
                reaper::register(pid);
                Started::Finished(0)
            } else {
                Started::Running(pid)
            }
        }),
    };
    stage.close_fds();
    match result {
        Ok(started) => Ok(started),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            eprintln!("pipesh: {e}");
            Ok(Started::Finished(FAILURE))
        }
    }
}

fn finish(pid: Pid) -> i32 {
    process::wait(pid).unwrap_or_else(|e| {
        eprintln!("pipesh: {e}");
        FAILURE
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconditional_runs_everything() {
        for op in [None, Some(Operator::And), Some(Operator::Or), Some(Operator::Semi)] {
            assert!(permits(ChainPolicy::Unconditional, op, 0));
            assert!(permits(ChainPolicy::Unconditional, op, 1));
        }
    }

    #[test]
    fn short_circuit_follows_status() {
        let p = ChainPolicy::ShortCircuit;
        assert!(permits(p, Some(Operator::And), 0));
        assert!(!permits(p, Some(Operator::And), 1));
        assert!(!permits(p, Some(Operator::Or), 0));
        assert!(permits(p, Some(Operator::Or), 2));
        assert!(permits(p, Some(Operator::Semi), 1));
        assert!(permits(p, Some(Operator::Background), 1));
        assert!(permits(p, None, 1));
    }
}
