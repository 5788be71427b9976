use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use pipesh::Shell;
use pipesh::config::{ChainPolicy, Config, WaitPolicy};
use pipesh::input::Script;

/// Serializes tests that rebind the process's stdout for a builtin, or that
/// write to the inherited stdout, so output cannot land in another test's file.
/// The harness's own progress lines can still interleave, so those tests
/// match lines rather than whole files.
static STDOUT: Mutex<()> = Mutex::new(());

fn stdout_lock() -> MutexGuard<'static, ()> {
    STDOUT.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn scratch(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("pipesh_it_{}_{tag}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_default()
}

fn status_of(line: &str) -> i32 {
    pipesh::run(line).unwrap()
}

fn shell_with(configure: impl FnOnce(&mut Config)) -> Shell {
    let mut config = Config::default_config();
    configure(&mut config);
    Shell::new(config)
}

fn run_script(shell: &mut Shell, lines: &str) -> i32 {
    shell
        .repl(&mut Script::new(Cursor::new(lines.to_string())))
        .unwrap()
}

macro_rules! status_test {
    ($name:ident, $line:expr, $status:expr) => {
        #[test]
        fn $name() {
            assert_eq!(status_of($line), $status, "line: {}", $line);
        }
    };
}

// ── Statuses ──

status_test!(true_is_zero, "true", 0);
status_test!(false_is_one, "false", 1);
status_test!(missing_program_is_127, "pipesh-no-such-program", 127);
status_test!(blank_line_is_zero, "    ", 0);
status_test!(only_separator_is_zero, ";", 0);
status_test!(leading_pipe_rejected, "| wc", 2);
status_test!(dangling_pipe_rejected, "true |", 2);
status_test!(double_pipe_rejected, "true | | true", 2);
status_test!(missing_target_rejected, "true >", 2);
status_test!(operator_as_target_rejected, "true > ;", 2);
status_test!(redirect_first_rejected, "> out.txt", 2);
status_test!(last_pipeline_decides, "true ; false", 1);
status_test!(failing_stage_ends_pipeline, "false | true", 1);
status_test!(builtin_error_is_one, "cd a b", 1);
status_test!(prompt_without_text_is_one, "prompt", 1);
status_test!(unknown_history_index_is_one, "history 42", 1);

// ── Redirection ──

#[test]
fn echo_to_file() {
    let dir = scratch("echo");
    let out = dir.join("out.txt");
    assert_eq!(status_of(&format!("echo hello > {}", out.display())), 0);
    assert_eq!(read(&out), "hello\n");
}

#[test]
fn quotes_are_stripped_in_literal_mode() {
    let dir = scratch("quotes");
    let out = dir.join("out.txt");
    status_of(&format!("echo \"hello world\" > {}", out.display()));
    assert_eq!(read(&out), "hello world\n");
}

#[test]
fn append_keeps_existing_content() {
    let dir = scratch("append");
    let out = dir.join("log.txt");
    status_of(&format!("echo one >> {}", out.display()));
    status_of(&format!("echo two >> {}", out.display()));
    assert_eq!(read(&out), "one\ntwo\n");
}

#[test]
fn truncate_replaces_content() {
    let dir = scratch("truncate");
    let out = dir.join("f.txt");
    std::fs::write(&out, "old content\n").unwrap();
    status_of(&format!("echo new > {}", out.display()));
    assert_eq!(read(&out), "new\n");
}

#[test]
fn input_redirect_feeds_stdin() {
    let dir = scratch("input");
    let input = dir.join("in.txt");
    let out = dir.join("out.txt");
    std::fs::write(&input, "b\na\n").unwrap();
    let line = format!("sort < {} > {}", input.display(), out.display());
    assert_eq!(status_of(&line), 0);
    assert_eq!(read(&out), "a\nb\n");
}

#[test]
fn stderr_redirect_captures_errors() {
    let dir = scratch("stderr");
    let err = dir.join("err.txt");
    let line = format!("ls {}/missing 2> {}", dir.display(), err.display());
    assert_ne!(status_of(&line), 0);
    assert!(!read(&err).is_empty());
}

#[test]
fn missing_input_file_runs_nothing() {
    let dir = scratch("missing_input");
    let marker = dir.join("ran");
    let line = format!(
        "touch {} ; cat < {}/nope.txt",
        marker.display(),
        dir.display()
    );
    assert_eq!(status_of(&line), 2);
    assert!(!marker.exists());
}

// ── Pipelines ──

#[test]
fn pipe_through_tr() {
    let dir = scratch("pipe");
    let out = dir.join("out.txt");
    let line = format!("echo hello | tr a-z A-Z > {}", out.display());
    assert_eq!(status_of(&line), 0);
    assert_eq!(read(&out), "HELLO\n");
}

#[test]
fn three_stage_pipeline() {
    let dir = scratch("three");
    let out = dir.join("out.txt");
    let line = format!("seq 3 | sort -r | head -n 1 > {}", out.display());
    assert_eq!(status_of(&line), 0);
    assert_eq!(read(&out), "3\n");
}

#[test]
fn failing_stage_skips_the_rest() {
    let dir = scratch("fail_stage");
    let marker = dir.join("ran");
    let line = format!("false | touch {}", marker.display());
    assert_eq!(status_of(&line), 1);
    assert!(!marker.exists());
}

#[test]
fn after_launch_runs_all_stages() {
    let dir = scratch("after_launch");
    let out = dir.join("out.txt");
    let mut shell = shell_with(|c| c.exec.wait_policy = WaitPolicy::AfterLaunch);
    let line = format!("echo hi | tr a-z A-Z > {}", out.display());
    assert_eq!(shell.run_line(&line).unwrap(), 0);
    assert_eq!(read(&out), "HI\n");
}

#[test]
fn after_launch_reports_first_failure() {
    let mut shell = shell_with(|c| c.exec.wait_policy = WaitPolicy::AfterLaunch);
    assert_eq!(shell.run_line("true | true").unwrap(), 0);
    assert_eq!(shell.run_line("true | false").unwrap(), 1);
    assert_eq!(shell.run_line("false | true").unwrap(), 1);
}

#[test]
fn glob_expands_before_exec() {
    let dir = scratch("glob");
    for name in ["b.txt", "a.txt", "skip.log"] {
        std::fs::write(dir.join(name), "").unwrap();
    }
    let out = dir.join("listing");
    let line = format!("ls {}/*.txt > {}", dir.display(), out.display());
    assert_eq!(status_of(&line), 0);
    assert_eq!(
        read(&out),
        format!("{0}/a.txt\n{0}/b.txt\n", dir.display())
    );
}

// ── Chaining ──

#[test]
fn unconditional_chain_ignores_status() {
    let dir = scratch("unconditional");
    let marker = dir.join("ran");
    let line = format!("false && touch {}", marker.display());
    assert_eq!(status_of(&line), 0);
    assert!(marker.exists());
}

#[test]
fn short_circuit_chain_follows_status() {
    let dir = scratch("short_circuit");
    let (after_and, after_semi, after_or) = (dir.join("a"), dir.join("b"), dir.join("c"));
    let mut shell = shell_with(|c| c.exec.chain_policy = ChainPolicy::ShortCircuit);
    let line = format!(
        "false && touch {} ; touch {} ; true || touch {}",
        after_and.display(),
        after_semi.display(),
        after_or.display()
    );
    assert_eq!(shell.run_line(&line).unwrap(), 0);
    assert!(!after_and.exists());
    assert!(after_semi.exists());
    assert!(!after_or.exists());
}

#[test]
fn background_does_not_block() {
    let dir = scratch("background");
    let marker = dir.join("done");
    let line = format!("touch {} & true", marker.display());
    assert_eq!(status_of(&line), 0);

    let deadline = Instant::now() + Duration::from_secs(10);
    while !marker.exists() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(marker.exists());
}

// ── Builtins ──

#[test]
fn pwd_honors_redirect() {
    let _lock = stdout_lock();
    let dir = scratch("pwd");
    let out = dir.join("cwd.txt");
    assert_eq!(status_of(&format!("pwd > {}", out.display())), 0);
    let cwd = std::env::current_dir().unwrap().display().to_string();
    assert!(read(&out).lines().any(|line| line == cwd));
}

#[test]
fn builtin_output_feeds_pipe() {
    let _lock = stdout_lock();
    let dir = scratch("pwd_pipe");
    let out = dir.join("count.txt");
    assert_eq!(status_of(&format!("pwd | wc -l > {}", out.display())), 0);
    assert!(read(&out).trim().parse::<u32>().unwrap() >= 1);
}

#[test]
fn history_lists_numbered_lines() {
    let _lock = stdout_lock();
    let dir = scratch("history_list");
    let out = dir.join("history.txt");
    let mut shell = Shell::new(Config::default_config());
    let second = format!("history > {}", out.display());
    run_script(&mut shell, &format!("prompt $\n{second}\n"));
    let listing = read(&out);
    let lines: Vec<&str> = listing.lines().filter(|l| !l.starts_with("test ")).collect();
    assert_eq!(lines, vec!["1 prompt $".to_string(), format!("2 {second}")]);
}

#[test]
fn history_replay_inherits_redirect() {
    let _lock = stdout_lock();
    let dir = scratch("history_replay");
    let out = dir.join("out.txt");
    let mut shell = Shell::new(Config::default_config());
    let status = run_script(
        &mut shell,
        &format!("echo replayed\nhistory 1 > {}\n", out.display()),
    );
    assert_eq!(status, 0);
    assert!(read(&out).lines().any(|line| line == "replayed"));
    assert_eq!(shell.history().len(), 2);
}

#[test]
fn bang_prefix_replays_latest_match() {
    let _lock = stdout_lock();
    let dir = scratch("bang");
    let out = dir.join("out.txt");
    let mut shell = Shell::new(Config::default_config());
    run_script(
        &mut shell,
        &format!("echo first\necho second\n!ech > {}\n", out.display()),
    );
    let replayed = read(&out);
    assert!(replayed.lines().any(|line| line == "second"));
    assert!(!replayed.lines().any(|line| line == "first"));
}

#[test]
fn replay_returns_replayed_status() {
    let mut shell = Shell::new(Config::default_config());
    assert_eq!(run_script(&mut shell, "false\nhistory 1\n"), 1);
    assert_eq!(run_script(&mut shell, "true\n!t\n"), 0);
}

#[test]
fn config_prompt_is_initial_prompt() {
    let shell = shell_with(|c| c.shell.prompt = "pipesh>".into());
    assert_eq!(shell.prompt(), "pipesh>");
}
