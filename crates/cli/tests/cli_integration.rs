//! End-to-end tests for the settle binary

mod common;

use common::SettleCommand;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn config_in(temp_dir: &TempDir) -> std::path::PathBuf {
    temp_dir.path().join("config.toml")
}

#[test]
fn test_run_emits_last_line_of_burst() {
    let temp_dir = TempDir::new().unwrap();
    let result = SettleCommand::new(config_in(&temp_dir))
        .args(&["run", "--delay-ms", "20"])
        .stdin("first\nsecond\nthird\n")
        .assert_success()
        .unwrap();

    assert_eq!(result.stdout, "third\n");
}

#[test]
fn test_run_waits_for_quiet_period_before_exit() {
    let temp_dir = TempDir::new().unwrap();
    let result = SettleCommand::new(config_in(&temp_dir))
        .args(&["run", "--delay-ms", "300"])
        .stdin("only\n")
        .assert_success()
        .unwrap();

    assert_eq!(result.stdout, "only\n");
    assert!(result.duration >= Duration::from_millis(300));
}

#[test]
fn test_run_without_input_prints_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let result = SettleCommand::new(config_in(&temp_dir))
        .args(&["run", "--delay-ms", "5"])
        .assert_success()
        .unwrap();

    assert!(result.stdout.is_empty());
}

#[test]
fn test_run_rejects_negative_delay() {
    let temp_dir = TempDir::new().unwrap();
    let result = SettleCommand::new(config_in(&temp_dir))
        .args(&["run", "--delay-ms", "-5"])
        .stdin("line\n")
        .assert_failure()
        .unwrap();

    assert!(result.contains_stderr("non-negative"));
}

#[test]
fn test_run_uses_configured_delay_and_timestamps() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = config_in(&temp_dir);
    std::fs::write(
        &config_path,
        "[debounce]\ndelay_ms = 10\n\n[output]\ntimestamps = true\n",
    )
    .unwrap();

    let result = SettleCommand::new(&config_path)
        .args(&["run"])
        .stdin("a\nb\n")
        .assert_success()
        .unwrap();

    let line = result.stdout.trim_end();
    assert!(line.starts_with('['), "missing timestamp: {:?}", line);
    assert!(line.ends_with("] b"), "unexpected output: {:?}", line);
}

#[cfg(unix)]
#[test]
fn test_run_exec_receives_line_as_argument() {
    let temp_dir = TempDir::new().unwrap();
    let result = SettleCommand::new(config_in(&temp_dir))
        .args(&["run", "--delay-ms", "10", "--exec", "sh", "-c", "echo got:$0"])
        .stdin("x\ny\n")
        .assert_success()
        .unwrap();

    assert_eq!(result.stdout, "got:y\n");
}

#[cfg(unix)]
#[test]
fn test_run_reports_failing_command_without_aborting() {
    let temp_dir = TempDir::new().unwrap();
    let result = SettleCommand::new(config_in(&temp_dir))
        .args(&["run", "--delay-ms", "10", "--label", "checker", "--exec", "false"])
        .stdin("line\n")
        .assert_success()
        .unwrap();

    assert!(result.contains_stderr("Debounced call failed"));
    assert!(result.contains_stderr("checker"));
}

#[test]
fn test_run_survives_invalid_utf8() {
    let temp_dir = TempDir::new().unwrap();
    let result = SettleCommand::new(config_in(&temp_dir))
        .args(&["run", "--delay-ms", "20"])
        .stdin_bytes(b"good\n\xff\xfe\n")
        .assert_success()
        .unwrap();

    assert_eq!(result.stdout, "\u{FFFD}\u{FFFD}\n");
}

#[test]
fn test_run_invalid_bytes_in_superseded_line_are_harmless() {
    let temp_dir = TempDir::new().unwrap();
    let result = SettleCommand::new(config_in(&temp_dir))
        .args(&["run", "--delay-ms", "20"])
        .stdin_bytes(b"\xff\nbad then good\n")
        .assert_success()
        .unwrap();

    assert_eq!(result.stdout, "bad then good\n");
}

#[cfg(unix)]
#[test]
fn test_run_exits_promptly_on_sigint_with_open_stdin() {
    let temp_dir = TempDir::new().unwrap();
    let mut child = SettleCommand::new(config_in(&temp_dir))
        .args(&["run", "--delay-ms", "50"])
        .spawn()
        .unwrap();
    // Hold stdin open so the blocking read never sees EOF
    let _stdin = child.stdin.take();

    std::thread::sleep(Duration::from_millis(500));
    let status = std::process::Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let deadline = Instant::now() + Duration::from_secs(5);
    let exit = loop {
        if let Some(exit) = child.try_wait().unwrap() {
            break exit;
        }
        if Instant::now() > deadline {
            child.kill().unwrap();
            panic!("settle still running 5s after SIGINT");
        }
        std::thread::sleep(Duration::from_millis(20));
    };

    assert_eq!(exit.code(), Some(130));
}

#[test]
fn test_config_set_and_get() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = config_in(&temp_dir);

    let result = SettleCommand::new(&config_path)
        .args(&["config", "--set", "debounce.delay_ms", "750"])
        .assert_success()
        .unwrap();
    assert!(result.contains_stdout("debounce.delay_ms"));
    assert!(config_path.exists());

    let result = SettleCommand::new(&config_path)
        .args(&["config", "--get", "debounce.delay_ms"])
        .assert_success()
        .unwrap();
    assert_eq!(result.stdout.trim(), "750");
}

#[test]
fn test_config_set_rejects_out_of_range() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = config_in(&temp_dir);

    SettleCommand::new(&config_path)
        .args(&["config", "--set", "debounce.delay_ms", "999999999999"])
        .assert_failure()
        .unwrap();
    assert!(!config_path.exists());
}

#[test]
fn test_config_unknown_key() {
    let temp_dir = TempDir::new().unwrap();
    let result = SettleCommand::new(config_in(&temp_dir))
        .args(&["config", "--get", "nope"])
        .assert_failure()
        .unwrap();

    assert!(result.contains_stderr("Unknown config key"));
}

#[test]
fn test_config_path_create_and_example() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = config_in(&temp_dir);

    let result = SettleCommand::new(&config_path)
        .args(&["config", "--path", "--create"])
        .assert_success()
        .unwrap();
    assert!(result.contains_stdout("Created config file"));
    assert!(config_path.exists());

    let result = SettleCommand::new(&config_path)
        .args(&["config", "--example"])
        .assert_success()
        .unwrap();
    assert!(result.contains_stdout("[debounce]"));
    assert!(result.contains_stdout("delay_ms = 200"));
}
