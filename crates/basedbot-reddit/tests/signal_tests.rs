//! Shutdown on SIGTERM. Kept in its own test binary since it signals the
//! whole process.

#![cfg(unix)]

use basedbot_reddit::ShutdownSignal;
use std::process::Command;
use std::time::Duration;

#[tokio::test]
async fn test_sigterm_triggers_shutdown() {
    let mut signal = ShutdownSignal::install().unwrap();

    let status = Command::new("kill")
        .args(["-TERM", &std::process::id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let name = tokio::time::timeout(Duration::from_secs(5), signal.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(name, "SIGTERM");
}
