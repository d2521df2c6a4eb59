//! 直接运行编译出的二进制，检查退出码和终端输出

use std::process::Command;

#[test]
fn test_failed_batch_exits_nonzero_with_single_error() {
    let dir = tempfile::tempdir().unwrap();
    let exe = dir.path().join("core.exe");
    std::fs::write(&exe, b"").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_envi_batch_runner"))
        .env("ENVI_WORKSPACE", dir.path().join("missing"))
        .env("ENVI_OUTPUT_DIR", dir.path().join("out"))
        .env("ENVI_CORE_EXE", &exe)
        .env("OUTPUT_LOG_FILE", dir.path().join("log.txt"))
        .env("RUST_LOG", "off")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.matches("Workspace folder not valid.").count(),
        1,
        "stdout: {}",
        stdout
    );
    assert!(stdout.contains("ERROR: Input Error: Workspace folder not valid."));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("Error:"), "stderr: {}", stderr);

    let log = std::fs::read_to_string(dir.path().join("log.txt")).unwrap();
    assert!(log.contains("ERROR: Input Error: Workspace folder not valid."));
}

#[test]
fn test_list_only_prints_samples() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["sample_3.INX", "sample_1.inx", "notes.txt"] {
        std::fs::write(dir.path().join(name), b"").unwrap();
    }

    let output = Command::new(env!("CARGO_BIN_EXE_envi_batch_runner"))
        .env("ENVI_WORKSPACE", dir.path())
        .env("ENVI_LIST_ONLY", "true")
        .env("RUST_LOG", "off")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "sample_1\nsample_3\n");
}
