//! ENVI-met core 子进程 - 基础设施层
//!
//! 启动 core、回答启动提示、逐行转发输出，返回退出码。
//! 不解释退出码，也不设超时。

use crate::error::SampleFailure;
use crate::services::LogSink;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// core 启动时交互提示的固定回答
pub const STDIN_ANSWER: &[u8] = b"0\n0\n";

/// 一次 core 调用
#[derive(Debug, Clone)]
pub struct CoreProcess {
    exe: PathBuf,
    working_dir: PathBuf,
    simx: PathBuf,
}

impl CoreProcess {
    pub fn new(
        exe: impl Into<PathBuf>,
        working_dir: impl Into<PathBuf>,
        simx: impl Into<PathBuf>,
    ) -> Self {
        Self {
            exe: exe.into(),
            working_dir: working_dir.into(),
            simx: simx.into(),
        }
    }

    /// 日志里显示的命令行
    pub fn command_line(&self) -> String {
        format!("{} {}", self.exe.display(), self.simx.display())
    }

    /// 运行到子进程退出
    ///
    /// stdout 逐行进日志；无法按 UTF-8 解码的行直接丢弃。
    /// stdout 结束后再把 stderr 全部追加进日志。
    /// 返回退出码，被信号终止时为 `None`。
    pub async fn run(&self, sink: &LogSink) -> Result<Option<i32>, SampleFailure> {
        sink.line(format!("CMD: {}", self.command_line()));
        sink.line("");

        let mut child = Command::new(&self.exe)
            .current_dir(&self.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(SampleFailure::Launch)?;
        debug!("core 已启动: pid={:?}", child.id());

        if let Some(stdin) = child.stdin.take() {
            if let Err(e) = answer_prompt(stdin).await {
                abandon(&mut child, None).await;
                return Err(SampleFailure::Io(e));
            }
        }

        // stderr 与 stdout 并行读取，避免子进程写满 stderr 管道后卡死
        let stderr_task = child
            .stderr
            .take()
            .map(|stderr| tokio::spawn(read_all(stderr)));

        if let Some(stdout) = child.stdout.take() {
            if let Err(e) = forward_lines(stdout, sink).await {
                abandon(&mut child, stderr_task).await;
                return Err(SampleFailure::Io(e));
            }
        }

        if let Some(task) = stderr_task {
            let bytes = task
                .await
                .map_err(|e| SampleFailure::Aborted(e.to_string()))?
                .map_err(SampleFailure::Io)?;
            if !bytes.is_empty() {
                match String::from_utf8(bytes) {
                    Ok(text) => text.lines().for_each(|line| sink.line(line)),
                    Err(_) => debug!("stderr 无法解码，已丢弃"),
                }
            }
        }

        let status = child.wait().await.map_err(SampleFailure::Io)?;
        debug!("core 已退出: {:?}", status);
        Ok(status.code())
    }
}

/// 出错收尾：停止 stderr 读取，杀掉并回收子进程
async fn abandon(child: &mut Child, stderr_task: Option<JoinHandle<std::io::Result<Vec<u8>>>>) {
    if let Some(task) = stderr_task {
        task.abort();
    }
    // kill() 会等待子进程退出
    if let Err(e) = child.kill().await {
        warn!("结束 core 失败: {}", e);
    }
}

/// 写入固定回答并关闭 stdin
///
/// 子进程提前关闭 stdin 不算错误。
async fn answer_prompt<W: AsyncWrite + Unpin>(mut stdin: W) -> std::io::Result<()> {
    let written = async {
        stdin.write_all(STDIN_ANSWER).await?;
        stdin.flush().await
    }
    .await;
    match written {
        Err(e) if e.kind() == ErrorKind::BrokenPipe => {
            debug!("core 未读取 stdin: {}", e);
            Ok(())
        }
        other => other,
    }
}

/// 按行转发到日志，去掉行尾的 `\n` / `\r\n`
async fn forward_lines<R: AsyncRead + Unpin>(reader: R, sink: &LogSink) -> std::io::Result<()> {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::with_capacity(256);
    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf).await?;
        if n == 0 {
            break;
        }
        if buf.ends_with(b"\n") {
            buf.pop();
            if buf.ends_with(b"\r") {
                buf.pop();
            }
        }
        match std::str::from_utf8(&buf) {
            Ok(line) => sink.line(line),
            Err(e) => warn!("丢弃无法解码的输出行: {}", e),
        }
    }
    Ok(())
}

async fn read_all<R: AsyncRead + Unpin>(mut reader: R) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<String>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = rx.try_recv() {
            lines.push(line);
        }
        lines
    }

    #[tokio::test]
    async fn test_forward_lines_drops_undecodable() {
        let (sink, mut rx) = LogSink::channel();
        let input: &[u8] = b"first\r\n\xff\xfe broken\nlast without newline";
        forward_lines(input, &sink).await.unwrap();
        assert_eq!(drain(&mut rx), vec!["first", "last without newline"]);
    }

    #[tokio::test]
    async fn test_missing_exe_is_launch_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (sink, _rx) = LogSink::channel();
        let process = CoreProcess::new(dir.path().join("no_such_core"), dir.path(), "a.SIMX");
        let result = process.run(&sink).await;
        assert!(matches!(result, Err(SampleFailure::Launch(_))));
    }

    #[tokio::test]
    async fn test_answer_prompt_ignores_closed_reader() {
        let (writer, reader) = tokio::io::duplex(8);
        drop(reader);
        answer_prompt(writer).await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_core_closing_stdin_still_succeeds() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("deaf_core.sh");
        std::fs::write(&exe, "#!/bin/sh\nexec 0<&-\necho hi\nexit 0\n").unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();

        let (sink, mut rx) = LogSink::channel();
        let process = CoreProcess::new(&exe, dir.path(), "model.SIMX");
        assert_eq!(process.run(&sink).await.unwrap(), Some(0));
        assert!(drain(&mut rx).contains(&"hi".to_string()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_abandon_kills_and_reaps_child() {
        let mut child = Command::new("sleep")
            .arg("30")
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        let stderr_task = child
            .stderr
            .take()
            .map(|stderr| tokio::spawn(read_all(stderr)));

        abandon(&mut child, stderr_task).await;

        let status = child.try_wait().unwrap().expect("子进程应已被回收");
        assert!(!status.success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_echoes_answer_and_stderr_after_stdout() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("fake_core.sh");
        std::fs::write(
            &exe,
            "#!/bin/sh\nread a\nread b\necho \"got $a\"\necho oops >&2\necho \"got $b\"\nexit 4\n",
        )
        .unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();

        let (sink, mut rx) = LogSink::channel();
        let process = CoreProcess::new(&exe, dir.path(), "model.SIMX");
        let code = process.run(&sink).await.unwrap();
        assert_eq!(code, Some(4));

        let lines = drain(&mut rx);
        assert_eq!(lines[0], format!("CMD: {} model.SIMX", exe.display()));
        assert_eq!(&lines[2..], ["got 0", "got 0", "oops"]);
    }
}
