//! # Command Execution Module / 命令执行模块
//!
//! Runs external commands under lowered resource limits, captures their
//! output and classifies how they ended. A child killed by its own limits
//! (CPU time, file size) comes back as [`ProcessOutcome::Signaled`], never as
//! an ordinary nonzero exit.
//!
//! 在降低的资源限制下运行外部命令，捕获其输出并对结束方式进行分类。
//! 因自身资源限制（CPU 时间、文件大小）被杀死的子进程会返回
//! [`ProcessOutcome::Signaled`]，而不是普通的非零退出。

use nix::sys::resource::{Resource, getrlimit, rlim_t, setrlimit};
use nix::sys::signal::Signal;
use std::collections::HashMap;
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::process::{Command, ExitStatus, Stdio};
use tracing::debug;

use crate::core::error::{Error, Result};

const MIB: rlim_t = 1024 * 1024;

/// How a child process ended, together with everything it wrote.
///
/// 子进程的结束方式及其全部输出。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Normal exit with an exit code.
    Exited {
        code: i32,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
    },
    /// Terminated by a signal, reported by the OS directly or through the
    /// `128 + N` exit-code convention.
    Signaled {
        signal: i32,
        name: String,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
    },
}

impl ProcessOutcome {
    pub fn stdout(&self) -> &[u8] {
        match self {
            ProcessOutcome::Exited { stdout, .. } | ProcessOutcome::Signaled { stdout, .. } => {
                stdout
            }
        }
    }

    pub fn stderr(&self) -> &[u8] {
        match self {
            ProcessOutcome::Exited { stderr, .. } | ProcessOutcome::Signaled { stderr, .. } => {
                stderr
            }
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ProcessOutcome::Exited { code, .. } => Some(*code),
            ProcessOutcome::Signaled { .. } => None,
        }
    }

    pub fn signal_name(&self) -> Option<&str> {
        match self {
            ProcessOutcome::Signaled { name, .. } => Some(name),
            ProcessOutcome::Exited { .. } => None,
        }
    }
}

/// Resource caps applied to every child before it starts.
///
/// 子进程启动前应用的资源上限。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimits {
    /// CPU seconds; `None` leaves the inherited limit alone.
    pub cpu_secs: Option<rlim_t>,
    pub core: rlim_t,
    pub data: rlim_t,
    pub stack: rlim_t,
    pub file_size: rlim_t,
}

impl ResourceLimits {
    /// Limits for a given timeout in seconds. Zero or negative means no CPU
    /// limit; the memory, core and file size caps always apply.
    pub fn for_timeout(timeout_secs: i64) -> Self {
        Self {
            cpu_secs: (timeout_secs > 0).then_some(timeout_secs as rlim_t),
            core: 0,
            data: 1024 * MIB,
            stack: 1024 * MIB,
            file_size: 32 * MIB,
        }
    }

    /// Applies the limits to the calling process.
    ///
    /// Runs in the forked child before `exec`, so it sticks to raw syscalls.
    fn apply(&self) -> std::io::Result<()> {
        if let Some(cpu) = self.cpu_secs {
            lower_rlimit(Resource::RLIMIT_CPU, cpu)?;
        }
        lower_rlimit(Resource::RLIMIT_CORE, self.core)?;
        lower_rlimit(Resource::RLIMIT_DATA, self.data)?;
        lower_rlimit(Resource::RLIMIT_STACK, self.stack)?;
        lower_rlimit(Resource::RLIMIT_FSIZE, self.file_size)?;
        Ok(())
    }
}

/// Lowers soft and hard limits of `resource` to at most `limit`.
/// Smaller inherited values are kept; `RLIM_INFINITY` compares as the largest.
fn lower_rlimit(resource: Resource, limit: rlim_t) -> nix::Result<()> {
    let (soft, hard) = getrlimit(resource)?;
    setrlimit(resource, soft.min(limit), hard.min(limit))
}

/// Splits a command line with shell quoting rules and runs it.
///
/// 按 shell 引号规则拆分命令行并执行。
pub fn execute_line(
    line: &str,
    env_vars: Option<&HashMap<String, String>>,
    timeout_secs: i64,
) -> Result<ProcessOutcome> {
    let argv = shlex::split(line).ok_or_else(|| Error::CommandParse {
        line: line.to_string(),
    })?;
    execute(&argv, env_vars, timeout_secs)
}

/// Runs `argv` to completion under [`ResourceLimits::for_timeout`].
///
/// * `env_vars` - `Some` replaces the child's environment, `None` inherits ours.
/// * `timeout_secs` - CPU-time limit, `<= 0` for none.
///
/// stdin is closed; stdout and stderr are captured in full.
///
/// 在 [`ResourceLimits::for_timeout`] 限制下运行 `argv` 直到结束。
pub fn execute<S: AsRef<str>>(
    argv: &[S],
    env_vars: Option<&HashMap<String, String>>,
    timeout_secs: i64,
) -> Result<ProcessOutcome> {
    let (program, args) = argv.split_first().ok_or(Error::EmptyCommand)?;
    let program = program.as_ref();

    let mut cmd = Command::new(program);
    cmd.args(args.iter().map(AsRef::as_ref))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    if let Some(vars) = env_vars {
        cmd.env_clear().envs(vars);
    }

    let limits = ResourceLimits::for_timeout(timeout_secs);
    // SAFETY: the closure runs between fork and exec in the child and only
    // issues getrlimit/setrlimit syscalls. It does not allocate or lock.
    unsafe {
        cmd.pre_exec(move || limits.apply());
    }

    debug!(program, ?limits, "spawning command");
    let output = cmd.output().map_err(|source| Error::Spawn {
        program: program.to_string(),
        source,
    })?;

    let outcome = classify(output.status, output.stdout, output.stderr);
    debug!(
        program,
        code = outcome.exit_code(),
        signal = outcome.signal_name(),
        "command finished"
    );
    Ok(outcome)
}

/// Maps an exit status to a [`ProcessOutcome`].
///
/// Some runtimes catch a fatal signal and exit "cleanly" with `128 + N`
/// instead of dying from it; those codes are reported as signal `N` too.
fn classify(status: ExitStatus, stdout: Vec<u8>, stderr: Vec<u8>) -> ProcessOutcome {
    let signal = status.signal().or_else(|| {
        status
            .code()
            .filter(|code| *code > 128)
            .map(|code| code - 128)
            .filter(|sig| Signal::try_from(*sig).is_ok())
    });

    match signal {
        Some(signal) => ProcessOutcome::Signaled {
            signal,
            name: signal_name(signal),
            stdout,
            stderr,
        },
        None => ProcessOutcome::Exited {
            code: status.code().unwrap_or(-1),
            stdout,
            stderr,
        },
    }
}

/// Symbolic name such as `SIGXCPU`; unknown numbers become `SIG<n>`.
pub fn signal_name(signal: i32) -> String {
    Signal::try_from(signal)
        .map(|s| s.as_str().to_string())
        .unwrap_or_else(|_| format!("SIG{signal}"))
}
