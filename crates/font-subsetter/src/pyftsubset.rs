//! `pyftsubset` process runner.

use std::{
    ffi::OsString,
    fs::remove_file,
    io::Read,
    path::{Path, PathBuf},
    process::{Child, Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

use log::debug;

use crate::{SubsetError, SubsetRequest, Subsetter};

/// Executable looked up on `PATH` by default.
pub const DEFAULT_PROGRAM: &str = "pyftsubset";

/// Per-invocation timeout applied unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Runs fontTools' subsetter as an external process.
///
/// Invoked as `PROGRAM [LEADING..] INPUT --output-file=OUT --unicodes=RANGES
/// --flavor=FORMAT [EXTRA..]`. A process that outlives the timeout is killed
/// and the request fails. Any partial output of a failed request is removed,
/// so it is never mistaken for a finished file later.
#[derive(Debug, Clone)]
pub struct PyftSubset {
    program: PathBuf,
    leading_args: Vec<OsString>,
    extra_args: Vec<OsString>,
    timeout: Option<Duration>,
}

impl Default for PyftSubset {
    fn default() -> Self {
        Self::new()
    }
}

impl PyftSubset {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_PROGRAM),
            leading_args: Vec::new(),
            extra_args: Vec::new(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    /// Run the subsetter as `PYTHON -m fontTools.subset` instead of the
    /// `pyftsubset` entry point.
    pub fn python_module(python: impl Into<PathBuf>) -> Self {
        Self::new()
            .with_program(python)
            .with_leading_args(["-m", "fontTools.subset"])
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Arguments placed before the input font path.
    pub fn with_leading_args(mut self, args: impl IntoIterator<Item = impl Into<OsString>>) -> Self {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Arguments appended after the generated ones (e.g. `--layout-features=*`).
    pub fn with_extra_args(mut self, args: impl IntoIterator<Item = impl Into<OsString>>) -> Self {
        self.extra_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn command(&self, request: &SubsetRequest<'_>) -> Command {
        let mut output_arg = OsString::from("--output-file=");
        output_arg.push(request.output);

        let mut command = Command::new(&self.program);
        command
            .args(&self.leading_args)
            .arg(request.input)
            .arg(output_arg)
            .arg(format!("--unicodes={}", request.unicodes))
            .arg(format!("--flavor={}", request.format))
            .args(&self.extra_args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        command
    }

    fn run(&self, request: &SubsetRequest<'_>) -> Result<(), SubsetError> {
        let mut child = self
            .command(request)
            .spawn()
            .map_err(|source| SubsetError::Launch { program: self.program.clone(), source })?;

        let stderr = child.stderr.take();
        let reader = thread::spawn(move || {
            let mut buffer = Vec::new();
            if let Some(mut pipe) = stderr {
                let _ = pipe.read_to_end(&mut buffer);
            }
            String::from_utf8_lossy(&buffer).trim().to_string()
        });

        let Some(status) = wait_with_timeout(&mut child, self.timeout)? else {
            // Not joined: a surviving grandchild may still hold the pipe open.
            // The detached reader exits once the last writer closes it.
            return Err(SubsetError::TimedOut { timeout: self.timeout.unwrap_or_default() });
        };
        let stderr = reader.join().unwrap_or_default();

        if !status.success() {
            return Err(SubsetError::Failed { status, stderr });
        }
        if !request.output.is_file() {
            return Err(SubsetError::MissingOutput { path: request.output.to_path_buf() });
        }
        Ok(())
    }
}

impl Subsetter for PyftSubset {
    fn subset(&self, request: &SubsetRequest<'_>) -> Result<(), SubsetError> {
        debug!(
            "{} {} -> {} ({}, {} bytes of ranges)",
            self.program.display(),
            request.input.display(),
            request.output.display(),
            request.format,
            request.unicodes.len()
        );

        let result = self.run(request);
        if result.is_err() && request.output.exists() {
            let _ = remove_file(request.output);
        }
        result
    }
}

/// Wait for `child`, killing it once `timeout` elapses.
///
/// Returns `Ok(None)` when the process was killed.
fn wait_with_timeout(
    child: &mut Child,
    timeout: Option<Duration>,
) -> Result<Option<ExitStatus>, SubsetError> {
    let Some(timeout) = timeout else {
        return child.wait().map(Some).map_err(SubsetError::Wait);
    };

    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().map_err(SubsetError::Wait)? {
            return Ok(Some(status));
        }
        if start.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
