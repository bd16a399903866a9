//! Running the produced program

use std::path::Path;

use crate::error::ModbuildError;

/// Run `program` with `args` forwarded verbatim, inheriting stdio.
///
/// Returns the program's exit code. Termination by a signal maps to
/// `128 + signal` on Unix.
pub async fn run_program(program: &Path, args: &[String]) -> Result<i32, ModbuildError> {
    tracing::info!("Running {} {}", program.display(), args.join(" "));

    let status = tokio::process::Command::new(program)
        .args(args)
        .status()
        .await
        .map_err(|e| ModbuildError::Execute {
            path: program.to_path_buf(),
            error: e.to_string(),
        })?;

    Ok(exit_code(&status))
}

#[cfg(unix)]
fn exit_code(status: &std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: &std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}
