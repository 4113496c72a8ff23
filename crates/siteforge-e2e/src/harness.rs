use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

static BUILD_SITEFORGE: OnceLock<Result<(), String>> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub command_line: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl RunResult {
    #[must_use]
    pub fn transcript(&self) -> String {
        format!(
            "$ {}\n[exit: {}]\n[stdout]\n{}[stderr]\n{}",
            self.command_line, self.exit_code, self.stdout, self.stderr
        )
    }

    /// Parse stdout of a `--format json` run.
    ///
    /// # Errors
    ///
    /// Returns an error if stdout is not valid JSON.
    pub fn json(&self) -> Result<serde_json::Value, String> {
        serde_json::from_str(&self.stdout)
            .map_err(|error| format!("stdout is not JSON: {error}\n{}", self.transcript()))
    }

    /// Details of all notifications in a JSON report.
    ///
    /// # Errors
    ///
    /// Returns an error if stdout is not a JSON report.
    pub fn notification_details(&self) -> Result<Vec<String>, String> {
        let report = self.json()?;
        let notifications = report["notifications"]
            .as_array()
            .ok_or_else(|| "report has no notifications array".to_string())?;
        Ok(notifications
            .iter()
            .filter_map(|notification| notification["detail"].as_str())
            .map(ToString::to_string)
            .collect())
    }
}

/// Run `siteforge` as an external process.
///
/// `NO_PAGER=1` is always set and `SITEFORGE_STATE` cleared to keep runs
/// deterministic.
///
/// # Errors
///
/// Returns an error if building/running the `siteforge` binary fails.
pub fn run_siteforge(
    args: &[&str],
    env_overrides: &[(String, String)],
) -> Result<RunResult, String> {
    ensure_siteforge_built()?;
    let bin = siteforge_bin()?;

    let mut command = Command::new(bin);
    command.env("NO_PAGER", "1");
    command.env_remove("SITEFORGE_STATE");
    command.args(args);
    for (name, value) in env_overrides {
        command.env(name, value);
    }

    let mut command_parts = vec!["siteforge".to_string()];
    command_parts.extend(args.iter().map(|arg| (*arg).to_string()));

    let output = command
        .output()
        .map_err(|error| format!("failed to run siteforge: {error}"))?;

    Ok(RunResult {
        command_line: command_parts.join(" "),
        exit_code: output.status.code().unwrap_or(1),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Write a text file, creating parent directories if needed.
///
/// # Errors
///
/// Returns an error if directories or file contents cannot be written.
pub fn write_file(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}

#[must_use]
pub fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn ensure_siteforge_built() -> Result<(), String> {
    match BUILD_SITEFORGE.get_or_init(|| {
        let status = Command::new("cargo")
            .arg("build")
            .arg("-q")
            .arg("-p")
            .arg("siteforge")
            .status()
            .map_err(|error| format!("failed to build siteforge binary: {error}"))?;

        if status.success() {
            Ok(())
        } else {
            Err(format!(
                "failed to build siteforge binary: cargo exited with status {status}"
            ))
        }
    }) {
        Ok(()) => Ok(()),
        Err(error) => Err(error.clone()),
    }
}

fn siteforge_bin() -> Result<PathBuf, String> {
    let mut path = std::env::current_exe()
        .map_err(|error| format!("failed to determine current executable: {error}"))?;
    if !path.pop() {
        return Err("failed to resolve test executable directory".to_string());
    }
    if path.ends_with("deps") {
        let _ = path.pop();
    }
    Ok(path.join(format!("siteforge{}", std::env::consts::EXE_SUFFIX)))
}
