use anyhow::{Context, Result, anyhow};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use super::backend::{CopyOptions, Transport};
use crate::models::Profile;

/// Transport backed by the system OpenSSH client binaries
/// The clients inherit the terminal, so host key checks, password prompts
/// and the scp progress meter behave as if run directly
pub struct OpenSshTransport {
    ssh_program: String,
    scp_program: String,
}

impl OpenSshTransport {
    /// Create a transport using the given `ssh` and `scp` programs
    pub fn new(ssh_program: impl Into<String>, scp_program: impl Into<String>) -> Self {
        OpenSshTransport {
            ssh_program: ssh_program.into(),
            scp_program: scp_program.into(),
        }
    }

    fn run(&self, program: &str, args: Vec<OsString>) -> Result<ExitStatus> {
        log::debug!("Running {} {:?}", program, args);

        let status = Command::new(program)
            .args(&args)
            .status()
            .with_context(|| format!("Failed to spawn {}. Make sure OpenSSH is installed", program))?;

        log::info!("{} exited with {}", program, status);
        Ok(status)
    }

    fn copy(&self, args: Vec<OsString>) -> Result<()> {
        let status = self.run(&self.scp_program, args)?;
        if !status.success() {
            return Err(anyhow!("{} failed with status: {}", self.scp_program, status));
        }
        Ok(())
    }
}

impl Transport for OpenSshTransport {
    fn open_shell(&self, profile: &Profile) -> Result<i32> {
        let status = self.run(&self.ssh_program, ssh_args(profile, &[], &[])?)?;
        Ok(exit_code(status))
    }

    fn run_command(&self, profile: &Profile, command: &[String], args: &[String]) -> Result<i32> {
        let status = self.run(&self.ssh_program, ssh_args(profile, command, args)?)?;
        Ok(exit_code(status))
    }

    fn put(&self, profile: &Profile, sources: &[PathBuf], dest: &str, copy: CopyOptions) -> Result<()> {
        self.copy(upload_args(profile, sources, dest, copy)?)
    }

    fn get(&self, profile: &Profile, sources: &[String], dest: &Path, copy: CopyOptions) -> Result<()> {
        self.copy(download_args(profile, sources, dest, copy)?)
    }

    fn name(&self) -> &'static str {
        "OpenSSH"
    }
}

/// Arguments for `ssh`: port, stored options, destination, then the remote command
pub fn ssh_args(profile: &Profile, command: &[String], args: &[String]) -> Result<Vec<OsString>> {
    let port = profile.port_number()?;

    let mut argv: Vec<OsString> = vec!["-p".into(), port.to_string().into()];
    argv.extend(profile.option_args().into_iter().map(OsString::from));
    argv.push(profile.server_name().into());
    argv.extend(command.iter().chain(args).map(OsString::from));
    Ok(argv)
}

/// Arguments for an `scp` upload: local sources to `user@host:dest`
pub fn upload_args(
    profile: &Profile,
    sources: &[PathBuf],
    dest: &str,
    copy: CopyOptions,
) -> Result<Vec<OsString>> {
    if sources.is_empty() {
        return Err(anyhow!("No files to upload"));
    }

    let mut argv = scp_common_args(profile, copy)?;
    argv.extend(sources.iter().map(OsString::from));
    argv.push(remote_path(profile, dest));
    Ok(argv)
}

/// Arguments for an `scp` download: `user@host:source` entries to a local dest
pub fn download_args(
    profile: &Profile,
    sources: &[String],
    dest: &Path,
    copy: CopyOptions,
) -> Result<Vec<OsString>> {
    if sources.is_empty() {
        return Err(anyhow!("No files to download"));
    }

    let mut argv = scp_common_args(profile, copy)?;
    argv.extend(sources.iter().map(|source| remote_path(profile, source)));
    argv.push(dest.into());
    Ok(argv)
}

fn scp_common_args(profile: &Profile, copy: CopyOptions) -> Result<Vec<OsString>> {
    let port = profile.port_number()?;

    let mut argv: Vec<OsString> = vec!["-P".into(), port.to_string().into()];
    if copy.recursive {
        argv.push("-r".into());
    }
    if copy.quiet {
        argv.push("-q".into());
    }
    argv.extend(profile.option_args().into_iter().map(OsString::from));
    Ok(argv)
}

fn remote_path(profile: &Profile, path: &str) -> OsString {
    format!("{}:{}", profile.server_name(), path).into()
}

/// Exit status of a finished client; killed-by-signal maps to 255 like ssh
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(255)
}
