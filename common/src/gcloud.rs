//! Google Cloud project metadata, through the `gcloud` CLI.
use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::Config;
use crate::error::{Call, Error};
use crate::metadata::{KeySet, ProjectInfo, SSH_KEYS};

/// Access to a cloud project's metadata store.
pub trait Provider {
    /// Fetch the project's current metadata.
    fn describe(&self) -> Result<ProjectInfo, Error>;
    /// Set a metadata item to the contents of a local file.
    fn add_metadata_from_file(&self, key: &str, path: &Path) -> Result<(), Error>;
}

/// The `gcloud` command line tool.
#[derive(Debug, Clone)]
pub struct Gcloud {
    program: PathBuf,
    project: Option<String>,
}

impl From<Config> for Gcloud {
    fn from(config: Config) -> Self {
        Self {
            program: config.gcloud,
            project: config.project,
        }
    }
}

impl Gcloud {
    /// Run a `gcloud compute project-info` subcommand and return its standard output.
    fn project_info<S: AsRef<OsStr>>(
        &self,
        call: Call,
        args: impl IntoIterator<Item = S>,
    ) -> Result<String, Error> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["compute", "project-info"]).args(args);

        if let Some(project) = &self.project {
            cmd.arg("--project").arg(project);
        }
        log::debug!("Running {:?}", cmd);

        let output = cmd
            .stdin(Stdio::null())
            .output()
            .map_err(|source| Error::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into());
        }

        Err(Error::RemoteCall {
            call,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into(),
        })
    }
}

impl Provider for Gcloud {
    fn describe(&self) -> Result<ProjectInfo, Error> {
        let out = self.project_info(Call::Describe, ["describe", "--format=yaml"])?;

        log::debug!("Parsing YAML from gcloud command...");
        ProjectInfo::from_yaml(&out)
    }

    fn add_metadata_from_file(&self, key: &str, path: &Path) -> Result<(), Error> {
        let mut mapping = std::ffi::OsString::from(format!("{}=", key));
        mapping.push(path);

        let out = self.project_info(
            Call::AddMetadata,
            [
                OsStr::new("add-metadata"),
                OsStr::new("--metadata-from-file"),
                mapping.as_os_str(),
            ],
        )?;
        log::debug!("{}", out.trim());

        Ok(())
    }
}

/// Replace the project's `ssh-keys` item with the given set.
///
/// The set is staged in a temporary file, which is removed when this
/// function returns. Failing to remove it doesn't fail the update.
pub fn publish<P: Provider>(provider: &P, keys: &KeySet) -> Result<(), Error> {
    let mut file = tempfile::NamedTempFile::new()?;
    log::debug!("Created temporary file: {}", file.path().display());

    keys.write_to(&mut file)?;
    file.as_file_mut().flush()?;
    log::debug!("Wrote {} key(s) to temporary file", keys.len());

    let path = file.path().to_path_buf();
    let result = provider.add_metadata_from_file(SSH_KEYS, &path);

    match file.close() {
        Ok(()) => log::debug!("Removed temporary file."),
        Err(err) => log::warn!(
            "Could not remove temporary file {}: {}",
            path.display(),
            err
        ),
    }

    result
}
