use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

/// A provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Describe,
    AddMetadata,
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Describe => write!(f, "describe"),
            Self::AddMetadata => write!(f, "add-metadata"),
        }
    }
}

/// A key file that doesn't hold a `<key-type> <key> <user@host>` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedKey {
    /// Path as given on the command line.
    pub path: PathBuf,
    /// Number of whitespace separated fields found.
    pub fields: usize,
    /// File contents, for reporting.
    pub contents: String,
}

impl fmt::Display for MalformedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected `<key-type> <key> <user@host>`, found {} field(s): {:?}",
            self.path.display(),
            self.fields,
            self.contents.trim()
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not read path: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("insufficient privileges to read path: {}", .path.display())]
    PathUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid SSH key format in {} file(s):\n{}", .0.len(), list(.0))]
    MalformedKeys(Vec<MalformedKey>),

    #[error("`gcloud {call}` exited with {status}: {}", .stderr.trim())]
    RemoteCall {
        call: Call,
        status: ExitStatus,
        stderr: String,
    },

    #[error("could not run `{}`", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not parse project metadata")]
    Metadata(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

fn list(keys: &[MalformedKey]) -> String {
    keys.iter()
        .map(|k| format!("  {}", k))
        .collect::<Vec<_>>()
        .join("\n")
}
