//! Public key files and the `user:type key comment` entries derived from them.
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, MalformedKey};

/// A key file that exists and can be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFile {
    /// The path as given by the user.
    given: PathBuf,
    /// The path with `~` expanded and symlinks resolved.
    resolved: PathBuf,
}

impl KeyFile {
    /// Resolve a path and check that it's readable.
    pub fn resolve(path: &Path) -> Result<Self, Error> {
        Self::resolve_with_home(path, std::env::var_os("HOME"))
    }

    fn resolve_with_home(path: &Path, home: Option<OsString>) -> Result<Self, Error> {
        let expanded = expand_home(path, home);
        // Only a permission failure means the path may exist. A missing
        // component, or one that isn't a directory, means it doesn't.
        let resolved = match fs::canonicalize(&expanded) {
            Ok(p) => p,
            Err(source) if source.kind() == io::ErrorKind::PermissionDenied => {
                return Err(Error::PathUnreadable {
                    path: path.to_path_buf(),
                    source,
                })
            }
            Err(_) => {
                return Err(Error::PathNotFound(path.to_path_buf()));
            }
        };

        let metadata = fs::metadata(&resolved).map_err(|source| Error::PathUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        if !metadata.is_file() {
            return Err(Error::NotAFile(path.to_path_buf()));
        }

        if let Err(source) = fs::File::open(&resolved) {
            return Err(Error::PathUnreadable {
                path: path.to_path_buf(),
                source,
            });
        }

        Ok(Self {
            given: path.to_path_buf(),
            resolved,
        })
    }

    pub fn path(&self) -> &Path {
        &self.given
    }

    pub fn resolved(&self) -> &Path {
        &self.resolved
    }

    /// Read the file as a single key record.
    pub fn read(&self) -> Result<Result<RawKey, MalformedKey>, Error> {
        let bytes = fs::read(&self.resolved).map_err(|source| Error::PathUnreadable {
            path: self.given.clone(),
            source,
        })?;
        let contents = String::from_utf8_lossy(&bytes);

        Ok(contents.parse::<RawKey>().map_err(|fields| MalformedKey {
            path: self.given.clone(),
            fields,
            contents: contents.into_owned(),
        }))
    }
}

/// Expand a leading `~` to the user's home directory.
fn expand_home(path: &Path, home: Option<OsString>) -> PathBuf {
    let mut components = path.components();

    match (components.next(), home) {
        (Some(Component::Normal(first)), Some(home)) if first == "~" => {
            PathBuf::from(home).join(components.as_path())
        }
        _ => path.to_path_buf(),
    }
}

/// Resolve every path, stopping at the first one that can't be read.
pub fn resolve_all<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<KeyFile>, Error> {
    paths
        .iter()
        .map(|p| {
            let p = p.as_ref();
            log::debug!("Processing: {}", p.display());

            KeyFile::resolve(p)
        })
        .collect()
}

/// Read and normalize every key file.
///
/// All files are checked before failing, so that every malformed key
/// is reported at once.
pub fn normalize_all(files: &[KeyFile]) -> Result<Vec<Entry>, Error> {
    let mut entries = Vec::with_capacity(files.len());
    let mut malformed = Vec::new();

    for file in files {
        log::debug!("Processing: {}", file.resolved().display());

        match file.read()? {
            Ok(key) => entries.push(key.normalize()),
            Err(err) => {
                log::warn!("{}", err);
                malformed.push(err);
            }
        }
    }

    if !malformed.is_empty() {
        return Err(Error::MalformedKeys(malformed));
    }
    Ok(entries)
}

/// A public key record: `<key-type> <key> <user@host>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawKey {
    pub kind: String,
    pub key: String,
    pub comment: String,
}

impl FromStr for RawKey {
    /// Number of fields found when there weren't exactly three.
    type Err = usize;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = s.split_whitespace().collect::<Vec<_>>();

        match fields.as_slice() {
            [kind, key, comment] => Ok(Self {
                kind: (*kind).to_owned(),
                key: (*key).to_owned(),
                comment: (*comment).to_owned(),
            }),
            _ => Err(fields.len()),
        }
    }
}

impl RawKey {
    /// The user part of the comment, ie. everything before the first `@`.
    pub fn user(&self) -> &str {
        self.comment.split('@').next().unwrap_or_default()
    }

    pub fn normalize(&self) -> Entry {
        Entry(format!(
            "{}:{} {} {}",
            self.user(),
            self.kind,
            self.key,
            self.comment
        ))
    }
}

/// A key entry as stored in project metadata: `<user>:<key-type> <key> <user@host>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entry(String);

impl Entry {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Entry {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for Entry {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
