use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::anyhow;

use sshkeys_common::args::{self, Args, Error, Help, Verbosity};
use sshkeys_common::gcloud::{self, Gcloud, Provider};
use sshkeys_common::keys;
use sshkeys_common::metadata::KeySet;
use sshkeys_terminal as term;

pub const HELP: Help = Help {
    name: "gcp-ssh-key-adder",
    description: env!("CARGO_PKG_DESCRIPTION"),
    version: env!("CARGO_PKG_VERSION"),
    usage: r#"
Usage

    gcp-ssh-key-adder <public-ssh-key-file>... [<option>...]

    Each file must hold a single public key of the form
    `<key-type> <key> <user@host>`, eg. `~/.ssh/id_ed25519.pub`.

Options

    -p, --project <id>    Google Cloud project to update
                          (default: the project configured in gcloud)
    -i, --info            Enable info logging
    -d, --debug           Enable debug logging
    -h, --help            Print help

Environment

    GCP_SSH_KEYS_GCLOUD      The gcloud program to run (default: gcloud)
    CLOUDSDK_CORE_PROJECT    Default project, overridden by `--project`
"#,
};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Options {
    pub paths: Vec<PathBuf>,
    pub project: Option<String>,
    pub verbosity: Verbosity,
}

impl Args for Options {
    fn from_args(args: Vec<OsString>) -> anyhow::Result<(Self, Vec<OsString>)> {
        use lexopt::prelude::*;

        let mut parser = lexopt::Parser::from_args(args);
        let mut paths = Vec::new();
        let mut project: Option<String> = None;
        let mut verbosity = Verbosity::default();

        while let Some(arg) = parser.next()? {
            match arg {
                Long("info") | Short('i') => {
                    verbosity = verbosity.max(Verbosity::Info);
                }
                Long("debug") | Short('d') => {
                    verbosity = Verbosity::Debug;
                }
                Long("project") | Short('p') => {
                    let val = parser.value()?;
                    project = Some(args::parse_value("project", val)?);
                }
                Long("help") | Short('h') => {
                    return Err(Error::Help.into());
                }
                Value(val) => {
                    paths.push(PathBuf::from(val));
                }
                _ => return Err(anyhow!(arg.unexpected())),
            }
        }

        if paths.is_empty() {
            return Err(Error::WithHint {
                err: anyhow!("at least one public SSH key file must be provided"),
                hint: "see `gcp-ssh-key-adder --help`",
            }
            .into());
        }

        Ok((
            Options {
                paths,
                project,
                verbosity,
            },
            vec![],
        ))
    }

    fn verbosity(&self) -> Verbosity {
        self.verbosity
    }
}

/// Keys to publish, and how many of them are new to the project.
#[derive(Debug)]
pub struct Update {
    pub keys: KeySet,
    pub added: usize,
}

/// Read the key files and merge them with the project's existing keys.
///
/// Nothing is fetched from the provider unless every key file is valid.
pub fn prepare<P: Provider>(
    paths: &[PathBuf],
    provider: &P,
) -> Result<Update, sshkeys_common::Error> {
    log::info!("Checking SSH paths for existence and readability...");
    let files = keys::resolve_all(paths)?;

    log::info!("Reading in SSH keys from paths...");
    let new = keys::normalize_all(&files)?;

    log::info!("Fetching project metadata...");
    let existing = provider
        .describe()?
        .ssh_keys()
        .into_iter()
        .collect::<KeySet>();
    log::debug!("Found {} existing key(s)", existing.len());

    log::debug!("Note: Will not write exact duplicate keys...");
    let keys = KeySet::merge(new, existing.iter().cloned());

    Ok(Update {
        added: keys.len() - existing.len(),
        keys,
    })
}

pub fn run(options: Options, ctx: impl term::Context) -> anyhow::Result<()> {
    let config = ctx.config()?.with_project(options.project);
    let project = config.project.clone();
    let gcloud = Gcloud::from(config);
    let update = prepare(&options.paths, &gcloud).map_err(with_hint)?;

    if update.added == 0 {
        term::warning("All keys are already present in the project metadata");
    }

    let spinner = term::spinner("Updating keys in Google Cloud (this may take a few moments)...");
    if let Err(err) = gcloud::publish(&gcloud, &update.keys) {
        spinner.failed();
        return Err(with_hint(err));
    }
    spinner.finish();

    term::success!(
        "Published {} key(s) to {}, {} new",
        update.keys.len(),
        term::format::tertiary(project.as_deref().unwrap_or("the default project")),
        term::format::highlight(update.added)
    );

    Ok(())
}

/// Point the user at the likely fix for errors they can act on.
fn with_hint(err: sshkeys_common::Error) -> anyhow::Error {
    match err {
        sshkeys_common::Error::Spawn { .. } => Error::WithHint {
            err: err.into(),
            hint: "is the Google Cloud SDK installed? Set `GCP_SSH_KEYS_GCLOUD` to use another gcloud",
        }
        .into(),
        err => err.into(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::RefCell;
    use std::fs;
    use std::path::Path;

    use sshkeys_common::error::Call;
    use sshkeys_common::keys::Entry;
    use sshkeys_common::metadata::ProjectInfo;
    use sshkeys_common::Error as KeysError;

    const ALICE: &str = "ssh-rsa AAAAB3...xyz alice@laptop";
    const ALICE_ENTRY: &str = "alice:ssh-rsa AAAAB3...xyz alice@laptop";

    /// In-memory stand-in for gcloud.
    struct Project {
        describe: Option<String>,
        calls: RefCell<Vec<Call>>,
        published: RefCell<Option<String>>,
    }

    impl Project {
        fn new(describe: &str) -> Self {
            Self {
                describe: Some(describe.to_owned()),
                calls: RefCell::new(Vec::new()),
                published: RefCell::new(None),
            }
        }

        fn with_ssh_keys(value: &str) -> Self {
            let value = value
                .lines()
                .map(|l| format!("      {}", l))
                .collect::<Vec<_>>()
                .join("\n");

            Self::new(&format!(
                "commonInstanceMetadata:\n  items:\n  - key: ssh-keys\n    value: |-\n{}\nname: acme-prod\n",
                value
            ))
        }

        fn unreachable() -> Self {
            Self {
                describe: None,
                ..Self::new("")
            }
        }
    }

    impl Provider for Project {
        fn describe(&self) -> Result<ProjectInfo, KeysError> {
            self.calls.borrow_mut().push(Call::Describe);

            match &self.describe {
                Some(yaml) => ProjectInfo::from_yaml(yaml),
                None => Err(KeysError::Spawn {
                    program: PathBuf::from("gcloud"),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
                }),
            }
        }

        fn add_metadata_from_file(&self, key: &str, path: &Path) -> Result<(), KeysError> {
            assert_eq!(key, "ssh-keys");
            self.calls.borrow_mut().push(Call::AddMetadata);
            *self.published.borrow_mut() = Some(fs::read_to_string(path)?);

            Ok(())
        }
    }

    fn key_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn add(paths: &[PathBuf], project: &Project) -> Result<Update, KeysError> {
        let update = prepare(paths, project)?;
        gcloud::publish(project, &update.keys)?;

        Ok(update)
    }

    #[test]
    fn test_add_to_empty_project() {
        let dir = tempfile::tempdir().unwrap();
        let alice = key_file(dir.path(), "alice.pub", ALICE);
        let project = Project::new("commonInstanceMetadata:\n  items:\n  - key: ssh-keys\n    value: ''\n");

        let update = add(&[alice], &project).unwrap();

        assert_eq!(update.added, 1);
        assert_eq!(
            project.published.take().as_deref(),
            Some("alice:ssh-rsa AAAAB3...xyz alice@laptop\n")
        );
        assert_eq!(*project.calls.borrow(), vec![Call::Describe, Call::AddMetadata]);
    }

    #[test]
    fn test_add_existing_key() {
        let dir = tempfile::tempdir().unwrap();
        let alice = key_file(dir.path(), "alice.pub", &format!("{}\n", ALICE));
        let project = Project::with_ssh_keys(ALICE_ENTRY);

        let update = add(&[alice], &project).unwrap();

        assert_eq!(update.added, 0);
        assert_eq!(
            project.published.take().as_deref(),
            Some("alice:ssh-rsa AAAAB3...xyz alice@laptop\n")
        );
    }

    #[test]
    fn test_add_keeps_existing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let alice = key_file(dir.path(), "alice.pub", ALICE);
        let project = Project::with_ssh_keys(
            "bob:ssh-ed25519 AAAAC3...abc bob@desk\ncarol:ssh-rsa AAAAB3...def carol@build",
        );

        let update = add(&[alice], &project).unwrap();

        assert_eq!(update.added, 1);
        assert!(update.keys.contains(&Entry::from(ALICE_ENTRY)));
        assert_eq!(
            project.published.take().as_deref(),
            Some(
                "alice:ssh-rsa AAAAB3...xyz alice@laptop\n\
                 bob:ssh-ed25519 AAAAC3...abc bob@desk\n\
                 carol:ssh-rsa AAAAB3...def carol@build\n"
            )
        );
    }

    #[test]
    fn test_add_without_ssh_keys_item() {
        let dir = tempfile::tempdir().unwrap();
        let a = key_file(dir.path(), "a.pub", ALICE);
        let b = key_file(dir.path(), "b.pub", &format!("  {}  \n", ALICE));
        let project = Project::new("commonInstanceMetadata:\n  items:\n  - key: enable-oslogin\n    value: 'FALSE'\n");

        let update = add(&[a, b], &project).unwrap();

        assert_eq!(update.keys.len(), 1);
        assert_eq!(update.added, 1);
    }

    #[test]
    fn test_missing_path_makes_no_calls() {
        let dir = tempfile::tempdir().unwrap();
        let alice = key_file(dir.path(), "alice.pub", ALICE);
        let missing = dir.path().join("missing.pub");
        let project = Project::new("");

        match add(&[alice, missing.clone()], &project) {
            Err(err @ KeysError::PathNotFound(_)) => {
                assert!(err.to_string().contains(&missing.display().to_string()));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(project.calls.borrow().is_empty());
    }

    #[test]
    fn test_malformed_key_makes_no_calls() {
        let dir = tempfile::tempdir().unwrap();
        let alice = key_file(dir.path(), "alice.pub", ALICE);
        let bad = key_file(dir.path(), "bad.pub", "ssh-rsa AAAAB3...xyz");
        let project = Project::new("");

        match add(&[alice, bad.clone()], &project) {
            Err(KeysError::MalformedKeys(keys)) => {
                assert_eq!(keys.len(), 1);
                assert_eq!(keys[0].path, bad);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(project.calls.borrow().is_empty());
    }

    #[test]
    fn test_describe_failure_skips_update() {
        let dir = tempfile::tempdir().unwrap();
        let alice = key_file(dir.path(), "alice.pub", ALICE);
        let project = Project::unreachable();

        assert!(matches!(
            add(&[alice], &project),
            Err(KeysError::Spawn { .. })
        ));
        assert_eq!(*project.calls.borrow(), vec![Call::Describe]);
        assert!(project.published.borrow().is_none());
    }

    #[test]
    fn test_with_hint() {
        let spawn = KeysError::Spawn {
            program: PathBuf::from("gcloud"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let err = with_hint(spawn);

        assert_eq!(err.to_string(), "could not run `gcloud`");
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::WithHint { .. })
        ));

        let err = with_hint(KeysError::PathNotFound(PathBuf::from("id.pub")));
        assert!(err.downcast_ref::<Error>().is_none());
    }

    #[test]
    fn test_options() {
        let (opts, unparsed) = Options::from_args(vec![
            "-i".into(),
            "~/.ssh/id_rsa.pub".into(),
            "--project".into(),
            "acme-prod".into(),
            "keys/bob.pub".into(),
        ])
        .unwrap();

        assert!(unparsed.is_empty());
        assert_eq!(
            opts,
            Options {
                paths: vec![
                    PathBuf::from("~/.ssh/id_rsa.pub"),
                    PathBuf::from("keys/bob.pub")
                ],
                project: Some("acme-prod".to_owned()),
                verbosity: Verbosity::Info,
            }
        );
    }

    #[test]
    fn test_options_debug_wins() {
        let (a, _) =
            Options::from_args(vec!["-d".into(), "-i".into(), "id.pub".into()]).unwrap();
        let (b, _) =
            Options::from_args(vec!["--info".into(), "--debug".into(), "id.pub".into()]).unwrap();

        assert_eq!(a.verbosity(), Verbosity::Debug);
        assert_eq!(b.verbosity(), Verbosity::Debug);
    }

    #[test]
    fn test_options_errors() {
        let err = Options::from_args(vec![]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::WithHint { .. })
        ));

        let err = Options::from_args(vec!["--help".into()]).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Help)));

        let err = Options::from_args(vec!["--force".into(), "id.pub".into()]).unwrap_err();
        assert!(err.to_string().contains("--force"), "{}", err);

        assert!(Options::from_args(vec!["id.pub".into(), "--project".into()]).is_err());
    }
}
