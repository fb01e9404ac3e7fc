//! git2-backed publisher
//!
//! Opens (or initializes) a working copy, switches to the review branch,
//! writes the staged file, commits it and pushes the branch when a remote is
//! configured.

use super::{GitError, GitPublisher, PushOutcome, StagedFile, is_protected_branch};
use crate::config::GitSettings;
use anyhow::{Context, Result};
use git2::{Cred, CredentialType, PushOptions, RemoteCallbacks, Repository, Signature};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// How to authenticate a push. Empty means the libgit2 default helper.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitCredentials {
    pub ssh_key_path: Option<PathBuf>,
    pub username: Option<String>,
    pub token: Option<String>,
}

impl GitCredentials {
    pub fn from_settings(settings: &GitSettings) -> Self {
        Self {
            ssh_key_path: settings.ssh_key_path.clone(),
            username: settings.username.clone(),
            token: settings.token.clone(),
        }
    }

    fn resolve(&self, url_user: Option<&str>, allowed: CredentialType) -> Result<Cred, git2::Error> {
        match (&self.ssh_key_path, &self.username, &self.token) {
            (Some(key), _, _) if allowed.contains(CredentialType::SSH_KEY) => {
                Cred::ssh_key(url_user.unwrap_or("git"), None, key, None)
            }
            (_, Some(user), Some(token)) if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) => {
                Cred::userpass_plaintext(user, token)
            }
            _ => Cred::default(),
        }
    }
}

fn git_op(action: &'static str) -> impl FnOnce(git2::Error) -> GitError {
    move |e| GitError::Operation(format!("{}: {}", action, e.message()))
}

/// Commits staged MCP files onto a non-protected branch
pub struct GitService {
    repo: Repository,
    workdir: PathBuf,
    branch: String,
    remote: Option<String>,
    author: (String, String),
    credentials: GitCredentials,
}

impl GitService {
    /// Open the repository at `path`, initializing it when missing.
    ///
    /// Fails when `branch` is `main` or `master`.
    pub fn open_or_init(path: &Path, branch: &str) -> Result<Self> {
        let branch = branch.trim();
        if is_protected_branch(branch) {
            return Err(GitError::ProtectedBranch(branch.to_string()).into());
        }
        std::fs::create_dir_all(path)
            .with_context(|| format!("cannot prepare repository directory {:?}", path))?;

        let repo = Repository::open(path).or_else(|open_err| {
            debug!(?path, error = %open_err, "no repository yet, initializing");
            Repository::init(path)
                .map_err(|e| GitError::Repository(format!("init {:?}: {}", path, e.message())))
        })?;
        let workdir = repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| GitError::Repository(format!("{:?} is a bare repository", path)))?;
        info!(?workdir, branch, "metadata repository ready");

        let defaults = GitSettings::default();
        Ok(Self {
            repo,
            workdir,
            branch: branch.to_string(),
            remote: None,
            author: (defaults.author_name, defaults.author_email),
            credentials: GitCredentials::default(),
        })
    }

    /// Everything from the `[git]` config section.
    pub fn from_settings(settings: &GitSettings) -> Result<Self> {
        Ok(Self::open_or_init(&settings.repo_path, &settings.branch)?
            .with_remote(settings.remote.clone())
            .with_author(&settings.author_name, &settings.author_email)
            .with_credentials(GitCredentials::from_settings(settings)))
    }

    pub fn with_remote(mut self, remote: Option<String>) -> Self {
        self.remote = remote
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        self
    }

    pub fn with_author(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.author = (name.into(), email.into());
        self
    }

    pub fn with_credentials(mut self, credentials: GitCredentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn head_commit(&self) -> Option<git2::Commit<'_>> {
        self.repo.head().ok()?.peel_to_commit().ok()
    }

    /// Make the review branch current. An unborn repository just gets HEAD
    /// pointed at it so the first commit creates it.
    fn switch_to_branch(&self) -> Result<(), GitError> {
        let refname = format!("refs/heads/{}", self.branch);
        let exists = self.repo.find_reference(&refname).is_ok();
        if let (false, Some(tip)) = (exists, self.head_commit()) {
            self.repo
                .branch(&self.branch, &tip, false)
                .map_err(git_op("create branch"))?;
            info!(branch = %self.branch, "review branch created");
        }
        self.repo.set_head(&refname).map_err(git_op("set HEAD"))?;
        if self.head_commit().is_some() {
            let mut checkout = git2::build::CheckoutBuilder::new();
            checkout.safe();
            self.repo
                .checkout_head(Some(&mut checkout))
                .map_err(git_op("checkout"))?;
        }
        Ok(())
    }

    fn place_file(&self, file: &StagedFile) -> Result<()> {
        let relative = Path::new(&file.path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || file.path.trim().is_empty() {
            return Err(GitError::InvalidPath(file.path.clone()).into());
        }
        let target = self.workdir.join(relative);
        if let Some(dir) = target.parent() {
            std::fs::create_dir_all(dir).with_context(|| format!("cannot create {:?}", dir))?;
        }
        std::fs::write(&target, &file.content)
            .with_context(|| format!("cannot write {:?}", target))?;
        debug!(?target, bytes = file.content.len(), "staged file written");
        Ok(())
    }

    /// Add `path` to the index and commit the resulting tree on HEAD.
    fn commit_path(&self, path: &str, message: &str) -> Result<git2::Oid, GitError> {
        let mut index = self.repo.index().map_err(git_op("open index"))?;
        index
            .add_path(Path::new(path))
            .map_err(git_op("add to index"))?;
        index.write().map_err(git_op("write index"))?;
        let tree_id = index.write_tree().map_err(git_op("write tree"))?;
        let tree = self.repo.find_tree(tree_id).map_err(git_op("load tree"))?;

        let (name, email) = &self.author;
        let author = Signature::now(name, email).map_err(git_op("build signature"))?;
        let parent = self.head_commit();
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &author, &author, message, &tree, &parents)
            .map_err(git_op("commit"))?;
        info!(%oid, path, "committed");
        Ok(oid)
    }

    fn push_branch(&self, remote_name: &str) -> Result<(), GitError> {
        let mut remote = self
            .repo
            .find_remote(remote_name)
            .map_err(git_op("look up remote"))?;

        let credentials = self.credentials.clone();
        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(move |_url, user, allowed| credentials.resolve(user, allowed));
        let mut options = PushOptions::new();
        options.remote_callbacks(callbacks);

        let refspec = format!("refs/heads/{0}:refs/heads/{0}", self.branch);
        remote
            .push(&[refspec.as_str()], Some(&mut options))
            .map_err(git_op("push"))?;
        info!(remote = remote_name, branch = %self.branch, "branch pushed");
        Ok(())
    }

    /// Write, commit and (with a remote) push one file
    pub fn publish(&self, file: &StagedFile, commit_message: &str) -> Result<()> {
        self.switch_to_branch()?;
        self.place_file(file)?;
        self.commit_path(&file.path, commit_message)?;
        match &self.remote {
            Some(remote) => self.push_branch(remote)?,
            None => debug!(branch = %self.branch, "no remote configured, commit stays local"),
        }
        Ok(())
    }
}

impl GitPublisher for GitService {
    fn push_to_git(&self, file: &StagedFile, commit_message: &str) -> PushOutcome {
        match self.publish(file, commit_message) {
            Ok(()) => PushOutcome::ok(),
            Err(e) => PushOutcome::failed(format!("{:#}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_refuses_protected_branch() {
        let dir = TempDir::new().unwrap();
        for branch in ["main", " master "] {
            let err = GitService::open_or_init(dir.path(), branch).err().unwrap();
            assert!(err.to_string().contains("protected"), "{err}");
        }
    }

    #[test]
    fn test_commits_onto_review_branch() {
        let dir = TempDir::new().unwrap();
        let service = GitService::open_or_init(dir.path(), "metadata/review").unwrap();
        let file = StagedFile::new("mcps/tag/pii.json", "[]\n");

        let outcome = service.push_to_git(&file, "Add tag PII");
        assert_eq!(outcome, PushOutcome::ok());
        assert!(dir.path().join("mcps/tag/pii.json").exists());

        let head = service.repo.head().unwrap();
        assert_eq!(head.shorthand(), Some("metadata/review"));
        let commit = head.peel_to_commit().unwrap();
        assert_eq!(commit.message(), Some("Add tag PII"));
        assert_eq!(commit.author().name(), Some("DataHub Metadata Manager"));

        let second = StagedFile::new("mcps/tag/phi.json", "[]\n");
        assert!(service.push_to_git(&second, "Add tag PHI").success);
        let commit = service.head_commit().unwrap();
        assert_eq!(commit.parent_count(), 1);
    }

    #[test]
    fn test_from_settings_uses_configured_author() {
        let dir = TempDir::new().unwrap();
        let settings = GitSettings {
            repo_path: dir.path().to_path_buf(),
            branch: "metadata/updates".to_string(),
            author_name: "Metadata Bot".to_string(),
            author_email: "bot@example.com".to_string(),
            ..GitSettings::default()
        };
        let service = GitService::from_settings(&settings).unwrap();
        assert!(service.push_to_git(&StagedFile::new("d/x.json", "{}"), "x").success);
        let commit = service.head_commit().unwrap();
        assert_eq!(commit.author().email(), Some("bot@example.com"));
    }

    #[test]
    fn test_rejects_escaping_paths() {
        let dir = TempDir::new().unwrap();
        let service = GitService::open_or_init(dir.path(), "review").unwrap();
        for path in ["../evil.json", "/etc/evil.json"] {
            let outcome = service.push_to_git(&StagedFile::new(path, "{}"), "nope");
            assert!(!outcome.success);
            assert!(outcome.error.unwrap().contains("Invalid path"));
        }
    }

    #[test]
    fn test_credentials_follow_git_settings() {
        let settings = GitSettings {
            username: Some("bot".to_string()),
            token: Some("t0ken".to_string()),
            ..GitSettings::default()
        };
        let creds = GitCredentials::from_settings(&settings);
        assert_eq!(creds.username.as_deref(), Some("bot"));
        assert_eq!(creds.token.as_deref(), Some("t0ken"));
        assert!(creds.ssh_key_path.is_none());

        assert!(
            creds
                .resolve(None, CredentialType::USER_PASS_PLAINTEXT)
                .is_ok()
        );
    }
}
