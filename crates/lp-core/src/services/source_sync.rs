use std::path::Path;

use tokio::process::Command;

use crate::error::{DeployError, Result};

const COMMIT_AUTHOR_NAME: &str = "launchpad";
const COMMIT_AUTHOR_EMAIL: &str = "deploy@launchpad.invalid";

async fn run_git(args: &[&str], working_directory: Option<&Path>) -> Result<String> {
    let mut cmd = Command::new("git");
    cmd.args(args);
    if let Some(dir) = working_directory {
        cmd.current_dir(dir);
    }
    let output = cmd
        .output()
        .await
        .map_err(|e| DeployError::Git(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DeployError::Git(format!(
            "git {} failed (exit {}): {}",
            args.join(" "),
            output.status.code().unwrap_or(-1),
            stderr.trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Materialize a local bundle into a freshly created remote repository:
/// clone the empty remote into a scoped temporary workspace, copy the bundle
/// in, commit, push. The workspace is removed on every exit path by the
/// `TempDir` guard, and no step ever touches the caller's working directory
/// since every git invocation carries an explicit `current_dir`.
pub async fn push(local_path: &Path, clone_url: &str) -> Result<()> {
    if !local_path.is_dir() {
        return Err(DeployError::SourceSync(format!(
            "source path '{}' is not a directory",
            local_path.display()
        )));
    }

    let workspace = tempfile::tempdir().map_err(DeployError::Io)?;
    let workdir = workspace.path().join("checkout");
    let workdir_str = workdir.to_string_lossy().to_string();

    run_git(&["clone", clone_url, &workdir_str], None).await?;
    // Pin the branch name; the remote is empty so the default depends on
    // host git config otherwise.
    run_git(&["checkout", "-B", "main"], Some(&workdir)).await?;

    copy_tree(local_path, &workdir)?;

    run_git(&["add", "-A"], Some(&workdir)).await?;
    run_git(
        &[
            "-c",
            &format!("user.name={COMMIT_AUTHOR_NAME}"),
            "-c",
            &format!("user.email={COMMIT_AUTHOR_EMAIL}"),
            "commit",
            "-m",
            "Initial deployment",
        ],
        Some(&workdir),
    )
    .await?;
    run_git(&["push", "-u", "origin", "main"], Some(&workdir)).await?;

    Ok(())
}

/// Recursively copy every entry of `source` into `target`, overwriting on
/// conflict. A `.git` directory in the bundle is skipped so the fresh clone
/// keeps its own history.
fn copy_tree(source: &Path, target: &Path) -> Result<()> {
    for entry in std::fs::read_dir(source)? {
        let entry = entry?;
        let name = entry.file_name();
        if name == ".git" {
            continue;
        }
        let from = entry.path();
        let to = target.join(&name);
        if entry.file_type()?.is_dir() {
            std::fs::create_dir_all(&to)?;
            copy_tree(&from, &to)?;
        } else {
            std::fs::copy(&from, &to)?;
        }
    }
    Ok(())
}
