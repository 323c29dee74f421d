use std::{env, io, path::PathBuf};

use anyhow::{anyhow, Result};

const APPLICATION_DIR: &str = "timetrack";

/// Directory for the database and logs. `%APPDATA%` on Windows, otherwise `$XDG_STATE_HOME` or
/// `$HOME/.local/state`.
pub fn create_application_default_path() -> Result<PathBuf> {
    let mut path = state_home()?;
    path.push(APPLICATION_DIR);

    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}

#[cfg(windows)]
fn state_home() -> Result<PathBuf> {
    env::var("APPDATA")
        .map(PathBuf::from)
        .map_err(|_| anyhow!("APPDATA should be present on Windows"))
}

#[cfg(not(windows))]
fn state_home() -> Result<PathBuf> {
    env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|_| {
            env::var("HOME").map(|home| {
                let mut path = PathBuf::from(home);
                path.push(".local/state");
                path
            })
        })
        .map_err(|_| anyhow!("Couldn't find neither XDG_STATE_HOME nor HOME"))
}
