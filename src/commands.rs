//! Subcommand implementations.
//!
//! Editing commands follow the same shape: show the current list, collect the
//! operator's change through a [`Prompter`], apply it to an in-memory
//! [`Registry`], then persist with a single append or rewrite.

use anyhow::Result;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::error::ServerError;
use crate::models::{Profile, Registry};
use crate::prompt::Prompter;
use crate::resolver::{clean_options, resolve};
use crate::storage::RegistryStorage;
use crate::transport::{CopyOptions, Transport};

const ADD_INSTRUCTIONS: &str = "Instructions:
 Provide the user, host, port, options and comment.
 A user and host must be provided.
 Press q to quit.
 Press enter to provide default values.
 Default port: 22 | Default options: '' | Default comment: ''
";

const REMOVE_INSTRUCTIONS: &str = "Instructions:
 Select server numbers only.
 Separate servers with a comma.
 Type q to quit.
";

const MODIFY_INSTRUCTIONS: &str = "Instructions:
 Select one server number only.
 Press enter to leave field unchanged.
 Type q to quit.
";

/// Result of a `remove` run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// None of the requested positions matched a server
    Unchanged,
    /// Servers were removed; `requested` counts the positions typed
    Removed { requested: usize, removed: usize },
}

impl RemoveOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            RemoveOutcome::Unchanged => "No servers removed.",
            RemoveOutcome::Removed { requested, .. } if *requested > 1 => {
                "Servers removed successfully."
            }
            RemoveOutcome::Removed { .. } => "Server removed successfully.",
        }
    }
}

/// Result of a `modify` run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModifyOutcome {
    Unchanged,
    Modified(Profile),
}

impl ModifyOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            ModifyOutcome::Unchanged => "Server not modified.",
            ModifyOutcome::Modified(_) => "Server modified successfully.",
        }
    }
}

/// Print the numbered server list
pub fn list_servers(
    storage: &dyn RegistryStorage,
    verbose: bool,
    skip_malformed: bool,
    out: &mut dyn Write,
) -> Result<(), ServerError> {
    let registry = storage.load()?;
    let listing = registry.render_listing(verbose, skip_malformed)?;
    out.write_all(listing.as_bytes())
        .map_err(|e| ServerError::io("<stdout>", e))
}

/// Prompt for a new server and append it
/// A missing server list is created by the append
pub fn add_server<R: BufRead, W: Write>(
    storage: &dyn RegistryStorage,
    prompter: &mut Prompter<R, W>,
    skip_malformed: bool,
) -> Result<Profile, ServerError> {
    match storage.load() {
        Ok(registry) => show_listing(&registry, skip_malformed, prompter)?,
        Err(ServerError::NotFound(path)) => {
            log::info!("{:?} does not exist yet, it will be created", path);
            prompter.say("No servers registered yet.")?;
        }
        Err(err) => return Err(err),
    }

    prompter.say(ADD_INSTRUCTIONS)?;
    let profile = prompter.collect_new_profile()?;

    storage.append(&profile)?;
    prompter.say("Server added successfully.")?;
    Ok(profile)
}

/// Prompt for positions and remove those servers
pub fn remove_server<R: BufRead, W: Write>(
    storage: &dyn RegistryStorage,
    prompter: &mut Prompter<R, W>,
    skip_malformed: bool,
) -> Result<RemoveOutcome, ServerError> {
    let mut registry = storage.load()?;
    show_listing(&registry, skip_malformed, prompter)?;

    prompter.say(REMOVE_INSTRUCTIONS)?;
    let positions = prompter.collect_positions()?;

    let outcome = match registry.remove_positions(&positions) {
        0 => RemoveOutcome::Unchanged,
        removed => {
            storage.replace_all(&registry)?;
            RemoveOutcome::Removed {
                requested: positions.len(),
                removed,
            }
        }
    };

    prompter.say(outcome.message())?;
    Ok(outcome)
}

/// Prompt for one position and new field values, then rewrite that line
pub fn modify_server<R: BufRead, W: Write>(
    storage: &dyn RegistryStorage,
    prompter: &mut Prompter<R, W>,
    skip_malformed: bool,
) -> Result<ModifyOutcome, ServerError> {
    let mut registry = storage.load()?;
    show_listing(&registry, skip_malformed, prompter)?;

    prompter.say(MODIFY_INSTRUCTIONS)?;
    let position = prompter.collect_position()?;
    let current = registry.profile(position)?;

    let edit = prompter.collect_edit()?;
    let outcome = if edit.is_empty() {
        ModifyOutcome::Unchanged
    } else {
        let updated = edit.apply(&current);
        registry.replace(position, &updated)?;
        storage.replace_all(&registry)?;
        log::info!("Modified server {}: {}", position, updated.server_name());
        ModifyOutcome::Modified(updated)
    };

    prompter.say(outcome.message())?;
    Ok(outcome)
}

fn show_listing<R: BufRead, W: Write>(
    registry: &Registry,
    skip_malformed: bool,
    prompter: &mut Prompter<R, W>,
) -> Result<(), ServerError> {
    let listing = registry.render_listing(true, skip_malformed)?;
    prompter.say(&listing)
}

/// A server picked on the command line, with its overrides
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Position in the list or `user@host`
    pub server: String,
    pub port: Option<String>,
    /// Raw option tokens as typed
    pub options: Vec<String>,
}

impl Selection {
    /// Resolve against the server list
    pub fn resolve(&self, storage: &dyn RegistryStorage) -> Result<Profile, ServerError> {
        let options = clean_options(self.options.clone());
        resolve(storage, &self.server, self.port.as_deref(), &options)
    }
}

/// Open a shell on the selected server, returning the session exit status
pub fn connect_server(
    storage: &dyn RegistryStorage,
    transport: &dyn Transport,
    selection: &Selection,
) -> Result<i32> {
    let profile = selection.resolve(storage)?;
    log::info!("Connecting to {}", profile.server_name());
    transport.open_shell(&profile)
}

/// Run a command on the selected server, returning its exit status
pub fn command_server(
    storage: &dyn RegistryStorage,
    transport: &dyn Transport,
    selection: &Selection,
    command: &[String],
    args: &[String],
) -> Result<i32> {
    let profile = selection.resolve(storage)?;
    let args = clean_options(args.to_vec());
    log::info!("Running {:?} on {}", command, profile.server_name());
    transport.run_command(&profile, command, &args)
}

/// Upload local files to the selected server
pub fn upload_server(
    storage: &dyn RegistryStorage,
    transport: &dyn Transport,
    selection: &Selection,
    sources: &[PathBuf],
    target: &str,
    copy: CopyOptions,
) -> Result<()> {
    for source in sources {
        if !source.exists() {
            return Err(ServerError::NotFound(source.clone()).into());
        }
    }

    let profile = selection.resolve(storage)?;
    log::info!("Uploading {} item(s) to {}", sources.len(), profile.server_name());
    transport.put(&profile, sources, target, copy)
}

/// Download files from the selected server
pub fn download_server(
    storage: &dyn RegistryStorage,
    transport: &dyn Transport,
    selection: &Selection,
    sources: &[String],
    target: &Path,
    copy: CopyOptions,
) -> Result<()> {
    let profile = selection.resolve(storage)?;
    log::info!("Downloading {} item(s) from {}", sources.len(), profile.server_name());
    transport.get(&profile, sources, target, copy)
}
