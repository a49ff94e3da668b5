//! Interactive prompts using dialoguer

use std::path::Path;

use anyhow::Result;
use dialoguer::Confirm;

/// Prompt user to confirm proceeding with an action
pub fn confirm_step(message: &str) -> Result<bool> {
    let confirmed = Confirm::new()
        .with_prompt(message)
        .default(true)
        .interact()?;
    Ok(confirmed)
}

/// Ask before replacing a file that already exists. Missing files need no
/// confirmation; `no_confirm` always proceeds.
pub fn confirm_overwrite(path: &Path, no_confirm: bool) -> Result<bool> {
    if no_confirm || !path.exists() {
        return Ok(true);
    }
    confirm_step(&format!("{} already exists. Overwrite it?", path.display()))
}
