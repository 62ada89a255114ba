use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory with an initial `config.json` and an empty database.
///
/// # Arguments
/// - `finny_home` - The directory that will be the root of data directory, e.g. `$HOME/finny`
///
/// # Errors
/// - Returns an error if the directory has already been initialized.
/// - Returns an error if any file operations fail.
pub async fn init(finny_home: &Path) -> Result<Out<()>> {
    let config = Config::create(finny_home)
        .await
        .context("Unable to create the data directory and configs")?;
    Ok(format!(
        "Successfully created the finny directory at {}",
        config.root().display()
    )
    .into())
}
