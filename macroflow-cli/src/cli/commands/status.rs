//! `update-status` command handler

use anyhow::Result;
use colored::*;

use crate::cli::{UpdateStatusArgs, open_store};
use crate::config::Config;
use crate::import::maintenance::transition_status;

pub async fn handle_update_status_command(config: &Config, args: UpdateStatusArgs) -> Result<()> {
    let store = open_store(config, false).await?;
    let modified = transition_status(store.as_ref(), args.from, args.to).await?;

    println!(
        "Updated {} documents from {} to {}",
        modified.to_string().green().bold(),
        args.from.as_str().cyan(),
        args.to.as_str().cyan()
    );
    Ok(())
}
