//! The `tutorhq nickname` and `tutorhq reset` commands.

use anyhow::Result;

use super::{open_session, report_unsaved, Overrides};

pub async fn nickname(overrides: &Overrides, name: String) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("nickname must not be empty");
    }

    let session = open_session(overrides).await?;
    let update = session.set_nickname(name).await?;
    println!("Nickname set to {name}");
    report_unsaved(update.saved);
    Ok(())
}

pub async fn reset(overrides: &Overrides, keep_nickname: bool) -> Result<()> {
    let session = open_session(overrides).await?;
    let update = session.reset(keep_nickname).await?;
    if keep_nickname {
        println!("Progress reset (nickname kept).");
    } else {
        println!("Progress reset.");
    }
    report_unsaved(update.saved);
    Ok(())
}
