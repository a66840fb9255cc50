use crate::types::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;

/// Yes/no prompt shown before destructive operations such as deleting a chat.
pub fn ask_confirmation(prompt: &str, default_yes: bool) -> Result<bool> {
    let choice = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(default_yes)
        .show_default(true)
        .interact()?;
    Ok(choice)
}
