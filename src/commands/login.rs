use crate::auth::{CredentialPrompt, TokenExchanger, prompt_secret};
use crate::config::{self, ConfigOperations};
use anyhow::Result;

/// Handles the `login` command: asks for credentials, checks them against
/// the provider and only then replaces the saved ones.
pub async fn login<C, E, P>(config_ops: &C, exchanger: &E, prompt: &P) -> Result<()>
where
    C: ConfigOperations,
    E: TokenExchanger,
    P: CredentialPrompt,
{
    let secret = prompt_secret(prompt)?;

    println!("Attempting to log in...");
    exchanger.exchange(&secret).await?;

    println!("Successfully authenticated. Saving credentials...");
    config::save_secret(config_ops, &secret).await?;
    println!("Credentials saved successfully.");

    Ok(())
}

/// Handles the `logout` command.
pub async fn logout<C: ConfigOperations>(config_ops: &C) -> Result<()> {
    if config::clear_secret(config_ops).await? {
        println!("Saved credentials removed.");
    } else {
        println!("No saved credentials.");
    }
    Ok(())
}
