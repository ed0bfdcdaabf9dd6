//! 인증 명령어

use crate::commands::Invocation;

pub fn login(inv: &Invocation, token: &str) -> anyhow::Result<()> {
    let token = token.trim();
    if token.is_empty() {
        anyhow::bail!("token must not be empty");
    }

    let mut config = inv.config.clone();
    config.auth_token = Some(token.to_string());
    if config.default_api.is_none() {
        config.default_api = Some(inv.api_url.clone());
    }
    config.save()?;

    println!("Logged in ({})", inv.api_url);
    Ok(())
}

pub fn logout(inv: &Invocation) -> anyhow::Result<()> {
    if inv.config.auth_token.is_none() {
        println!("Not logged in");
        return Ok(());
    }

    let mut config = inv.config.clone();
    config.auth_token = None;
    config.save()?;

    println!("Logged out");
    Ok(())
}
