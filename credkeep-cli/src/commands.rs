//! Command implementations.
//!
//! Each command takes the store and an output sink so it can be driven from
//! tests without a terminal.

use std::io::Write;

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use credkeep_core::{Config, Credential, CredentialStore, Secret};

/// Output format for `load`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Field values supplied on the command line for `store`.
#[derive(Debug, Clone, Default)]
pub struct NewCredential {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub scopes: Option<String>,
}

impl NewCredential {
    pub fn into_credential(self) -> Result<Credential> {
        let mut credential = Credential::new();
        if let Some(token) = self.access_token {
            credential = credential.with_access_token(token);
        }
        if let Some(token) = self.refresh_token {
            credential = credential.with_refresh_token(token);
        }
        if let Some(seconds) = self.expires_in {
            credential = credential
                .with_expires_in_seconds(seconds)
                .context("invalid --expires-in")?;
        }
        if let Some(scopes) = self.scopes {
            credential = credential.with_scopes(parse_scopes(&scopes));
        }
        Ok(credential)
    }
}

/// Split a comma-separated scope list, dropping empty entries.
pub fn parse_scopes(scopes: &str) -> Vec<String> {
    scopes
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

pub fn store_credential(
    store: &dyn CredentialStore,
    user: &str,
    fields: NewCredential,
    out: &mut impl Write,
) -> Result<()> {
    let credential = fields.into_credential()?;
    store
        .store(user, &credential)
        .with_context(|| format!("failed to store credential for {}", user))?;
    writeln!(out, "Stored credential for {}", user)?;
    Ok(())
}

pub fn load_credential(
    store: &dyn CredentialStore,
    user: &str,
    format: OutputFormat,
    reveal: bool,
    out: &mut impl Write,
) -> Result<()> {
    let mut credential = Credential::new();
    let found = store
        .load(user, &mut credential)
        .with_context(|| format!("failed to load credential for {}", user))?;

    if !found {
        bail!("no credential stored for {}", user);
    }

    let show = |secret: &Option<Secret>| -> Option<String> {
        secret.as_ref().map(|s| {
            if reveal {
                s.expose().to_string()
            } else {
                s.to_string()
            }
        })
    };

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "user": user,
                "access_token": show(&credential.access_token),
                "refresh_token": show(&credential.refresh_token),
                "expires_at": credential.expires_at.map(|t| t.to_rfc3339()),
                "expires_in_seconds": credential.expires_in_seconds(),
                "scopes": credential.scopes,
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
        }
        OutputFormat::Text => {
            let none = || "-".to_string();
            writeln!(out, "User:          {}", user)?;
            writeln!(
                out,
                "Access token:  {}",
                show(&credential.access_token).unwrap_or_else(none)
            )?;
            writeln!(
                out,
                "Refresh token: {}",
                show(&credential.refresh_token).unwrap_or_else(none)
            )?;
            match credential.expires_at {
                Some(at) => {
                    let status = if credential.is_expired() { " (expired)" } else { "" };
                    writeln!(out, "Expires at:    {}{}", at.to_rfc3339(), status)?;
                }
                None => writeln!(out, "Expires at:    never")?,
            }
            if credential.scopes.is_empty() {
                writeln!(out, "Scopes:        -")?;
            } else {
                writeln!(out, "Scopes:        {}", credential.scopes.join(", "))?;
            }
        }
    }
    Ok(())
}

pub fn delete_credential(store: &dyn CredentialStore, user: &str, out: &mut impl Write) -> Result<()> {
    store
        .delete(user, &Credential::new())
        .with_context(|| format!("failed to delete credential for {}", user))?;
    writeln!(out, "Deleted credential for {}", user)?;
    Ok(())
}

pub fn show_config(config: &Config, out: &mut impl Write) -> Result<()> {
    write!(out, "{}", toml::to_string_pretty(config)?)?;
    match config.data_file() {
        Ok(path) => writeln!(out, "# resolved data file: {}", path.display())?,
        Err(e) => writeln!(out, "# resolved data file: unavailable ({})", e)?,
    }
    Ok(())
}
