use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use sense_extract::Provider;

use crate::state::ensure_app_home;

/// Environment variables checked before auth.json, in order
const GEMINI_ENV: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];
const OPENAI_ENV: [&str; 1] = ["OPENAI_API_KEY"];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthState {
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

impl AuthState {
    fn stored_key(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::Gemini => self.gemini_api_key.as_deref(),
            Provider::OpenAi => self.openai_api_key.as_deref(),
        }
    }
}

fn auth_path() -> Result<PathBuf> {
    Ok(ensure_app_home()?.join("auth.json"))
}

pub fn load_auth() -> Result<AuthState> {
    let p = auth_path()?;
    if !p.exists() {
        return Ok(AuthState::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_auth(auth: &AuthState) -> Result<()> {
    let p = auth_path()?;
    let s = serde_json::to_string_pretty(auth)?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

/// API key for `provider`: environment first, then auth.json.
pub fn resolve_api_key(provider: Provider) -> Result<Option<String>> {
    let names: &[&str] = match provider {
        Provider::Gemini => &GEMINI_ENV,
        Provider::OpenAi => &OPENAI_ENV,
    };
    let from_env = names
        .iter()
        .find_map(|name| std::env::var(name).ok().filter(|v| !v.trim().is_empty()));
    let auth = load_auth()?;
    Ok(pick_key(from_env, auth.stored_key(provider)))
}

fn pick_key(from_env: Option<String>, stored: Option<&str>) -> Option<String> {
    from_env
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .or_else(|| stored.map(str::trim).filter(|k| !k.is_empty()).map(String::from))
}

fn prompt_secret(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush().ok();
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

pub fn paste_gemini_key() -> Result<()> {
    let mut auth = load_auth()?;
    let key = prompt_secret("Paste Gemini API key (starts with AIza)")?;
    if !key.starts_with("AIza") {
        bail!("key didn't look like a Gemini API key (expected prefix AIza)");
    }
    auth.gemini_api_key = Some(key);
    save_auth(&auth)?;
    println!("Saved Gemini API key to {}", auth_path()?.display());
    Ok(())
}

pub fn paste_openai_key() -> Result<()> {
    let mut auth = load_auth()?;
    let key = prompt_secret("Paste OpenAI API key (starts with sk-)")?;
    if !key.starts_with("sk-") {
        bail!("key didn't look like an OpenAI API key (expected prefix sk-)");
    }
    auth.openai_api_key = Some(key);
    save_auth(&auth)?;
    println!("Saved OpenAI API key to {}", auth_path()?.display());
    Ok(())
}
