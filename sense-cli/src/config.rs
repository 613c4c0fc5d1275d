use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use sense_ingest::RenderOptions;

use crate::state::ensure_app_home;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub llm: LlmSection,
    pub render: RenderSection,
    pub export: ExportSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmSection {
    /// "gemini" or "openai"
    pub provider: String,
    /// Provider default when unset
    pub model: Option<String>,
    /// Provider default when unset
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderSection {
    pub dpi: u32,
    pub jpeg_quality: u8,
    pub max_pages: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportSection {
    pub dir: PathBuf,
    pub csv: bool,
    pub json: bool,
    /// IANA name; decides the date in export file names
    pub timezone: String,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: None,
            base_url: None,
            temperature: None,
            timeout_secs: 300,
        }
    }
}

impl Default for RenderSection {
    fn default() -> Self {
        let options = RenderOptions::default();
        Self {
            dpi: options.dpi,
            jpeg_quality: options.jpeg_quality,
            max_pages: options.max_pages,
        }
    }
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            csv: true,
            json: false,
            timezone: "UTC".to_string(),
        }
    }
}

impl LlmSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RenderSection {
    pub fn options(&self) -> RenderOptions {
        RenderOptions {
            dpi: self.dpi,
            jpeg_quality: self.jpeg_quality.clamp(1, 100),
            max_pages: self.max_pages,
        }
    }
}

impl ExportSection {
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse()
            .map_err(|_| anyhow!("invalid export.timezone: {}", self.timezone))
    }

    /// Calendar date stamped on export file names
    pub fn export_date(&self, now: DateTime<Utc>) -> Result<NaiveDate> {
        Ok(now.with_timezone(&self.tz()?).date_naive())
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_app_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s).with_context(|| format!("parse {}", p.display()))
}

fn parse_config(s: &str) -> Result<Config> {
    Ok(toml::from_str(s)?)
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn show_config() -> Result<()> {
    let cfg = load_config()?;
    let p = config_path()?;
    let origin = if p.exists() { "" } else { " (defaults, file not written yet)" };
    println!("# {}{}", p.display(), origin);
    print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let cfg = parse_config(
            r#"
[llm]
provider = "openai"
model = "gpt-4o"

[export]
json = true
"#,
        )
        .unwrap();

        assert_eq!(cfg.llm.provider, "openai");
        assert_eq!(cfg.llm.model.as_deref(), Some("gpt-4o"));
        assert_eq!(cfg.llm.timeout_secs, 300);
        assert!(cfg.export.csv);
        assert!(cfg.export.json);
        assert_eq!(cfg.render, RenderSection::default());
    }

    #[test]
    fn test_default_round_trips_through_toml() {
        let s = toml::to_string_pretty(&Config::default()).unwrap();
        assert_eq!(parse_config(&s).unwrap(), Config::default());
    }

    #[test]
    fn test_render_defaults() {
        let opts = Config::default().render.options();
        assert_eq!((opts.dpi, opts.jpeg_quality, opts.max_pages), (144, 85, 200));
    }

    #[test]
    fn test_export_date_uses_timezone() {
        // 03:30 UTC on the 1st is still the previous evening in Chicago
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 3, 30, 0).unwrap();
        let mut export = ExportSection::default();
        assert_eq!(export.export_date(now).unwrap(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());

        export.timezone = "America/Chicago".to_string();
        assert_eq!(export.export_date(now).unwrap(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        export.timezone = "Mars/Olympus".to_string();
        assert!(export.export_date(now).is_err());
    }
}
