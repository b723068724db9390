use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::languages;
use crate::paths;
use crate::providers::ProviderKind;
use crate::window::ActiveWindow;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

impl ProviderSettings {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            api_key: None,
            model: None,
            base_url: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn api_key(&self) -> Option<&str> {
        non_blank(self.api_key.as_deref())
    }

    pub fn model(&self) -> Option<&str> {
        non_blank(self.model.as_deref())
    }

    pub fn base_url(&self) -> Option<&str> {
        non_blank(self.base_url.as_deref())
    }
}

/// Everything a tick needs to know, read fresh from the settings source at
/// the start of every tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationConfig {
    pub provider: ProviderSettings,
    pub target_language: String,
    pub active_window: Option<ActiveWindow>,
    pub translate_image_alt: bool,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: ProviderSettings::new(ProviderKind::default()),
            target_language: languages::DEFAULT_TARGET_LANGUAGE.to_string(),
            active_window: None,
            translate_image_alt: true,
        }
    }
}

pub trait ConfigSource: Send + Sync {
    fn load(&self) -> Result<TranslationConfig>;
}

impl ConfigSource for TranslationConfig {
    fn load(&self) -> Result<TranslationConfig> {
        Ok(self.clone())
    }
}

/// Layered settings files: working directory, then the base directory, then
/// an optional extra file.
#[derive(Debug, Clone, Default)]
pub struct SettingsFiles {
    extra_path: Option<PathBuf>,
}

impl SettingsFiles {
    pub fn new(extra_path: Option<PathBuf>) -> Self {
        Self { extra_path }
    }
}

impl ConfigSource for SettingsFiles {
    fn load(&self) -> Result<TranslationConfig> {
        load_settings(self.extra_path.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    provider: Option<ProviderSection>,
    translation: Option<TranslationSection>,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderSection {
    kind: Option<ProviderKind>,
    model: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TranslationSection {
    target_language: Option<String>,
    translate_image_alt: Option<bool>,
    window_start: Option<String>,
    window_end: Option<String>,
}

#[derive(Debug, Default)]
struct RawSettings {
    kind: Option<ProviderKind>,
    model: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    target_language: Option<String>,
    translate_image_alt: Option<bool>,
    window_start: Option<String>,
    window_end: Option<String>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<TranslationConfig> {
    ensure_home_settings_file()?;

    let mut ordered_paths = vec![
        PathBuf::from("settings.toml"),
        PathBuf::from("settings.local.toml"),
    ];

    if let Some(home) = paths::base_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    load_settings_from(&ordered_paths, get_env)
}

pub(crate) fn load_settings_from<F>(paths: &[PathBuf], env: F) -> Result<TranslationConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut raw = RawSettings::default();
    for path in paths {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            raw.merge(parsed);
        }
    }
    raw.finalize(env)
}

impl RawSettings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(provider) = incoming.provider {
            if let Some(kind) = provider.kind {
                self.kind = Some(kind);
            }
            merge_string(&mut self.model, provider.model);
            merge_string(&mut self.api_key, provider.api_key);
            merge_string(&mut self.base_url, provider.base_url);
        }
        if let Some(translation) = incoming.translation {
            merge_string(&mut self.target_language, translation.target_language);
            if let Some(enabled) = translation.translate_image_alt {
                self.translate_image_alt = Some(enabled);
            }
            merge_string(&mut self.window_start, translation.window_start);
            merge_string(&mut self.window_end, translation.window_end);
        }
    }

    fn finalize<F>(self, env: F) -> Result<TranslationConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let kind = self.kind.unwrap_or_default();
        let api_key = self.api_key.or_else(|| resolve_env_key(kind, &env));
        let target_language = languages::validate_code(
            self.target_language
                .as_deref()
                .unwrap_or(languages::DEFAULT_TARGET_LANGUAGE),
        )?;
        let active_window =
            ActiveWindow::from_bounds(self.window_start.as_deref(), self.window_end.as_deref())
                .with_context(|| "invalid translation window")?;

        Ok(TranslationConfig {
            provider: ProviderSettings {
                kind,
                api_key,
                model: self.model,
                base_url: self.base_url,
            },
            target_language,
            active_window,
            translate_image_alt: self.translate_image_alt.unwrap_or(true),
        })
    }
}

fn merge_string(slot: &mut Option<String>, incoming: Option<String>) {
    if let Some(value) = incoming
        && !value.trim().is_empty()
    {
        *slot = Some(value.trim().to_string());
    }
}

fn resolve_env_key<F>(kind: ProviderKind, env: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    env("PRODUCT_TRANSLATOR_API_KEY").or_else(|| match kind {
        ProviderKind::DeepSeek => env("DEEPSEEK_API_KEY"),
        ProviderKind::Gemini => env("GEMINI_API_KEY").or_else(|| env("GOOGLE_API_KEY")),
    })
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = paths::base_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

fn get_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
