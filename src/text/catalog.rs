use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use icu_normalizer::ComposingNormalizerBorrowed;
use rust_embed::Embed;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::text::tokenizer;

#[derive(Embed)]
#[folder = "assets/texts/"]
struct TextAssets;

/// One c-test source text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSummary {
    pub id: String,
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub simplified: bool,
}

impl TextSummary {
    pub fn paragraphs(&self) -> Vec<String> {
        tokenizer::split_paragraphs(&self.text)
    }

    pub fn register_label(&self) -> &'static str {
        if self.simplified {
            "Simplified"
        } else {
            "Standard"
        }
    }

    fn normalized(mut self) -> Self {
        let nfc = ComposingNormalizerBorrowed::new_nfc();
        self.text = nfc.normalize(&self.text).into_owned();
        self.title = nfc.normalize(&self.title).into_owned();
        self
    }
}

pub struct Catalog {
    summaries: Vec<TextSummary>,
}

impl Catalog {
    /// Bundled texts ordered by file name, then user texts from
    /// `<config>/ctest/texts/`. A user text replaces a bundled one with the same id.
    pub fn load() -> Self {
        let mut catalog = Self::bundled();
        let user_dir = Config::config_dir().join("texts");
        if user_dir.is_dir() {
            match catalog.merge_dir(&user_dir) {
                Ok(count) => log::info!("loaded {count} user texts from {}", user_dir.display()),
                Err(e) => log::warn!("failed to read user texts: {e:#}"),
            }
        }
        catalog
    }

    pub fn bundled() -> Self {
        let mut names: Vec<String> = TextAssets::iter().map(|f| f.to_string()).collect();
        names.sort();

        let summaries = names
            .iter()
            .filter(|name| name.ends_with(".toml"))
            .filter_map(|name| {
                let file = TextAssets::get(name)?;
                let content = std::str::from_utf8(file.data.as_ref()).ok()?;
                match toml::from_str::<TextSummary>(content) {
                    Ok(summary) => Some(summary.normalized()),
                    Err(e) => {
                        log::warn!("skipping bundled text {name}: {e}");
                        None
                    }
                }
            })
            .collect();

        Self { summaries }
    }

    pub fn from_summaries(summaries: Vec<TextSummary>) -> Self {
        Self {
            summaries: summaries.into_iter().map(TextSummary::normalized).collect(),
        }
    }

    /// Merge every `*.toml` text in `dir`, returning how many were read.
    /// Unreadable or malformed files are logged and skipped.
    pub fn merge_dir(&mut self, dir: &Path) -> Result<usize> {
        let mut paths: Vec<_> = fs::read_dir(dir)
            .with_context(|| format!("failed to list {}", dir.display()))?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|x| x.to_str()) == Some("toml"))
            .collect();
        paths.sort();

        let mut count = 0;
        for path in paths {
            match read_text(&path) {
                Ok(summary) => {
                    self.insert(summary.normalized());
                    count += 1;
                }
                Err(e) => log::warn!("skipping user text {}: {e:#}", path.display()),
            }
        }
        Ok(count)
    }

    fn insert(&mut self, summary: TextSummary) {
        if let Some(existing) = self.summaries.iter_mut().find(|s| s.id == summary.id) {
            *existing = summary;
        } else {
            self.summaries.push(summary);
        }
    }

    pub fn all(&self) -> &[TextSummary] {
        &self.summaries
    }

    pub fn get(&self, id: &str) -> Option<&TextSummary> {
        self.summaries.iter().find(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }
}

fn read_text(path: &Path) -> Result<TextSummary> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}
