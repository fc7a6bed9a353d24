//! Static site content
//!
//! Blog posts (`posts.yml`) and UI dictionaries (`i18n.yml`) ship embedded in
//! the binary. A content directory can replace them without rebuilding.
//! The store is immutable once loaded.

use rust_embed::RustEmbed;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::models::{BlogPost, Locale};
use crate::services::i18n::Translations;

const POSTS_FILE: &str = "posts.yml";
const I18N_FILE: &str = "i18n.yml";

/// Content bundled at build time
#[derive(RustEmbed)]
#[folder = "content/"]
#[include = "*.yml"]
struct EmbeddedContent;

/// Content loading errors
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Content file not found: {0}")]
    Missing(String),

    #[error("Failed to parse {file}: {message}")]
    Parse { file: String, message: String },

    #[error("Duplicate post id: {0}")]
    DuplicateId(String),

    #[error("Post '{0}' has no English title")]
    MissingEnglishTitle(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(serde::Deserialize)]
struct PostsFile {
    posts: Vec<BlogPost>,
}

/// Loaded posts and dictionaries
#[derive(Debug, Clone)]
pub struct ContentStore {
    /// Newest first
    posts: Vec<BlogPost>,
    index: HashMap<String, usize>,
    translations: Translations,
}

impl ContentStore {
    /// Load the content compiled into the binary
    pub fn embedded() -> Result<Self, ContentError> {
        let posts = read_embedded(POSTS_FILE)?;
        let i18n = read_embedded(I18N_FILE)?;
        Self::from_yaml(&posts, &i18n)
    }

    /// Load `posts.yml` and `i18n.yml` from a directory
    pub fn from_dir(dir: &Path) -> Result<Self, ContentError> {
        let read = |name: &str| -> Result<String, ContentError> {
            let path = dir.join(name);
            if !path.exists() {
                return Err(ContentError::Missing(path.display().to_string()));
            }
            Ok(std::fs::read_to_string(path)?)
        };
        Self::from_yaml(&read(POSTS_FILE)?, &read(I18N_FILE)?)
    }

    /// Load from a directory when configured, otherwise from the embedded copy
    pub fn load(dir: Option<&Path>) -> Result<Self, ContentError> {
        match dir {
            Some(dir) => {
                tracing::info!("Loading content from {}", dir.display());
                Self::from_dir(dir)
            }
            None => Self::embedded(),
        }
    }

    /// Parse both content files
    pub fn from_yaml(posts_yaml: &str, i18n_yaml: &str) -> Result<Self, ContentError> {
        let file: PostsFile = serde_yaml::from_str(posts_yaml).map_err(|e| ContentError::Parse {
            file: POSTS_FILE.to_string(),
            message: e.to_string(),
        })?;
        let translations: Translations =
            serde_yaml::from_str(i18n_yaml).map_err(|e| ContentError::Parse {
                file: I18N_FILE.to_string(),
                message: e.to_string(),
            })?;
        Self::new(file.posts, translations)
    }

    /// Build a store from already-parsed data
    pub fn new(mut posts: Vec<BlogPost>, translations: Translations) -> Result<Self, ContentError> {
        for post in &posts {
            if !post.title.has(Locale::DEFAULT) {
                return Err(ContentError::MissingEnglishTitle(post.id.clone()));
            }
        }

        // Stable sort keeps file order for posts sharing a date
        posts.sort_by(|a, b| b.date.cmp(&a.date));

        let mut index = HashMap::with_capacity(posts.len());
        for (i, post) in posts.iter().enumerate() {
            if index.insert(post.id.clone(), i).is_some() {
                return Err(ContentError::DuplicateId(post.id.clone()));
            }
        }

        for post in &posts {
            for related in &post.related {
                if !index.contains_key(related) {
                    tracing::warn!("Post '{}' lists unknown related post '{}'", post.id, related);
                }
            }
        }
        for label in translations.unknown_labels() {
            tracing::warn!("Translations for unsupported language '{}' are ignored", label);
        }

        Ok(Self {
            posts,
            index,
            translations,
        })
    }

    /// All posts, newest first
    pub fn posts(&self) -> &[BlogPost] {
        &self.posts
    }

    /// Post by slug
    pub fn get(&self, id: &str) -> Option<&BlogPost> {
        self.index.get(id).map(|&i| &self.posts[i])
    }

    pub fn translations(&self) -> &Translations {
        &self.translations
    }

    /// Distinct categories in order of first appearance (newest post first)
    pub fn categories(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for post in &self.posts {
            if !seen.contains(&post.category) {
                seen.push(post.category.clone());
            }
        }
        seen
    }
}

fn read_embedded(name: &str) -> Result<String, ContentError> {
    let file = EmbeddedContent::get(name).ok_or_else(|| ContentError::Missing(name.to_string()))?;
    String::from_utf8(file.data.into_owned()).map_err(|e| ContentError::Parse {
        file: name.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Small content set shared by service and API tests

    use super::*;

    pub const POSTS: &str = r#"
posts:
  - id: value-betting-basics
    category: strategy
    image: /static/images/blog/strategy.svg
    read_time: 6
    date: 2024-03-01
    author: Analyst Desk
    title:
      English: Value Betting Basics
      Español: Fundamentos de las apuestas de valor
    excerpt:
      English: Finding prices that beat the market.
    content:
      English: |
        ## What is value?

        A bet has **value** when the price beats the true probability.

        ✅ Compare prices before every bet.

        Read our [odds guide](/blog/reading-odds).
      Español: |
        ## ¿Qué es el valor?

        Una apuesta tiene **valor** cuando la cuota supera la probabilidad real.
    tags: [value, basics]
    related: [reading-odds, bankroll-management]
  - id: reading-odds
    category: education
    image: /static/images/blog/odds.svg
    read_time: 4
    date: 2024-02-10
    author: Analyst Desk
    title:
      English: Reading Odds
    excerpt:
      English: Decimal, fractional and American formats.
    content:
      English: |
        | Format | Example |
        |---|---|
        | Decimal | 2.50 |
    related: []
  - id: bankroll-management
    category: strategy
    image: /static/images/blog/bankroll.svg
    read_time: 5
    date: 2024-04-02
    author: Risk Team
    title:
      English: Bankroll Management
      日本語: 資金管理
    content:
      English: Stake a fixed share of your bankroll.
    related: [value-betting-basics]
  - id: live-betting
    category: strategy
    image: /static/images/blog/live.svg
    read_time: 7
    date: 2023-12-20
    author: Trading Desk
    title:
      English: Live Betting
    content:
      English: Prices move fast in play.
"#;

    pub const I18N: &str = r#"
English:
  site_tagline: Smarter odds
  nav_home: Home
  nav_blog: Blog
  nav_login: Log in
  nav_dashboard: Dashboard
  read_more: Read more
  related_posts: Related articles
  min_read: min read
  back_to_blog: Back to blog
  not_found_title: Article not found
  not_found_message: The article you are looking for does not exist.
  go_home: Go home
  translation_missing: This article is not yet available in your language.
  category_strategy: Strategy
  category_education: Education
Español:
  nav_home: Inicio
  read_more: Leer más
  category_strategy: Estrategia
  not_found_title: Artículo no encontrado
"#;

    pub fn store() -> ContentStore {
        ContentStore::from_yaml(POSTS, I18N).unwrap()
    }
}
