// src/models/article.rs

//! Article and avatar reference data structures.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::utils::url::normalize_domain;

/// Avatar used when a feed's domain has no entry in the reference data.
pub const DEFAULT_AVATAR: &str = "https://cos.lhasa.icu/LinksAvatar/default.png";

/// One enriched "latest item" result per source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Article {
    /// Normalized `scheme://host` of the feed's canonical link
    #[serde(rename = "domainName")]
    pub domain_name: String,

    /// Display name (short-name override or raw feed title)
    pub name: String,

    /// Title of the feed's latest item
    pub title: String,

    /// Link to the latest item
    pub link: String,

    /// Publish date formatted as "Month Day, Year"
    pub date: String,

    /// Avatar URL resolved from the reference data
    pub avatar: String,
}

/// One record of the avatar reference data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarEntry {
    #[serde(rename = "domainName")]
    pub domain_name: String,

    pub name: String,

    pub avatar: String,
}

/// Read-only avatar lookup keyed by normalized domain.
///
/// Built once per run before processing starts and shared by all workers.
#[derive(Debug, Default, Clone)]
pub struct AvatarIndex {
    by_domain: HashMap<String, String>,
}

impl AvatarIndex {
    /// Build the index from deserialized reference records.
    ///
    /// Records whose domain fails to normalize are skipped.
    pub fn from_entries(entries: Vec<AvatarEntry>) -> Self {
        let mut by_domain = HashMap::with_capacity(entries.len());
        for entry in entries {
            if let Ok(domain) = normalize_domain(&entry.domain_name) {
                by_domain.insert(domain, entry.avatar);
            }
        }
        Self { by_domain }
    }

    /// Look up an avatar by normalized domain.
    pub fn lookup(&self, domain: &str) -> Option<&str> {
        self.by_domain.get(domain).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_domain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_domain.is_empty()
    }
}

/// The fixed entry appended to every published collection.
pub fn sentinel() -> Article {
    Article {
        domain_name: "https://foreverblog.cn".to_string(),
        name: "十年之约".to_string(),
        title: "穿梭虫洞-随机访问十年之约友链博客".to_string(),
        link: "https://foreverblog.cn/go.html".to_string(),
        date: "January 1, 2000".to_string(),
        avatar: "https://cos.lhasa.icu/LinksAvatar/foreverblog.cn.png".to_string(),
    }
}

/// Map a raw feed title to its short display name.
///
/// Titles without an override pass through verbatim.
pub fn display_name(raw_title: &str) -> &str {
    static OVERRIDES: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    let overrides = OVERRIDES.get_or_init(|| {
        HashMap::from([
            ("obaby@mars", "obaby"),
            ("青山小站 | 一个在帝都搬砖的新时代农民工", "青山小站"),
            ("Homepage on Miao Yu | 于淼", "于淼"),
            ("Homepage on Yihui Xie | 谢益辉", "谢益辉"),
        ])
    });
    overrides.get(raw_title).copied().unwrap_or(raw_title)
}
