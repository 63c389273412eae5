use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;

/// 支持的站点
///
/// 三个站点使用同一套页面结构，只有域名不同
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    Natomanga,
    Mangakakalot,
    Nelomanga,
}

impl Site {
    /// 站点根地址，也用作 Referer
    pub fn base_url(self) -> &'static str {
        match self {
            Site::Natomanga => "https://www.natomanga.com",
            Site::Mangakakalot => "https://mangakakalot.gg",
            Site::Nelomanga => "https://nelomanga.net",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Site::Natomanga => "natomanga",
            Site::Mangakakalot => "mangakakalot",
            Site::Nelomanga => "nelomanga",
        }
    }

    pub fn all() -> [Site; 3] {
        [Site::Natomanga, Site::Mangakakalot, Site::Nelomanga]
    }

    /// 根据 URL 的域名推断站点
    pub fn detect(url: &str) -> Option<Self> {
        Self::all()
            .into_iter()
            .find(|site| url.contains(site.name()))
    }
}

impl FromStr for Site {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::all()
            .into_iter()
            .find(|site| site.name() == wanted)
            .ok_or_else(|| ScrapeError::UnknownSite(s.to_string()))
    }
}

impl std::fmt::Display for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("NeloManga".parse::<Site>().unwrap(), Site::Nelomanga);
        assert!(matches!(
            "mangadex".parse::<Site>(),
            Err(ScrapeError::UnknownSite(_))
        ));
    }

    #[test]
    fn detects_site_from_url() {
        assert_eq!(
            Site::detect("https://www.natomanga.com/manga/one-piece"),
            Some(Site::Natomanga)
        );
        assert_eq!(Site::detect("https://example.com/x"), None);
    }
}
