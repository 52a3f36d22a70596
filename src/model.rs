use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Structured summary returned by the summarizer. All fields absent means
/// the analysis was skipped or failed; it then serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<String>,
}

impl AiAnalysis {
    pub fn is_empty(&self) -> bool {
        self.general_summary.is_none() && self.main_subject.is_none() && self.target_audience.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeDossier {
    pub url: String,
    pub title: String,
    pub h1: String,
    pub meta_description: String,
    pub meta_keywords: Vec<String>,
    pub emails: BTreeSet<String>,
    pub social_links: BTreeSet<String>,
    pub ctas: BTreeSet<String>,
    pub word_count: usize,
    pub ai_analysis: AiAnalysis,
    pub detected_technologies: Vec<String>,
}

impl HomeDossier {
    /// Final assembly of the home dossier once analysis and detection have run.
    pub fn compile(page: HomePage, ai_analysis: AiAnalysis, detected_technologies: Vec<String>) -> Self {
        HomeDossier {
            url: page.url,
            title: page.title,
            h1: page.h1,
            meta_description: page.meta_description,
            meta_keywords: page.meta_keywords,
            emails: page.emails,
            social_links: page.social_links,
            ctas: page.ctas,
            word_count: page.word_count,
            ai_analysis,
            detected_technologies,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubpageDossier {
    pub visited_url: String,
    pub title: String,
    pub heading_map: Vec<String>,
}

/// The payload stored in the cache and handed back to callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeResult {
    pub home: HomeDossier,
    pub subpages: Vec<SubpageDossier>,
}

/// Page-level fields pulled from the home markup, before analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HomePage {
    pub url: String,
    pub title: String,
    pub h1: String,
    pub meta_description: String,
    pub meta_keywords: Vec<String>,
    pub emails: BTreeSet<String>,
    pub social_links: BTreeSet<String>,
    pub ctas: BTreeSet<String>,
    pub word_count: usize,
    pub text: String,
}

// ── Tests ──
