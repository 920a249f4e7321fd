//! Keyword and script-detection heuristics.
//!
//! Every function here is a pure predicate over text. Adapters use them to set
//! the `isAI` flag or to filter a feed down to relevant entries, and the
//! enricher uses [`is_latin_script`] to pick titles worth summarizing.
//!
//! These are heuristics, not classifiers: matching is plain case-insensitive
//! substring search against a fixed keyword table, so short keywords such as
//! `"ai"` will also match inside unrelated words ("domain", "said"). Treat the
//! results as hints for ranking, never as ground truth.

/// A fixed, case-insensitive keyword table.
#[derive(Debug, Clone, Copy)]
pub struct KeywordSet {
    keywords: &'static [&'static str],
}

impl KeywordSet {
    pub const fn new(keywords: &'static [&'static str]) -> Self {
        Self { keywords }
    }

    /// True when any keyword occurs in `text`, ignoring case.
    pub fn matches(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.keywords.iter().any(|kw| lower.contains(kw))
    }
}

/// AI relevance for English tech headlines.
pub const AI_NEWS: KeywordSet = KeywordSet::new(&[
    "ai",
    "gpt",
    "llm",
    "openai",
    "anthropic",
    "claude",
    "gemini",
    "mistral",
    "machine learning",
    "deep learning",
    "neural",
    "transformer",
    "agent",
]);

/// AI relevance for Chinese-language business and tech feeds.
pub const CHINA_AI: KeywordSet = KeywordSet::new(&[
    "ai",
    "人工智能",
    "大模型",
    "gpt",
    "智能",
    "机器人",
    "llm",
    "算法",
]);

/// AI relevance for product launches.
pub const AI_PRODUCT: KeywordSet = KeywordSet::new(&[
    "ai",
    "gpt",
    "llm",
    "machine learning",
    "automation",
    "chatbot",
    "copilot",
]);

/// Number of letters inspected by [`is_latin_script`].
const SCRIPT_SAMPLE_LEN: usize = 50;

/// Judge whether a title is written in Latin script.
///
/// Whitespace, digits and punctuation are ignored; the first 50 remaining
/// letters must all be ASCII. A title with no letters at all counts as Latin.
/// Mixed titles such as "GPT-5 发布" fail because the CJK letters are kept in
/// the sample.
pub fn is_latin_script(text: &str) -> bool {
    text.chars()
        .filter(|c| c.is_alphabetic())
        .take(SCRIPT_SAMPLE_LEN)
        .all(|c| c.is_ascii())
}
