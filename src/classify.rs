//! Bucket classification and ranking.
//!
//! The deduplicated corpus is cut into named buckets by a fixed, ordered table
//! of [`BucketRule`]s. Every rule is applied to the whole corpus on its own:
//! filter by predicate, stable-sort by the rule's key, keep the first `limit`.
//! Buckets are therefore independent and may share items.
//!
//! Bucket names are the keys the display layer reads from the snapshot.

use crate::models::{Category, Item};
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

/// Hacker News stories above this score qualify for `mustRead` even without
/// an `ai-news` category.
pub const HEADLINE_MIN_SCORE: u64 = 100;

/// One row of the policy table.
#[derive(Debug, Clone, Copy)]
pub struct BucketRule {
    pub name: &'static str,
    pub predicate: fn(&Item) -> bool,
    /// `None` keeps corpus order.
    pub sort_key: Option<fn(&Item) -> i64>,
    pub descending: bool,
    pub limit: usize,
}

impl BucketRule {
    /// Filter, stable-sort and truncate `corpus` according to this rule.
    pub fn apply(&self, corpus: &[Item]) -> Vec<Item> {
        let mut picked: Vec<Item> = corpus
            .iter()
            .filter(|i| (self.predicate)(i))
            .cloned()
            .collect();
        if let Some(key) = self.sort_key {
            // `sort_by` is stable, so equal keys keep corpus order in both directions.
            if self.descending {
                picked.sort_by(|a, b| key(b).cmp(&key(a)));
            } else {
                picked.sort_by(|a, b| key(a).cmp(&key(b)));
            }
        }
        picked.truncate(self.limit);
        picked
    }
}

/// The main page: headline stories, tools, products, practice, China, papers.
pub const DAILY_RULES: &[BucketRule] = &[
    BucketRule {
        name: "mustRead",
        predicate: is_headline,
        sort_key: Some(by_score),
        descending: true,
        limit: 5,
    },
    BucketRule {
        name: "tools",
        predicate: is_tool,
        sort_key: Some(by_time),
        descending: true,
        limit: 12,
    },
    BucketRule {
        name: "products",
        predicate: is_product,
        sort_key: None,
        descending: false,
        limit: 8,
    },
    BucketRule {
        name: "practice",
        predicate: is_practice,
        sort_key: Some(by_reactions),
        descending: true,
        limit: 8,
    },
    BucketRule {
        name: "china",
        predicate: is_regional,
        sort_key: Some(by_time),
        descending: true,
        limit: 8,
    },
    BucketRule {
        name: "papers",
        predicate: is_paper,
        sort_key: None,
        descending: false,
        limit: 10,
    },
];

/// Overflow: general tech stories that did not make the AI cut.
pub const EXTRA_RULES: &[BucketRule] = &[BucketRule {
    name: "techNews",
    predicate: is_general_tech,
    sort_key: Some(by_score),
    descending: true,
    limit: 10,
}];

fn is_headline(item: &Item) -> bool {
    item.category == Category::AiNews
        || (item.source == "Hacker News" && item.is_ai() && item.score_or_zero() > HEADLINE_MIN_SCORE)
}

fn is_tool(item: &Item) -> bool {
    matches!(item.category, Category::Github | Category::AiTool)
}

fn is_product(item: &Item) -> bool {
    item.category == Category::AiProduct || item.source == "Product Hunt"
}

fn is_practice(item: &Item) -> bool {
    item.category == Category::Practice
}

fn is_regional(item: &Item) -> bool {
    item.is_china() || item.category == Category::ChinaAi
}

fn is_paper(item: &Item) -> bool {
    item.category == Category::Paper
}

fn is_general_tech(item: &Item) -> bool {
    item.source == "Hacker News" && !item.is_ai()
}

fn saturating_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

fn by_score(item: &Item) -> i64 {
    saturating_i64(item.score_or_zero())
}

fn by_reactions(item: &Item) -> i64 {
    saturating_i64(item.reactions_or_zero())
}

fn by_time(item: &Item) -> i64 {
    item.time
}

/// A named, ordered, bounded view over the corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub name: &'static str,
    pub items: Vec<Item>,
}

/// Buckets in policy-table order. Serializes as a JSON object keyed by
/// bucket name, keeping table order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Buckets(Vec<Bucket>);

impl Buckets {
    pub fn get(&self, name: &str) -> Option<&[Item]> {
        self.0
            .iter()
            .find(|b| b.name == name)
            .map(|b| b.items.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bucket> {
        self.0.iter()
    }

    /// Every item in every bucket, for in-place updates.
    pub fn items_mut(&mut self) -> impl Iterator<Item = &mut Item> {
        self.0.iter_mut().flat_map(|b| b.items.iter_mut())
    }
}

impl Serialize for Buckets {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for bucket in &self.0 {
            map.serialize_entry(bucket.name, &bucket.items)?;
        }
        map.end()
    }
}

/// Apply every rule in `rules` to `corpus`.
pub fn classify(corpus: &[Item], rules: &[BucketRule]) -> Buckets {
    Buckets(
        rules
            .iter()
            .map(|rule| {
                let items = rule.apply(corpus);
                debug!(bucket = rule.name, count = items.len(), "Filled bucket");
                Bucket {
                    name: rule.name,
                    items,
                }
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, source: &str, category: Category) -> Item {
        Item::new(id, id, format!("https://x/{id}"), source, category, 0)
    }

    fn hn(id: &str, score: u64, is_ai: bool) -> Item {
        let mut i = item(
            id,
            "Hacker News",
            if is_ai { Category::AiNews } else { Category::Tech },
        );
        i.score = Some(score);
        i.is_ai = Some(is_ai);
        i
    }

    fn rule(name: &str) -> BucketRule {
        *DAILY_RULES
            .iter()
            .chain(EXTRA_RULES)
            .find(|r| r.name == name)
            .unwrap()
    }

    fn ids(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    fn mixed_corpus() -> Vec<Item> {
        let mut corpus = Vec::new();
        for n in 0..20u64 {
            corpus.push(hn(&format!("hn-ai-{n}"), n * 17 % 50, true));
            corpus.push(hn(&format!("hn-tech-{n}"), n * 13 % 40, false));
            let mut gh = item(&format!("gh-{n}"), "GitHub", Category::Github);
            gh.time = (n % 4) as i64;
            corpus.push(gh);
            let mut dev = item(&format!("devto-{n}"), "Dev.to", Category::Practice);
            dev.reactions = if n % 3 == 0 { None } else { Some(n % 5) };
            corpus.push(dev);
            let mut cn = item(&format!("jqzx-{n}"), "机器之心", Category::ChinaAi);
            cn.is_china = Some(true);
            cn.time = (n % 6) as i64;
            corpus.push(cn);
            corpus.push(item(&format!("arxiv-{n}"), "arXiv", Category::Paper));
            corpus.push(item(&format!("ph-{n}"), "Product Hunt", Category::AiProduct));
            corpus.push(item(&format!("hf-{n}"), "Hugging Face", Category::AiTool));
        }
        corpus
    }

    #[test]
    fn test_every_bucket_respects_limit_and_predicate() {
        let corpus = mixed_corpus();
        for rule in DAILY_RULES.iter().chain(EXTRA_RULES) {
            let items = rule.apply(&corpus);
            assert!(items.len() <= rule.limit, "{} over limit", rule.name);
            assert_eq!(items.len(), rule.limit, "{} should be full", rule.name);
            assert!(items.iter().all(|i| (rule.predicate)(i)), "{}", rule.name);
        }
    }

    #[test]
    fn test_descending_buckets_are_sorted_and_stable() {
        let corpus = mixed_corpus();
        for rule in DAILY_RULES.iter().chain(EXTRA_RULES) {
            let Some(key) = rule.sort_key else { continue };
            let items = rule.apply(&corpus);
            for pair in items.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                assert!(key(a) >= key(b), "{} not descending", rule.name);
                if key(a) == key(b) {
                    let pos = |x: &Item| corpus.iter().position(|c| c.id == x.id).unwrap();
                    assert!(pos(a) < pos(b), "{} tie order broken", rule.name);
                }
            }
        }
    }

    #[test]
    fn test_source_order_buckets_keep_corpus_order() {
        let corpus = mixed_corpus();
        let papers = rule("papers").apply(&corpus);
        let expected: Vec<String> = (0..10).map(|n| format!("arxiv-{n}")).collect();
        assert_eq!(ids(&papers), expected.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn test_must_read_ranks_by_score() {
        let corpus = vec![hn("a", 10, true), hn("b", 300, true), hn("c", 300, true), hn("d", 5, false)];
        let out = rule("mustRead").apply(&corpus);
        assert_eq!(ids(&out), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_must_read_admits_high_scoring_ai_story_outside_ai_news() {
        let mut story = hn("tagged-tech", 150, true);
        story.category = Category::Tech;
        let mut low = hn("low", 50, true);
        low.category = Category::Tech;
        let out = rule("mustRead").apply(&[story, low]);
        assert_eq!(ids(&out), vec!["tagged-tech"]);
    }

    #[test]
    fn test_missing_reactions_sort_as_zero() {
        let mut a = item("a", "Dev.to", Category::Practice);
        a.reactions = None;
        let mut b = item("b", "Dev.to", Category::Practice);
        b.reactions = Some(1);
        let c = item("c", "InfoQ", Category::Practice);
        let out = rule("practice").apply(&[a, b, c]);
        assert_eq!(ids(&out), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_buckets_are_non_exclusive() {
        // An InfoQ article is both practice and regional.
        let mut infoq = item("infoq-1", "InfoQ", Category::Practice);
        infoq.is_china = Some(true);
        let buckets = classify(&[infoq], DAILY_RULES);
        assert_eq!(buckets.get("practice").unwrap().len(), 1);
        assert_eq!(buckets.get("china").unwrap().len(), 1);
    }

    #[test]
    fn test_tech_news_excludes_ai_stories() {
        let corpus = vec![hn("ai", 500, true), hn("plain", 1, false)];
        let buckets = classify(&corpus, EXTRA_RULES);
        assert_eq!(ids(buckets.get("techNews").unwrap()), vec!["plain"]);
    }

    #[test]
    fn test_empty_corpus_gives_empty_buckets_with_all_names() {
        let buckets = classify(&[], DAILY_RULES);
        let json = serde_json::to_value(&buckets).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), DAILY_RULES.len());
        for rule in DAILY_RULES {
            assert_eq!(obj[rule.name], serde_json::json!([]));
        }
    }

    #[test]
    fn test_buckets_serialize_in_table_order() {
        let buckets = classify(&[], DAILY_RULES);
        let json = serde_json::to_string(&buckets).unwrap();
        let positions: Vec<usize> = DAILY_RULES
            .iter()
            .map(|r| json.find(&format!("\"{}\"", r.name)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_items_mut_reaches_every_copy() {
        let mut infoq = item("infoq-1", "InfoQ", Category::Practice);
        infoq.is_china = Some(true);
        let mut buckets = classify(&[infoq], DAILY_RULES);
        for i in buckets.items_mut() {
            i.ai_summary = Some("s".to_string());
        }
        assert!(buckets.iter().flat_map(|b| &b.items).all(|i| i.ai_summary.is_some()));
    }
}
