use crate::config::KeywordRule;

/// Guesses which entities an entry mentions.
///
/// Implementations return slugs in priority order with no duplicates; the
/// pipeline links every slug returned.
pub trait EntityTagger: Send + Sync {
    fn tag(&self, title: &str, link: &str) -> Vec<String>;
}

/// Literal substring matcher over a fixed keyword vocabulary.
///
/// Matching runs on `lower(title + " " + link)`, so a keyword embedded in an
/// unrelated word or in the URL path still counts. Slugs come out in vocabulary
/// order, deduplicated, truncated to `max_slugs`.
#[derive(Debug, Clone)]
pub struct KeywordTagger {
    rules: Vec<KeywordRule>,
    max_slugs: usize,
}

impl KeywordTagger {
    pub fn new(rules: &[KeywordRule], max_slugs: usize) -> Self {
        let rules = rules
            .iter()
            .map(|r| KeywordRule::new(r.keyword.trim().to_lowercase(), r.slug.trim()))
            .collect();
        Self { rules, max_slugs }
    }
}

impl EntityTagger for KeywordTagger {
    fn tag(&self, title: &str, link: &str) -> Vec<String> {
        let text = format!("{title} {link}").to_lowercase();

        let mut slugs: Vec<String> = Vec::new();
        for rule in &self.rules {
            if slugs.len() == self.max_slugs {
                break;
            }
            if text.contains(&rule.keyword) && !slugs.contains(&rule.slug) {
                slugs.push(rule.slug.clone());
            }
        }
        slugs
    }
}
