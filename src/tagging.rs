//! Keyword and category tagging.
//!
//! Deterministic first-match semantics: keywords are the vocabulary terms
//! found in the text (vocabulary order, at most five), the category is the
//! first category with any of its terms present. Matching is a
//! case-insensitive substring test.

use crate::models::{EnrichedArticle, MAX_KEYWORDS};
use serde::{Deserialize, Serialize};

/// One category and the terms that select it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Tags assigned to one text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tags {
    pub keywords: Vec<String>,
    pub category: String,
}

#[derive(Debug, Clone)]
struct Term {
    original: String,
    lowered: String,
}

impl Term {
    fn new(s: &str) -> Self {
        Self {
            original: s.to_string(),
            lowered: s.to_lowercase(),
        }
    }
}

/// Matches a fixed vocabulary and category table against article text.
#[derive(Debug, Clone)]
pub struct Tagger {
    vocabulary: Vec<Term>,
    categories: Vec<(String, Vec<Term>)>,
    default_category: String,
}

impl Tagger {
    pub fn new(vocabulary: &[String], categories: &[CategoryRule], default_category: &str) -> Self {
        Self {
            vocabulary: vocabulary
                .iter()
                .filter(|v| !v.trim().is_empty())
                .map(|v| Term::new(v.trim()))
                .collect(),
            categories: categories
                .iter()
                .map(|rule| {
                    (
                        rule.name.clone(),
                        rule.keywords
                            .iter()
                            .filter(|k| !k.trim().is_empty())
                            .map(|k| Term::new(k.trim()))
                            .collect(),
                    )
                })
                .collect(),
            default_category: default_category.to_string(),
        }
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Tag a free-form text.
    pub fn tag(&self, text: &str) -> Tags {
        let haystack = text.to_lowercase();

        let keywords = self
            .vocabulary
            .iter()
            .filter(|term| haystack.contains(&term.lowered))
            .map(|term| term.original.clone())
            .take(MAX_KEYWORDS)
            .collect();

        let category = self
            .categories
            .iter()
            .find(|(_, terms)| terms.iter().any(|t| haystack.contains(&t.lowered)))
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| self.default_category.clone());

        Tags { keywords, category }
    }

    /// Tag an article from its title and summary, storing the result on it.
    pub fn apply(&self, article: &mut EnrichedArticle) {
        let Tags { keywords, category } = self.tag(&article.tagging_text());
        article.set_tags(keywords, category);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn rule(name: &str, keywords: &[&str]) -> CategoryRule {
        CategoryRule {
            name: name.to_string(),
            keywords: strings(keywords),
        }
    }

    #[test]
    fn test_category_first_match() {
        let tagger = Tagger::new(
            &[],
            &[rule("AI 뉴스", &["AI", "인공지능"]), rule("기술", &["스타트업"])],
            "기타",
        );
        assert_eq!(tagger.tag("국내 스타트업 투자 동향").category, "기술");
        assert_eq!(tagger.tag("인공지능 스타트업").category, "AI 뉴스");
    }

    #[test]
    fn test_default_category_when_nothing_matches() {
        let tagger = Tagger::new(&[], &[rule("기술", &["스타트업"])], "AI 뉴스");
        assert_eq!(tagger.tag("weather report").category, "AI 뉴스");
    }

    #[test]
    fn test_keywords_keep_vocabulary_order_and_case() {
        let tagger = Tagger::new(
            &strings(&["OpenAI", "GPT", "LLM", "딥러닝"]),
            &[],
            "AI 뉴스",
        );
        let tags = tagger.tag("딥러닝 and llm news from openai: gpt-5");
        assert_eq!(tags.keywords, strings(&["OpenAI", "GPT", "LLM", "딥러닝"]));
    }

    #[test]
    fn test_keywords_capped_at_five() {
        let vocab = strings(&["a1", "a2", "a3", "a4", "a5", "a6", "a7"]);
        let tagger = Tagger::new(&vocab, &[], "x");
        let tags = tagger.tag("a1 a2 a3 a4 a5 a6 a7");
        assert_eq!(tags.keywords, strings(&["a1", "a2", "a3", "a4", "a5"]));
    }

    #[test]
    fn test_substring_semantics() {
        let tagger = Tagger::new(&strings(&["AI"]), &[], "x");
        assert_eq!(tagger.tag("Said the chair").keywords, strings(&["AI"]));
        assert!(tagger.tag("nothing here").keywords.is_empty());
    }

    #[test]
    fn test_blank_terms_are_ignored() {
        let tagger = Tagger::new(&strings(&["", "  ", "GPT"]), &[rule("x", &[""])], "d");
        assert_eq!(tagger.vocabulary_len(), 1);
        assert_eq!(tagger.tag("anything").category, "d");
    }
}
