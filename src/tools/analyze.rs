//! Text analysis tool: sentiment, keywords, summary.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::Tool;

const POSITIVE_WORDS: &[&str] = &[
    "good",
    "great",
    "excellent",
    "amazing",
    "wonderful",
    "love",
    "like",
];

const NEGATIVE_WORDS: &[&str] = &["bad", "terrible", "awful", "hate", "dislike", "poor"];

const SUMMARY_LIMIT: usize = 100;
const TOP_KEYWORDS: usize = 5;

/// Analyze text for sentiment, keywords, or a short summary.
pub struct AnalyzeText;

#[async_trait]
impl Tool for AnalyzeText {
    fn name(&self) -> &str {
        "analyze_text"
    }

    fn description(&self) -> &str {
        "Analyze text for sentiment, keywords, or produce a short summary with word and character counts."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "The text to analyze"
                },
                "analysis_type": {
                    "type": "string",
                    "enum": ["sentiment", "keywords", "summary"],
                    "description": "Type of analysis to perform"
                }
            },
            "required": ["text", "analysis_type"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let text = args["text"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'text' argument"))?;
        let analysis_type = args["analysis_type"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'analysis_type' argument"))?;

        let word_count = text.split_whitespace().count();
        let char_count = text.chars().count();

        let analysis = match analysis_type {
            "sentiment" => sentiment(text),
            "keywords" => keywords(text),
            "summary" => summary(text, word_count, char_count),
            other => anyhow::bail!("unsupported analysis type: {}", other),
        };

        Ok(json!({
            "text": text,
            "analysis_type": analysis_type,
            "word_count": word_count,
            "char_count": char_count,
            "analysis": analysis,
        }))
    }
}

/// Lexicon-based sentiment: count membership, compare, ties are neutral.
fn sentiment(text: &str) -> Value {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();

    let positive = words
        .iter()
        .filter(|w| POSITIVE_WORDS.contains(*w))
        .count();
    let negative = words
        .iter()
        .filter(|w| NEGATIVE_WORDS.contains(*w))
        .count();

    let label = if positive > negative {
        "positive"
    } else if negative > positive {
        "negative"
    } else {
        "neutral"
    };

    json!({
        "sentiment": label,
        "positive_score": positive,
        "negative_score": negative,
    })
}

/// Case-folded word frequency; top 5 by descending count, ties broken by
/// first occurrence.
fn keywords(text: &str) -> Value {
    let lowered = text.to_lowercase();

    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (position, word) in lowered.split_whitespace().enumerate() {
        let entry = counts.entry(word).or_insert((0, position));
        entry.0 += 1;
    }

    let mut ranked: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(word, (count, first))| (word, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    let top: Vec<Value> = ranked
        .into_iter()
        .take(TOP_KEYWORDS)
        .map(|(word, count, _)| json!({"word": word, "count": count}))
        .collect();

    json!({ "top_words": top })
}

fn summary(text: &str, word_count: usize, char_count: usize) -> Value {
    let summary = if char_count > SUMMARY_LIMIT {
        let truncated: String = text.chars().take(SUMMARY_LIMIT).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    };

    json!({
        "summary": summary,
        "word_count": word_count,
        "char_count": char_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn analyze(text: &str, analysis_type: &str) -> Value {
        AnalyzeText
            .execute(json!({"text": text, "analysis_type": analysis_type}))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn detects_positive_sentiment() {
        let result = analyze("This is great and wonderful", "sentiment").await;
        assert_eq!(result["analysis"]["sentiment"], "positive");
        assert_eq!(result["analysis"]["positive_score"], 2);
        assert_eq!(result["analysis"]["negative_score"], 0);
    }

    #[tokio::test]
    async fn sentiment_tie_is_neutral() {
        let result = analyze("great but terrible", "sentiment").await;
        assert_eq!(result["analysis"]["sentiment"], "neutral");
        assert_eq!(result["analysis"]["positive_score"], 1);
        assert_eq!(result["analysis"]["negative_score"], 1);
    }

    #[tokio::test]
    async fn sentiment_is_case_folded() {
        let result = analyze("GREAT stuff", "sentiment").await;
        assert_eq!(result["analysis"]["sentiment"], "positive");
    }

    #[tokio::test]
    async fn keywords_rank_by_count_then_first_occurrence() {
        let result = analyze("beta alpha beta gamma alpha beta delta", "keywords").await;
        let top = result["analysis"]["top_words"].as_array().unwrap();

        assert_eq!(top[0]["word"], "beta");
        assert_eq!(top[0]["count"], 3);
        assert_eq!(top[1]["word"], "alpha");
        assert_eq!(top[1]["count"], 2);
        // gamma and delta both appear once; gamma came first.
        assert_eq!(top[2]["word"], "gamma");
        assert_eq!(top[3]["word"], "delta");
    }

    #[tokio::test]
    async fn keywords_cap_at_five() {
        let result = analyze("a b c d e f g", "keywords").await;
        let top = result["analysis"]["top_words"].as_array().unwrap();
        assert_eq!(top.len(), 5);
    }

    #[tokio::test]
    async fn summary_truncates_long_text_with_marker() {
        let text = "x".repeat(150);
        let result = analyze(&text, "summary").await;
        let summary = result["analysis"]["summary"].as_str().unwrap();

        assert_eq!(summary.chars().count(), 103);
        assert!(summary.ends_with("..."));
        assert_eq!(result["char_count"], 150);
    }

    #[tokio::test]
    async fn summary_keeps_short_text_intact() {
        let result = analyze("short text", "summary").await;
        assert_eq!(result["analysis"]["summary"], "short text");
        assert_eq!(result["word_count"], 2);
    }
}
