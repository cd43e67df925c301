//! Derived views of a generated article: sentiment gauges, keyword weights,
//! the image gallery and text statistics.
//!
//! [`AnalyticsData`] is rebuilt wholesale from each new article and never
//! patched in place. The view helpers below are pure so the UI can call them
//! on every frame.

use serde_json::{Map, Value};

use crate::api::{ArticleImage, GeneratedArticle, Keyword};
use crate::util::{host_label, truncate_chars};

/// Keyword chart shows at most this many entries.
pub const MAX_CHART_KEYWORDS: usize = 10;

/// Gallery labels are cut to this many characters.
pub const GALLERY_LABEL_CHARS: usize = 30;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyticsData {
    pub sentiment: Map<String, Value>,
    pub keywords: Vec<Keyword>,
    pub images: Vec<ArticleImage>,
}

impl AnalyticsData {
    pub fn from_article(article: &GeneratedArticle) -> Self {
        Self {
            sentiment: article.sentiment_analysis.clone(),
            keywords: article.keywords.clone(),
            images: article.images.clone(),
        }
    }

    /// One gauge per numeric sentiment entry, in key order.
    pub fn gauges(&self) -> Vec<SentimentGauge> {
        self.sentiment
            .iter()
            .filter_map(|(key, value)| {
                value.as_f64().map(|raw| SentimentGauge {
                    label: gauge_label(key),
                    raw,
                    value: gauge_value(raw),
                })
            })
            .collect()
    }

    /// Sentiment entries that are not numbers, shown as plain text.
    pub fn sentiment_notes(&self) -> Vec<(String, String)> {
        self.sentiment
            .iter()
            .filter(|(_, value)| !value.is_number())
            .map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (gauge_label(key), text)
            })
            .collect()
    }

    pub fn keyword_bars(&self) -> Vec<KeywordBar> {
        keyword_bars(&self.keywords)
    }

    /// Keywords reported as bare strings, listed as tags next to the chart.
    pub fn keyword_tags(&self) -> impl Iterator<Item = &str> {
        self.keywords
            .iter()
            .filter_map(|k| match k {
                Keyword::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .filter(|label| !label.is_empty())
    }

    pub fn gallery(&self) -> Vec<GalleryCard> {
        self.images.iter().filter_map(GalleryCard::from_image).collect()
    }
}

/// Maps a sentiment score in `[-1, 1]` onto a `[0, 100]` gauge.
///
/// Scores outside the domain are clamped first.
pub fn gauge_value(score: f64) -> f64 {
    (score.clamp(-1.0, 1.0) + 1.0) * 50.0
}

fn gauge_label(key: &str) -> String {
    key.replace('_', " ").to_uppercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentBand {
    Negative,
    Neutral,
    Positive,
}

impl SentimentBand {
    /// Splits the gauge range into equal thirds.
    pub fn of(gauge: f64) -> Self {
        if gauge < 100.0 / 3.0 {
            SentimentBand::Negative
        } else if gauge < 200.0 / 3.0 {
            SentimentBand::Neutral
        } else {
            SentimentBand::Positive
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentimentGauge {
    pub label: String,
    pub raw: f64,
    pub value: f64,
}

impl SentimentGauge {
    pub fn band(&self) -> SentimentBand {
        SentimentBand::of(self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordBar {
    pub label: String,
    pub weight: u64,
}

/// The first [`MAX_CHART_KEYWORDS`] keywords with positional weights: the
/// first gets N (the number shown), each following one a step less.
pub fn keyword_bars(keywords: &[Keyword]) -> Vec<KeywordBar> {
    let shown = &keywords[..keywords.len().min(MAX_CHART_KEYWORDS)];
    let n = shown.len() as u64;
    shown
        .iter()
        .enumerate()
        .map(|(i, keyword)| KeywordBar {
            label: keyword.label().into_owned(),
            weight: n - i as u64,
        })
        .collect()
}

/// Display form of one gallery image. Truncation applies to the labels only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryCard {
    pub url: String,
    pub title: String,
    pub source: String,
}

impl GalleryCard {
    fn from_image(image: &ArticleImage) -> Option<Self> {
        let url = image.url.as_deref().filter(|u| !u.trim().is_empty())?;
        let title = image
            .title
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|t| truncate_chars(t, GALLERY_LABEL_CHARS).into_owned())
            .unwrap_or_else(|| "Image".to_owned());
        let source = image
            .source
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .or_else(|| host_label(url))
            .map(|s| truncate_chars(&s, GALLERY_LABEL_CHARS).into_owned())
            .unwrap_or_default();
        Some(Self {
            url: url.to_owned(),
            title,
            source,
        })
    }
}

/// Word, character and line counts of article text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArticleStats {
    pub words: usize,
    pub characters: usize,
    pub lines: usize,
}

impl ArticleStats {
    pub fn of(text: &str) -> Self {
        Self {
            words: word_count(text),
            characters: text.chars().count(),
            lines: text.split('\n').count(),
        }
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    fn article(value: Value) -> GeneratedArticle {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_gauge_value_scaling() {
        assert_eq!(gauge_value(0.5), 75.0);
        assert_eq!(gauge_value(-1.0), 0.0);
        assert_eq!(gauge_value(1.0), 100.0);
        assert_eq!(gauge_value(0.0), 50.0);
    }

    #[test]
    fn test_gauge_value_clamps() {
        assert_eq!(gauge_value(3.0), 100.0);
        assert_eq!(gauge_value(-7.5), 0.0);
    }

    #[test]
    fn test_bands() {
        assert_eq!(SentimentBand::of(0.0), SentimentBand::Negative);
        assert_eq!(SentimentBand::of(33.0), SentimentBand::Negative);
        assert_eq!(SentimentBand::of(50.0), SentimentBand::Neutral);
        assert_eq!(SentimentBand::of(66.0), SentimentBand::Neutral);
        assert_eq!(SentimentBand::of(75.0), SentimentBand::Positive);
        assert_eq!(SentimentBand::of(100.0), SentimentBand::Positive);
    }

    #[test]
    fn test_gauges_skip_non_numeric() {
        let data = AnalyticsData::from_article(&article(json!({
            "content": "x",
            "sentiment_analysis": {"overall_score": 0.5, "label": "positive"}
        })));
        let gauges = data.gauges();
        assert_eq!(gauges.len(), 1);
        assert_eq!(gauges[0].label, "OVERALL SCORE");
        assert_eq!(gauges[0].value, 75.0);
        assert_eq!(gauges[0].band(), SentimentBand::Positive);
        assert_eq!(
            data.sentiment_notes(),
            vec![("LABEL".to_string(), "positive".to_string())]
        );
    }

    #[test]
    fn test_twelve_keywords_weighted() {
        let keywords: Vec<Keyword> = (1..=12).map(|i| Keyword::Text(format!("k{i}"))).collect();
        let bars = keyword_bars(&keywords);
        assert_eq!(bars.len(), 10);
        assert_eq!(bars[0].label, "k1");
        assert_eq!(bars[9].label, "k10");
        let weights: Vec<u64> = bars.iter().map(|b| b.weight).collect();
        assert_eq!(weights, (1..=10).rev().collect::<Vec<u64>>());
    }

    #[test]
    fn test_few_keywords_weighted_by_count() {
        let keywords = vec![Keyword::Text("a".into()), Keyword::Text("b".into())];
        let weights: Vec<u64> = keyword_bars(&keywords).iter().map(|b| b.weight).collect();
        assert_eq!(weights, vec![2, 1]);
        assert!(keyword_bars(&[]).is_empty());
    }

    #[test]
    fn test_gallery_skips_missing_urls_and_truncates() {
        let long = "t".repeat(40);
        let data = AnalyticsData::from_article(&article(json!({
            "content": "x",
            "images": [
                {"title": "no url"},
                {"url": "", "title": "empty url"},
                {"url": "https://www.cdn.example/a.png", "title": long},
                {"url": "https://img.example/b.png", "source": "Agence TAP"}
            ]
        })));
        let cards = data.gallery();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].title, format!("{}...", "t".repeat(30)));
        assert_eq!(cards[0].source, "cdn.example");
        assert_eq!(cards[1].title, "Image");
        assert_eq!(cards[1].source, "Agence TAP");

        // Stored data is untouched.
        assert_eq!(data.images[2].title.as_deref().map(str::len), Some(40));
    }

    #[test]
    fn test_keyword_tags_plain_only() {
        let data = AnalyticsData::from_article(&article(json!({
            "content": "x",
            "keywords": ["5G", {"keyword": "fiber"}, ""]
        })));
        assert_eq!(data.keyword_tags().collect::<Vec<_>>(), vec!["5G"]);
    }

    #[test]
    fn test_empty_article_has_empty_views() {
        let data = AnalyticsData::from_article(&article(json!({"content": ""})));
        assert!(data.gauges().is_empty());
        assert!(data.keyword_bars().is_empty());
        assert!(data.gallery().is_empty());
    }

    #[test]
    fn test_stats() {
        let stats = ArticleStats::of("# Title\n\nTwo  words\n");
        assert_eq!(stats.words, 4);
        assert_eq!(stats.characters, 20);
        assert_eq!(stats.lines, 4);
        assert_eq!(ArticleStats::of("").lines, 1);
    }

    proptest! {
        #[test]
        fn prop_gauge_in_range(score in proptest::num::f64::NORMAL) {
            let v = gauge_value(score);
            prop_assert!((0.0..=100.0).contains(&v));
        }

        #[test]
        fn prop_bar_count_bounded(n in 0usize..40) {
            let keywords: Vec<Keyword> = (0..n).map(|i| Keyword::Text(i.to_string())).collect();
            let bars = keyword_bars(&keywords);
            prop_assert_eq!(bars.len(), n.min(MAX_CHART_KEYWORDS));
            if let Some(first) = bars.first() {
                prop_assert_eq!(first.weight, bars.len() as u64);
                prop_assert_eq!(bars.last().map(|b| b.weight), Some(1));
            }
        }
    }
}
