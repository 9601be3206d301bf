//! Offline pattern mining over approved exemplar messages.
//!
//! Groups exemplars by their primary category and distills each group into
//! one [`CategoryPattern`]: frequent variables, characteristic vocabulary,
//! common buttons, length statistics, and usage rates. Patterns are pure
//! derived data; re-mining after an exemplar reload replaces them.


use crate::config::KeywordConfig;
use crate::validator::extract_variables;
use itertools::Itertools;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::LazyLock;
use tracing::{debug, info};

static KOREAN_WORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    #[expect(clippy::unwrap_used, reason = "pattern is a compile-time constant")]
    Regex::new(r"[가-힣]+").unwrap()
});

/// One approved message as loaded from the exemplar corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExemplarRecord {
    pub source_id: String,
    pub text: String,
    pub category_1: String,
    pub category_2: String,
    pub business_type: String,
    pub service_type: String,
    /// `None` when the message carries no button.
    pub button: Option<String>,
}

/// Derived structure of one exemplar, computed from its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExemplarStructure {
    pub length: usize,
    pub variables: Vec<String>,
    pub has_greeting: bool,
    pub has_button_mention: bool,
    pub has_contact: bool,
    pub is_formal: bool,
    pub length_band: LengthBand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthBand {
    Short,
    Medium,
    Long,
}

impl LengthBand {
    #[inline]
    pub fn of(length: usize) -> Self {
        if length <= 80 {
            Self::Short
        } else if length <= 150 {
            Self::Medium
        } else {
            Self::Long
        }
    }

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
        }
    }
}

/// Usage rates across one category's exemplars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessIndicators {
    /// Fraction of exemplars that open with a greeting.
    pub greeting_usage: f64,
    /// Mean variable occurrences per exemplar.
    pub variable_usage: f64,
    /// Fraction of exemplars that carry a button.
    pub button_usage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthRange {
    pub min: usize,
    pub max: usize,
}

/// The mined pattern for one primary category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPattern {
    pub category: String,
    pub template_count: usize,
    /// Top variables by occurrence, most frequent first.
    pub common_variables: Vec<(String, u32)>,
    /// Top non-stopword Korean words, most frequent first.
    pub characteristic_words: Vec<(String, u32)>,
    /// Top button labels, most frequent first.
    pub common_buttons: Vec<(String, u32)>,
    pub avg_length: usize,
    pub length_range: LengthRange,
    pub success_indicators: SuccessIndicators,
}

/// Frequency counter that remembers first-seen order, so ties rank by
/// first appearance in the corpus.
#[derive(Debug, Default)]
struct OrderedCounter {
    order: Vec<String>,
    counts: HashMap<String, u32>,
}

impl OrderedCounter {
    fn add(&mut self, key: &str) {
        match self.counts.get_mut(key) {
            Some(count) => *count += 1,
            None => {
                self.order.push(key.to_string());
                self.counts.insert(key.to_string(), 1);
            }
        }
    }

    fn total(&self) -> u64 {
        self.counts.values().map(|&c| u64::from(c)).sum()
    }

    /// Entries sorted by count descending; stable sort keeps first-seen
    /// order among equal counts.
    fn most_common(&self, limit: usize) -> Vec<(String, u32)> {
        let mut entries: Vec<(String, u32)> = self
            .order
            .iter()
            .map(|key| (key.clone(), self.counts.get(key).copied().unwrap_or(0)))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(limit);
        entries
    }
}

pub struct PatternMiner {
    keywords: KeywordConfig,
}

impl PatternMiner {
    #[inline]
    pub fn new(keywords: KeywordConfig) -> Self {
        Self { keywords }
    }

    /// Analyze one exemplar's text structure.
    #[inline]
    pub fn analyze_structure(&self, record: &ExemplarRecord) -> ExemplarStructure {
        let text = record.text.as_str();
        let length = text.chars().count();
        let contains_any = |keywords: &[String]| keywords.iter().any(|k| text.contains(k.as_str()));

        ExemplarStructure {
            length,
            variables: extract_variables(text),
            has_greeting: contains_any(&self.keywords.greeting),
            has_button_mention: contains_any(&self.keywords.button_mention),
            has_contact: contains_any(&self.keywords.contact),
            is_formal: contains_any(&self.keywords.politeness),
            length_band: LengthBand::of(length),
        }
    }

    /// Mine one pattern per primary category. Categories keep corpus order;
    /// a category with no exemplars never appears.
    pub fn mine(&self, exemplars: &[ExemplarRecord]) -> Vec<CategoryPattern> {
        info!("Mining patterns from {} exemplars", exemplars.len());

        let mut groups: Vec<PendingGroup> = Vec::new();
        for record in exemplars {
            match groups
                .iter_mut()
                .find(|group| group.category == record.category_1)
            {
                Some(group) => group.records.push(record),
                None => groups.push(PendingGroup {
                    category: record.category_1.clone(),
                    records: vec![record],
                }),
            }
        }

        groups
            .into_iter()
            .map(|group| self.mine_category(&group.category, &group.records))
            .collect()
    }

    fn mine_category(&self, category: &str, records: &[&ExemplarRecord]) -> CategoryPattern {
        let mut variables = OrderedCounter::default();
        let mut words = OrderedCounter::default();
        let mut buttons = OrderedCounter::default();

        let mut lengths = Vec::with_capacity(records.len());
        let mut greeting_count = 0_usize;
        let mut button_count = 0_usize;

        for record in records {
            let structure = self.analyze_structure(record);

            for variable in &structure.variables {
                variables.add(variable);
            }
            for word in KOREAN_WORD_PATTERN.find_iter(&record.text) {
                let word = word.as_str();
                if word.chars().count() > 1 && !self.is_stopword(word) {
                    words.add(word);
                }
            }
            if let Some(button) = &record.button {
                buttons.add(button);
            }

            lengths.push(structure.length);
            if structure.has_greeting {
                greeting_count += 1;
            }
            if record.button.is_some() {
                button_count += 1;
            }
        }

        let count = records.len();
        let total_length: usize = lengths.iter().sum();
        let min_length = lengths.iter().copied().min().unwrap_or(0);
        let max_length = lengths.iter().copied().max().unwrap_or(0);
        let variable_occurrences = variables.total();

        debug!(
            "Category '{}': {} exemplars, {} variable occurrences",
            category, count, variable_occurrences
        );

        CategoryPattern {
            category: category.to_string(),
            template_count: count,
            common_variables: variables.most_common(5),
            characteristic_words: words.most_common(5),
            common_buttons: buttons.most_common(3),
            avg_length: if count == 0 { 0 } else { total_length / count },
            length_range: LengthRange {
                min: min_length,
                max: max_length,
            },
            success_indicators: SuccessIndicators {
                greeting_usage: ratio(greeting_count, count),
                variable_usage: if count == 0 {
                    0.0
                } else {
                    variable_occurrences as f64 / count as f64
                },
                button_usage: ratio(button_count, count),
            },
        }
    }

    fn is_stopword(&self, word: &str) -> bool {
        self.keywords.stopwords.iter().any(|s| s == word)
    }
}

struct PendingGroup<'a> {
    category: String,
    records: Vec<&'a ExemplarRecord>,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn format_counts(entries: &[(String, u32)]) -> String {
    if entries.is_empty() {
        return "없음".to_string();
    }
    entries
        .iter()
        .map(|(key, count)| format!("- {}: {}", key, count))
        .join("\n")
}

impl CategoryPattern {
    /// Render the pattern as the searchable document stored alongside the
    /// exemplars.
    pub fn render_text(&self) -> String {
        let mut text = String::new();
        let _ = writeln!(text, "카테고리: {}", self.category);
        let _ = writeln!(text, "템플릿 수: {}개", self.template_count);
        text.push('\n');
        let _ = writeln!(text, "주요 변수:");
        let _ = writeln!(text, "{}", format_counts(&self.common_variables));
        text.push('\n');
        let _ = writeln!(text, "특징적 단어:");
        let _ = writeln!(text, "{}", format_counts(&self.characteristic_words));
        text.push('\n');
        let _ = writeln!(text, "일반적 버튼:");
        let _ = writeln!(text, "{}", format_counts(&self.common_buttons));
        text.push('\n');
        let _ = writeln!(text, "평균 길이: {}자", self.avg_length);
        let _ = writeln!(
            text,
            "길이 범위: {}-{}자",
            self.length_range.min, self.length_range.max
        );
        text.push('\n');
        let _ = writeln!(text, "성공 지표:");
        let _ = writeln!(
            text,
            "- 인사말 사용률: {:.1}%",
            self.success_indicators.greeting_usage * 100.0
        );
        let _ = writeln!(
            text,
            "- 변수 사용률: {:.1}",
            self.success_indicators.variable_usage
        );
        let _ = write!(
            text,
            "- 버튼 사용률: {:.1}%",
            self.success_indicators.button_usage * 100.0
        );
        text
    }

    /// Variables this pattern names, in ranked order.
    #[inline]
    pub fn variable_names(&self) -> Vec<String> {
        self.common_variables
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Recover the ranked variable list from a rendered pattern document.
/// Inverse of the `주요 변수` section of [`CategoryPattern::render_text`].
pub fn parse_common_variables(rendered: &str) -> Vec<(String, u32)> {
    let mut variables = Vec::new();
    let mut in_section = false;

    for line in rendered.lines() {
        if line.trim() == "주요 변수:" {
            in_section = true;
            continue;
        }
        if in_section {
            let line = line.trim();
            if line.is_empty() || line == "없음" {
                break;
            }
            let Some(entry) = line.strip_prefix("- ") else {
                break;
            };
            if let Some((name, count)) = entry.rsplit_once(": ") {
                if let Ok(count) = count.parse::<u32>() {
                    variables.push((name.to_string(), count));
                    continue;
                }
            }
            break;
        }
    }

    variables
}

/// Render the enhanced searchable document for one exemplar. The raw
/// message text stays in metadata; this rendering is what gets embedded.
pub fn exemplar_document(record: &ExemplarRecord, structure: &ExemplarStructure) -> String {
    let greeting_note = if structure.has_greeting {
        "인사말 포함"
    } else {
        "인사말 없음"
    };
    let button_note = if structure.has_button_mention {
        "버튼 언급"
    } else {
        "버튼 언급 없음"
    };

    format!(
        "템플릿 내용: {}\n\n분류: {} - {}\n업무분류: {}\n서비스분류: {}\n사용변수: {}\n버튼: {}\n길이: {}자\n특징: {}, {}",
        record.text,
        record.category_1,
        record.category_2,
        record.business_type,
        record.service_type,
        structure.variables.join(", "),
        record.button.as_deref().unwrap_or("X"),
        structure.length,
        greeting_note,
        button_note
    )
}
