/*!
 * Approximate text matching for heading comparison.
 *
 * Headings coming back from a document engine differ from the configured
 * ones in case, stray whitespace and the occasional typo. Matching first
 * normalizes both sides (trim, lowercase, collapse runs of whitespace) and
 * then accepts either exact normalized equality or a normalized Levenshtein
 * similarity at or above the threshold.
 */

/// Approximate matcher over normalized text
#[derive(Debug, Clone)]
pub struct ApproxMatcher {
    /// Similarity threshold (0.0-1.0, higher = stricter)
    threshold: f32,
}

impl Default for ApproxMatcher {
    fn default() -> Self {
        Self { threshold: 0.85 }
    }
}

impl ApproxMatcher {
    /// Create a matcher with a custom threshold
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    /// Trim, lowercase and collapse internal whitespace
    pub fn normalize(text: &str) -> String {
        text.split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    /// Whether two texts match approximately
    pub fn matches(&self, text: &str, other: &str) -> bool {
        let a = Self::normalize(text);
        let b = Self::normalize(other);
        if a == b {
            return true;
        }
        self.similarity_normalized(&a, &b) >= self.threshold
    }

    /// Similarity between two texts (0.0-1.0) after normalization
    pub fn similarity(&self, a: &str, b: &str) -> f32 {
        self.similarity_normalized(&Self::normalize(a), &Self::normalize(b))
    }

    /// Best-matching candidate above the threshold, if any
    pub fn find_best_match<'a>(&self, text: &str, candidates: &'a [String]) -> Option<&'a str> {
        let mut best: Option<(&str, f32)> = None;
        for candidate in candidates {
            let sim = self.similarity(text, candidate);
            if sim < self.threshold {
                continue;
            }
            match best {
                Some((_, best_sim)) if sim <= best_sim => {}
                _ => best = Some((candidate.as_str(), sim)),
            }
        }
        best.map(|(candidate, _)| candidate)
    }

    fn similarity_normalized(&self, a: &str, b: &str) -> f32 {
        if a.is_empty() && b.is_empty() {
            return 1.0;
        }
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        let distance = levenshtein_distance(a, b);
        let max_len = a.chars().count().max(b.chars().count());
        1.0 - (distance as f32 / max_len as f32)
    }
}

/// Levenshtein distance over chars, two-row formulation
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut prev_row: Vec<usize> = (0..=b_len).collect();
    let mut curr_row: Vec<usize> = vec![0; b_len + 1];

    for i in 1..=a_len {
        curr_row[0] = i;
        for j in 1..=b_len {
            let cost = if a_chars[i - 1] == b_chars[j - 1] { 0 } else { 1 };
            curr_row[j] = (prev_row[j] + 1)
                .min(curr_row[j - 1] + 1)
                .min(prev_row[j - 1] + cost);
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b_len]
}
