//! N-gram token-frequency model.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use super::{PathStatistic, StatisticalModel};
use crate::error::{PortfolioError, Result};

/// Replacement for empty path labels.
pub const EMPTY_TOKEN: &str = "EMPTY";

const SEEN_PATHS_KEY: &str = "numSeenPaths";

/// Counts n-grams over the paths a slot has been observed to handle.
///
/// N-grams of length 2 and up are the window tokens joined by `_`. In
/// set-based mode (the default) each n-gram counts once per path.
#[derive(Clone, Debug)]
pub struct TokenFrequencyModel {
    ngram_size: usize,
    set_based: bool,
    counts: HashMap<String, u64>,
    seen_paths: u64,
    seen_tokens: u64,
}

impl Default for TokenFrequencyModel {
    fn default() -> Self {
        Self::new(1, true)
    }
}

impl TokenFrequencyModel {
    /// `ngram_size` is raised to 1 if zero.
    pub fn new(ngram_size: usize, set_based: bool) -> Self {
        Self {
            ngram_size: ngram_size.max(1),
            set_based,
            counts: HashMap::new(),
            seen_paths: 0,
            seen_tokens: 0,
        }
    }

    pub fn ngram_size(&self) -> usize {
        self.ngram_size
    }

    pub fn is_set_based(&self) -> bool {
        self.set_based
    }

    pub fn seen_paths(&self) -> u64 {
        self.seen_paths
    }

    pub fn seen_tokens(&self) -> u64 {
        self.seen_tokens
    }

    pub fn count(&self, token: &str) -> u64 {
        self.counts.get(token).copied().unwrap_or(0)
    }

    /// Add one path's tokens to the counts.
    pub fn learn_path(&mut self, labels: &[String]) {
        for ngram in self.scored_tokens(labels) {
            *self.counts.entry(ngram).or_insert(0) += 1;
            self.seen_tokens += 1;
        }
        self.seen_paths += 1;
    }

    /// Load counts from a tab-separated file.
    ///
    /// The first `numSeenPaths` line sets the path count. Every other line is
    /// `token<TAB>count`; token counts also sum into the seen-token total.
    pub fn load_file(path: &Path, ngram_size: usize, set_based: bool) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|source| PortfolioError::ModelIo {
            path: path.to_path_buf(),
            source,
        })?;

        let mut model = Self::new(ngram_size, set_based);
        let mut found_paths = false;
        for (number, line) in source.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            let parse_error = |message: String| PortfolioError::ModelParse {
                path: path.to_path_buf(),
                line: number + 1,
                message,
            };
            let (key, count) = line
                .split_once('\t')
                .ok_or_else(|| parse_error("expected `token<TAB>count`".to_string()))?;
            let count: u64 = count
                .parse()
                .map_err(|e| parse_error(format!("invalid count {:?}: {}", count, e)))?;

            if !found_paths && key == SEEN_PATHS_KEY {
                model.seen_paths = count;
                found_paths = true;
            } else {
                model.counts.insert(key.to_string(), count);
                model.seen_tokens += count;
            }
        }
        Ok(model)
    }

    /// Write counts in the format read by [`load_file`](Self::load_file).
    pub fn save_file(&self, path: &Path) -> Result<()> {
        let io_error = |source| PortfolioError::ModelIo {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        let mut tokens: Vec<_> = self.counts.iter().collect();
        tokens.sort();

        let mut out = String::new();
        let _ = writeln!(out, "{}\t{}", SEEN_PATHS_KEY, self.seen_paths);
        for (token, count) in tokens {
            let _ = writeln!(out, "{}\t{}", token, count);
        }
        fs::write(path, out).map_err(io_error)
    }

    fn ngrams(&self, labels: &[String]) -> Vec<String> {
        let tokens: Vec<String> = labels
            .iter()
            .map(|label| {
                if label.is_empty() {
                    EMPTY_TOKEN.to_string()
                } else {
                    label.clone()
                }
            })
            .collect();

        let mut ngrams = tokens.clone();
        for size in 2..=self.ngram_size {
            ngrams.extend(tokens.windows(size).map(|window| window.join("_")));
        }
        ngrams
    }

    fn scored_tokens(&self, labels: &[String]) -> Vec<String> {
        let ngrams = self.ngrams(labels);
        if self.set_based {
            ngrams.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
        } else {
            ngrams
        }
    }
}

impl StatisticalModel for TokenFrequencyModel {
    fn vocabulary(&self) -> Vec<&str> {
        self.counts.keys().map(String::as_str).collect()
    }

    fn statistic(&self, path: &[String]) -> PathStatistic {
        let token_counts = self
            .scored_tokens(path)
            .into_iter()
            .map(|token| {
                let count = self.count(&token);
                (token, count)
            })
            .collect();

        PathStatistic {
            seen_paths: self.seen_paths,
            seen_tokens: self.seen_tokens,
            token_counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn path(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_set_based_counts_once_per_path() {
        let mut model = TokenFrequencyModel::default();
        model.learn_path(&path(&["a", "b", "a"]));

        assert_eq!(model.count("a"), 1);
        assert_eq!(model.count("b"), 1);
        assert_eq!(model.seen_tokens(), 2);
        assert_eq!(model.seen_paths(), 1);
    }

    #[test]
    fn test_list_based_counts_every_occurrence() {
        let mut model = TokenFrequencyModel::new(1, false);
        model.learn_path(&path(&["a", "b", "a"]));

        assert_eq!(model.count("a"), 2);
        assert_eq!(model.seen_tokens(), 3);
        assert_eq!(model.statistic(&path(&["a", "a"])).token_counts.len(), 2);
    }

    #[test]
    fn test_bigrams_include_last_window() {
        let mut model = TokenFrequencyModel::new(2, true);
        model.learn_path(&path(&["a", "b", "c"]));

        assert_eq!(model.count("a_b"), 1);
        assert_eq!(model.count("b_c"), 1);
        assert_eq!(model.vocabulary().len(), 5);
    }

    #[test]
    fn test_empty_labels_become_placeholder() {
        let mut model = TokenFrequencyModel::default();
        model.learn_path(&path(&["", "x"]));
        assert_eq!(model.count(EMPTY_TOKEN), 1);
    }

    #[test]
    fn test_statistic_reports_unknown_tokens_as_zero() {
        let mut model = TokenFrequencyModel::default();
        model.learn_path(&path(&["a", "b"]));

        let statistic = model.statistic(&path(&["a", "q"]));
        assert_eq!(statistic.seen_tokens, 2);
        assert_eq!(
            statistic.token_counts,
            vec![("a".to_string(), 1), ("q".to_string(), 0)]
        );
    }

    #[test]
    fn test_familiar_paths_score_higher() {
        let mut model = TokenFrequencyModel::default();
        for _ in 0..5 {
            model.learn_path(&path(&["loop", "assert"]));
        }
        let familiar = model.score(&path(&["loop", "assert"]), 4);
        let foreign = model.score(&path(&["call", "return"]), 4);
        assert!(familiar > foreign);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("models").join("slot-a.tsv");

        let mut model = TokenFrequencyModel::default();
        model.learn_path(&path(&["a", "b"]));
        model.learn_path(&path(&["a"]));
        model.save_file(&file).unwrap();

        let loaded = TokenFrequencyModel::load_file(&file, 1, true).unwrap();
        assert_eq!(loaded.seen_paths(), 2);
        assert_eq!(loaded.seen_tokens(), 3);
        assert_eq!(loaded.count("a"), 2);
    }

    #[test]
    fn test_load_rejects_malformed_line() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("bad.tsv");
        fs::write(&file, "numSeenPaths\t1\nno-tab-here\n").unwrap();

        let err = TokenFrequencyModel::load_file(&file, 1, true).unwrap_err();
        assert!(matches!(err, PortfolioError::ModelParse { line: 2, .. }));
    }
}
