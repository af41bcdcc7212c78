use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};

use crate::legend::identifier::{
    common_lead_len, strip_common_lead, strip_modifications, IdentifierKind,
};

/// Default prefix/suffix width used for chart legends.
pub const DEFAULT_MIN_LENGTH: usize = 3;

/// Prefix/suffix index over one identifier group.
///
/// Built once per legend-rendering pass, read-only afterwards. Every
/// identifier of the group lands in exactly one `(prefix, suffix)` bucket of
/// its preprocessed form, so re-querying the same identifier always yields
/// the same abbreviation. The index must be rebuilt whenever the identifier
/// set changes.
#[derive(Clone, Debug)]
pub struct PrefixIndex {
    kind: IdentifierKind,
    min_length: usize,
    /// Characters stripped off the front of every molecule identifier.
    common_lead: usize,
    buckets: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
}

impl PrefixIndex {
    /// Indexes one identifier group. Exact repeats are deduplicated.
    pub fn build(identifiers: &[&str], min_length: usize, kind: IdentifierKind) -> Self {
        let common_lead = match kind {
            IdentifierKind::Peptide => 0,
            IdentifierKind::Molecule => common_lead_len(identifiers, min_length),
        };

        let mut index = PrefixIndex {
            kind,
            min_length,
            common_lead,
            buckets: BTreeMap::new(),
        };

        for identifier in identifiers.iter().unique() {
            let key = index.preprocess(identifier);
            let (prefix, suffix) = index.split(&key);
            index
                .buckets
                .entry(prefix)
                .or_default()
                .entry(suffix)
                .or_default()
                .insert(key);
        }

        index
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    fn preprocess(&self, identifier: &str) -> String {
        match self.kind {
            IdentifierKind::Peptide => strip_modifications(identifier),
            IdentifierKind::Molecule => strip_common_lead(identifier, self.common_lead),
        }
    }

    /// First and last `min_length` characters of the preprocessed form. The
    /// suffix is empty when the form is no longer than the prefix.
    fn split(&self, key: &str) -> (String, String) {
        let chars: Vec<char> = key.chars().collect();
        if chars.len() <= self.min_length {
            (key.to_string(), String::new())
        } else {
            let prefix = chars[..self.min_length].iter().collect();
            let suffix = chars[chars.len() - self.min_length..].iter().collect();
            (prefix, suffix)
        }
    }

    /// Shortest unambiguous abbreviation of `identifier` against this index.
    ///
    /// The returned string is never longer than the identifier's
    /// preprocessed form. Identifiers that were not part of the indexed set
    /// come back unchanged.
    pub fn abbreviate(&self, identifier: &str) -> String {
        let key = self.preprocess(identifier);
        let (prefix, suffix) = self.split(&key);

        let bucket = match self.buckets.get(&prefix).and_then(|m| m.get(&suffix)) {
            Some(bucket) if bucket.contains(&key) => bucket,
            _ => return identifier.to_string(),
        };

        let key_len = key.chars().count();
        let prefix_is_unique = self.buckets[&prefix].len() == 1;

        let abbreviated = if bucket.len() == 1 {
            // The key is alone under this prefix/suffix; a bare prefix is
            // enough when no other suffix shares the prefix.
            if key_len <= 2 * self.min_length + 1 {
                key.clone()
            } else if prefix_is_unique {
                format!("{}...", prefix)
            } else {
                format!("{}...{}", prefix, suffix)
            }
        } else if bucket.iter().filter(|m| m.chars().count() == key_len).count() == 1 {
            // Length alone singles the key out within its bucket.
            format!("{}({})", prefix, key_len - self.min_length)
        } else {
            self.scan_disambiguate(&key, bucket, &prefix)
        };

        if abbreviated.chars().count() <= key_len {
            abbreviated
        } else {
            key
        }
    }

    /// Character-by-character scan past the prefix, growing a distinguishing
    /// prefix at every position where the set of still-matching bucket
    /// members shrinks, until only the key itself remains.
    fn scan_disambiguate(&self, key: &str, bucket: &BTreeSet<String>, prefix: &str) -> String {
        let key_chars: Vec<char> = key.chars().collect();
        let mut candidates: Vec<Vec<char>> =
            bucket.iter().map(|member| member.chars().collect()).collect();

        let mut result = prefix.to_string();
        let mut last = self.min_length as i64 - 1;

        for i in self.min_length..key_chars.len() {
            let before = candidates.len();
            candidates.retain(|member| member.get(i) == Some(&key_chars[i]));

            if candidates.len() < before {
                let skipped = i as i64 - last - 1;
                if skipped == 1 {
                    // A run of one is cheaper spelled out than elided.
                    result.push(key_chars[i - 1]);
                } else if skipped > 1 {
                    result.push_str("...");
                }
                result.push(key_chars[i]);
                last = i as i64;
            }

            if candidates.len() == 1 {
                if i + 1 < key_chars.len() {
                    result.push_str("...");
                }
                return result;
            }
        }

        // Residual members match the key at every scanned position, only
        // the total length can still set it apart.
        format!("{}({})", prefix, key_chars.len())
    }
}

/// Two-group legend labeler covering a chart's peptide and molecule series.
///
/// Build it once for the identifier set of the current precursor selection,
/// query it for every legend entry, rebuild it when the selection changes.
///
/// # Example
///
/// ```rust
/// use msqc::legend::index::LabelDisambiguator;
/// let labeler = LabelDisambiguator::build(
///     &["AQUALEPTIDEK", "SIMPLER"],
///     &[],
///     3,
/// );
/// assert_eq!(labeler.abbreviate("AQUALEPTIDEK", true), "AQU...");
/// ```
#[derive(Clone, Debug)]
pub struct LabelDisambiguator {
    peptides: PrefixIndex,
    molecules: PrefixIndex,
}

impl LabelDisambiguator {
    pub fn build(peptides: &[&str], molecules: &[&str], min_length: usize) -> Self {
        LabelDisambiguator {
            peptides: PrefixIndex::build(peptides, min_length, IdentifierKind::Peptide),
            molecules: PrefixIndex::build(molecules, min_length, IdentifierKind::Molecule),
        }
    }

    pub fn abbreviate(&self, identifier: &str, is_peptide: bool) -> String {
        if is_peptide {
            self.peptides.abbreviate(identifier)
        } else {
            self.molecules.abbreviate(identifier)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peptide_index(identifiers: &[&str]) -> PrefixIndex {
        PrefixIndex::build(identifiers, DEFAULT_MIN_LENGTH, IdentifierKind::Peptide)
    }

    #[test]
    fn test_unique_prefix_truncates() {
        let index = peptide_index(&["AQUALEPTIDEK", "SIMPLER"]);
        assert_eq!(index.abbreviate("AQUALEPTIDEK"), "AQU...");
        assert_eq!(index.abbreviate("SIMPLER"), "SIMPLER");
    }

    #[test]
    fn test_shared_prefix_keeps_suffix() {
        let index = peptide_index(&["ABCDEFGHIJ", "ABCZZZZZZQ"]);
        assert_eq!(index.abbreviate("ABCDEFGHIJ"), "ABC...HIJ");
        assert_eq!(index.abbreviate("ABCZZZZZZQ"), "ABC...ZZQ");
    }

    #[test]
    fn test_short_identifier_returned_whole() {
        // At 2 * min_length + 1 characters there is nothing worth eliding.
        let index = peptide_index(&["ABCDEFG", "HIJKLMN"]);
        assert_eq!(index.abbreviate("ABCDEFG"), "ABCDEFG");
    }

    #[test]
    fn test_shared_prefix_abbreviations_differ() {
        // Suffixes "FGH"/"YGH" differ, so these occupy separate buckets
        // under the shared "ABC" prefix.
        let index = peptide_index(&["ABCDEFGH", "ABCDXYGH"]);
        let a = index.abbreviate("ABCDEFGH");
        let b = index.abbreviate("ABCDXYGH");
        assert_ne!(a, b);
    }

    #[test]
    fn test_length_marker_within_bucket() {
        // Same prefix "AAA" and suffix "AAA", lengths 7 and 8; length alone
        // distinguishes each member.
        let index = peptide_index(&["AAAXAAA", "AAAXAAAA"]);
        assert_eq!(index.abbreviate("AAAXAAA"), "AAA(4)");
        assert_eq!(index.abbreviate("AAAXAAAA"), "AAA(5)");
    }

    #[test]
    fn test_scan_distinguishes_same_length_members() {
        let index = peptide_index(&["AAAXAAAAAA", "AAAYAAAAAA"]);
        let a = index.abbreviate("AAAXAAAAAA");
        let b = index.abbreviate("AAAYAAAAAA");
        assert_ne!(a, b);
        assert_eq!(a, "AAAX...");
        assert_eq!(b, "AAAY...");
    }

    #[test]
    fn test_scan_falls_back_to_length_marker() {
        // "AAAXAAA" matches both residual members at every scanned position.
        let index = peptide_index(&["AAAXAAA", "AAAYAAA", "AAAXAAAA"]);
        assert_eq!(index.abbreviate("AAAXAAA"), "AAA(7)");
    }

    #[test]
    fn test_modified_peptides_disambiguate() {
        let index = peptide_index(&["PEP[+16]TIDEA", "PEP[+16]TIDEB"]);
        let a = index.abbreviate("PEP[+16]TIDEA");
        let b = index.abbreviate("PEP[+16]TIDEB");
        // Stripped forms are 8 chars, too short to elide profitably.
        assert_eq!(a, "PEpTIDEA");
        assert_eq!(b, "PEpTIDEB");
        assert_ne!(a, b);
    }

    #[test]
    fn test_abbreviation_never_longer_than_preprocessed_form() {
        let identifiers = [
            "AQUALEPTIDEK",
            "ABCDEFGHIJ",
            "ABCZZZZZZQ",
            "ABCDEFGH",
            "ABCDXYGH",
            "AAAXAAA",
            "AAAXAAAA",
            "TINY",
        ];
        let index = peptide_index(&identifiers);
        for id in identifiers {
            let abbreviated = index.abbreviate(id);
            assert!(
                abbreviated.chars().count() <= strip_len(id),
                "{} -> {}",
                id,
                abbreviated
            );
        }
    }

    fn strip_len(identifier: &str) -> usize {
        crate::legend::identifier::strip_modifications(identifier)
            .chars()
            .count()
    }

    #[test]
    fn test_abbreviate_is_idempotent_across_calls() {
        let index = peptide_index(&["ABCDEFGHIJ", "ABCZZZZZZQ"]);
        assert_eq!(index.abbreviate("ABCDEFGHIJ"), index.abbreviate("ABCDEFGHIJ"));
    }

    #[test]
    fn test_empty_index_returns_input_unchanged() {
        let index = peptide_index(&[]);
        assert!(index.is_empty());
        assert_eq!(index.abbreviate("ANYTHING"), "ANYTHING");
    }

    #[test]
    fn test_unknown_identifier_returned_unchanged() {
        let index = peptide_index(&["ABCDEFGHIJ"]);
        assert_eq!(index.abbreviate("NOTINDEXED"), "NOTINDEXED");
    }

    #[test]
    fn test_molecule_common_lead_elision() {
        let index = PrefixIndex::build(
            &["C16:0 LPC ether", "C16:1 LPC plasmalogen"],
            DEFAULT_MIN_LENGTH,
            IdentifierKind::Molecule,
        );
        let a = index.abbreviate("C16:0 LPC ether");
        let b = index.abbreviate("C16:1 LPC plasmalogen");
        assert_ne!(a, b);
        // The shared "C16:" lead never shows up in either label.
        assert!(!a.starts_with("C16:"));
        assert!(!b.starts_with("C16:"));
    }

    #[test]
    fn test_disambiguator_routes_by_group() {
        let labeler = LabelDisambiguator::build(
            &["AQUALEPTIDEK"],
            &["molecule one", "molecule two"],
            DEFAULT_MIN_LENGTH,
        );
        assert_eq!(labeler.abbreviate("AQUALEPTIDEK", true), "AQU...");
        let one = labeler.abbreviate("molecule one", false);
        let two = labeler.abbreviate("molecule two", false);
        assert_ne!(one, two);
    }
}
