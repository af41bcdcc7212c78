use bincode::{Decode, Encode};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Legend identifiers are grouped by kind, each group is indexed on its own
/// because the abbreviation preprocessing differs between the two.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize, Encode, Decode)]
pub enum IdentifierKind {
    Peptide,
    Molecule,
}

/// Removes bracketed modification annotations from a peptide sequence and
/// lower-cases the residue immediately preceding each annotation, keeping a
/// visual marker of the modification in the stripped form.
///
/// # Example
///
/// ```rust
/// use msqc::legend::identifier::strip_modifications;
/// assert_eq!(strip_modifications("PEP[+16]TIDEA"), "PEpTIDEA");
/// ```
pub fn strip_modifications(sequence: &str) -> String {
    let pattern = Regex::new(r"\[[^\[\]]*]").unwrap();
    let mut stripped = String::with_capacity(sequence.len());
    let mut last_end = 0;
    for mat in pattern.find_iter(sequence) {
        push_lowering_tail(&mut stripped, &sequence[last_end..mat.start()]);
        last_end = mat.end();
    }
    stripped.push_str(&sequence[last_end..]);
    stripped
}

fn push_lowering_tail(out: &mut String, segment: &str) {
    if let Some(residue) = segment.chars().last() {
        out.push_str(&segment[..segment.len() - residue.len_utf8()]);
        out.extend(residue.to_lowercase());
    }
}

/// Length in characters of the shared leading substring of a molecule
/// identifier batch, the part worth eliding from every legend entry.
///
/// The longest common lead is trimmed back to the nearest space boundary
/// when the trim point still leaves more than `min_length` characters, and
/// very short common leads are not stripped at all since the elision would
/// save nothing worth reading around.
pub fn common_lead_len(identifiers: &[&str], min_length: usize) -> usize {
    // A single identifier shares everything with itself, there is nothing
    // to elide against.
    if identifiers.len() < 2 {
        return 0;
    }
    let mut iter = identifiers.iter();
    let first = match iter.next() {
        Some(first) => first,
        None => return 0,
    };

    let mut lead: Vec<char> = first.chars().collect();
    for identifier in iter {
        let matched = lead
            .iter()
            .zip(identifier.chars())
            .take_while(|(a, b)| **a == *b)
            .count();
        lead.truncate(matched);
    }

    if let Some(space) = lead.iter().rposition(|c| *c == ' ') {
        if space + 1 > min_length {
            lead.truncate(space + 1);
        }
    }

    if lead.len() > min_length {
        lead.len()
    } else {
        0
    }
}

/// Drops the first `lead` characters of a molecule identifier.
pub fn strip_common_lead(identifier: &str, lead: usize) -> String {
    identifier.chars().skip(lead).collect()
}
