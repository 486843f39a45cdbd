//! Case-insensitive Levenshtein distance
//!
//! ASCII letters are folded before comparison; every other character is
//! compared as-is. Insertion, deletion and substitution all cost 1.

/// The working rows for a distance computation could not be allocated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot allocate {cells} cells for edit distance")]
pub struct AllocationFailure {
    pub cells: usize,
}

impl AllocationFailure {
    /// Recover the failure from the message SQLite reports when the
    /// `levenshtein` SQL function fails
    pub fn from_message(message: &str) -> Option<Self> {
        let cells = message
            .strip_prefix("cannot allocate ")?
            .strip_suffix(" cells for edit distance")?
            .parse()
            .ok()?;
        Some(Self { cells })
    }
}

/// Compute the edit distance between `a` and `b`, ignoring ASCII case.
///
/// Runs the usual dynamic program, but keeps only two rows sized to the
/// shorter input. Lengths are counted in characters, so
/// `distance("", s)` is `s.chars().count()`.
pub fn distance(a: &str, b: &str) -> Result<usize, AllocationFailure> {
    let a = fold(a)?;
    let b = fold(b)?;

    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };

    if short.is_empty() {
        return Ok(long.len());
    }

    let width = short.len() + 1;
    let mut prev = allocate_row(width)?;
    let mut curr = allocate_row(width)?;
    prev.extend(0..width);
    curr.resize(width, 0);

    for (j, lc) in long.iter().enumerate() {
        curr[0] = j + 1;
        for (i, sc) in short.iter().enumerate() {
            let cost = usize::from(sc != lc);
            curr[i + 1] = (prev[i + 1] + 1) // deletion
                .min(curr[i] + 1) // insertion
                .min(prev[i] + cost); // substitution
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    Ok(prev[short.len()])
}

fn fold(s: &str) -> Result<Vec<char>, AllocationFailure> {
    let mut chars = Vec::new();
    chars
        .try_reserve_exact(s.len())
        .map_err(|_| AllocationFailure { cells: s.len() })?;
    chars.extend(s.chars().map(|c| c.to_ascii_lowercase()));
    Ok(chars)
}

fn allocate_row(width: usize) -> Result<Vec<usize>, AllocationFailure> {
    let mut row = Vec::new();
    row.try_reserve_exact(width)
        .map_err(|_| AllocationFailure { cells: width })?;
    Ok(row)
}

/// True when either string contains the other, ignoring ASCII case.
pub fn is_substring_match(a: &str, b: &str) -> bool {
    let a = a.to_ascii_lowercase();
    let b = b.to_ascii_lowercase();
    a.contains(&b) || b.contains(&a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_and_empty() {
        for s in ["", "a", "Finance", "zelda-tears", "ünïcode"] {
            assert_eq!(distance(s, s).unwrap(), 0);
            assert_eq!(distance(s, "").unwrap(), s.chars().count());
            assert_eq!(distance("", s).unwrap(), s.chars().count());
        }
    }

    #[test]
    fn test_known_distances() {
        assert_eq!(distance("kitten", "sitting").unwrap(), 3);
        assert_eq!(distance("flaw", "lawn").unwrap(), 2);
        assert_eq!(distance("Finance", "finanse").unwrap(), 1);
        assert_eq!(distance("Urgent", "Urgant").unwrap(), 1);
        assert_eq!(distance("abc", "xyz").unwrap(), 3);
    }

    #[test]
    fn test_case_folding() {
        assert_eq!(distance("MUSIC", "music").unwrap(), 0);
        assert_eq!(distance("Photos", "pHOTOs").unwrap(), 0);
        // only ASCII is folded
        assert_eq!(distance("Ä", "ä").unwrap(), 1);
    }

    #[test]
    fn test_symmetry() {
        let words = ["", "games", "Gamez", "documents", "Docs", "x"];
        for a in words {
            for b in words {
                assert_eq!(distance(a, b).unwrap(), distance(b, a).unwrap(), "{a} / {b}");
            }
        }
    }

    #[test]
    fn test_triangle_inequality() {
        let words = ["music", "musik", "magic", "logic", ""];
        for a in words {
            for b in words {
                for c in words {
                    let ab = distance(a, b).unwrap();
                    let bc = distance(b, c).unwrap();
                    let ac = distance(a, c).unwrap();
                    assert!(ac <= ab + bc, "{a} {b} {c}");
                }
            }
        }
    }

    #[test]
    fn test_substring_match_is_bidirectional() {
        assert!(is_substring_match("work", "Homework"));
        assert!(is_substring_match("HOMEWORK", "work"));
        assert!(!is_substring_match("urgent", "urgant"));
        assert!(is_substring_match("", "anything"));
    }

    #[test]
    fn test_failure_message_parses_back() {
        let failure = AllocationFailure { cells: 4096 };
        assert_eq!(AllocationFailure::from_message(&failure.to_string()), Some(failure));
        assert_eq!(AllocationFailure::from_message("no such table: tags"), None);
    }
}
