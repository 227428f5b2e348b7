/*============================================================
  Pangea Project: Pangea-Core
  Module: pangea_core::spelling
  Etiquette: Pangea Script Etiquette, Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Suggest known package names close to an unknown one, to
    help humans fix stale name mappings.

  Security / Safety Notes:
    Pure computation; no I/O performed in this module.

  Dependencies:
    None beyond std.

  Operational Scope:
    Feeds the suggestions of missing-package audit violations.
    Never influences pass or fail.

  Revision History:
    2026-02-11 HS   Did-you-mean suggestions for the audit.
============================================================*/

const JARO_WINKLER_WEIGHT: f64 = 0.1;
const JARO_WINKLER_BOOST_THRESHOLD: f64 = 0.7;

/// Names from `dictionary` that look like typos of `input`, best first.
///
/// Candidates must be Jaro-Winkler similar; among them, those within a
/// quarter of the input length in edit distance win. Failing that, the single
/// best candidate whose edit distance is below the shorter length is offered.
pub fn corrections<'a, I>(input: &str, dictionary: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let normalized = input.to_lowercase();
    let input_len = normalized.chars().count();
    let threshold = if input_len > 3 { 0.834 } else { 0.77 };

    let mut words: Vec<(f64, &String)> = dictionary
        .into_iter()
        .filter(|word| word.as_str() != input)
        .map(|word| (jaro_winkler(&word.to_lowercase(), &normalized), word))
        .filter(|(similarity, _)| *similarity >= threshold)
        .collect();
    words.sort_by(|a, b| b.0.total_cmp(&a.0));

    let max_distance = (input_len as f64 * 0.25).ceil() as usize;
    let mistypes: Vec<String> = words
        .iter()
        .filter(|(_, word)| levenshtein(&word.to_lowercase(), &normalized) <= max_distance)
        .map(|(_, word)| word.to_string())
        .collect();
    if !mistypes.is_empty() {
        return mistypes;
    }

    words
        .iter()
        .find(|(_, word)| {
            let word = word.to_lowercase();
            let shorter = input_len.min(word.chars().count());
            levenshtein(&word, &normalized) < shorter
        })
        .map(|(_, word)| vec![word.to_string()])
        .unwrap_or_default()
}

/// Jaro similarity in `[0, 1]`.
pub fn jaro(a: &str, b: &str) -> f64 {
    let (short, long): (Vec<char>, Vec<char>) = {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        if a.len() > b.len() {
            (b, a)
        } else {
            (a, b)
        }
    };
    if short.is_empty() {
        return if long.is_empty() { 1.0 } else { 0.0 };
    }

    let range = (long.len() / 2).saturating_sub(1);
    let mut short_matched = vec![false; short.len()];
    let mut long_matched = vec![false; long.len()];
    let mut matches = 0usize;

    for (i, c) in short.iter().enumerate() {
        let start = i.saturating_sub(range);
        let end = (i + range + 1).min(long.len());
        for j in start..end {
            if !long_matched[j] && long[j] == *c {
                short_matched[i] = true;
                long_matched[j] = true;
                matches += 1;
                break;
            }
        }
    }
    if matches == 0 {
        return 0.0;
    }

    let mut transpositions = 0usize;
    let mut long_matches = long
        .iter()
        .zip(&long_matched)
        .filter(|(_, matched)| **matched)
        .map(|(c, _)| c);
    for (c, _) in short.iter().zip(&short_matched).filter(|(_, matched)| **matched) {
        if long_matches.next() != Some(c) {
            transpositions += 1;
        }
    }

    let m = matches as f64;
    let t = (transpositions / 2) as f64;
    (m / short.len() as f64 + m / long.len() as f64 + (m - t) / m) / 3.0
}

/// Jaro similarity boosted by a common prefix of up to four characters.
pub fn jaro_winkler(a: &str, b: &str) -> f64 {
    let similarity = jaro(a, b);
    if similarity <= JARO_WINKLER_BOOST_THRESHOLD {
        return similarity;
    }
    let prefix = a
        .chars()
        .zip(b.chars())
        .take(4)
        .take_while(|(x, y)| x == y)
        .count();
    similarity + prefix as f64 * JARO_WINKLER_WEIGHT * (1.0 - similarity)
}

/// Edit distance counting insertions, deletions and substitutions.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dictionary(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn levenshtein_distances() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("kio", ""), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("baloo", "balo"), 1);
    }

    #[test]
    fn jaro_winkler_bounds() {
        assert_eq!(jaro_winkler("kio", "kio"), 1.0);
        assert_eq!(jaro("abc", "xyz"), 0.0);
        assert!(jaro_winkler("kactivitie", "kactivities") > 0.95);
        assert!(jaro_winkler("martha", "marhta") > jaro("martha", "marhta"));
    }

    #[test]
    fn suggests_close_package_name() {
        let dict = dictionary(&["kactivities", "kio", "plasma-workspace"]);
        assert_eq!(corrections("kactivitie", &dict), vec!["kactivities"]);
    }

    #[test]
    fn prefers_small_edits_over_long_prefix_matches() {
        let dict = dictionary(&["baloo-widgets", "balo", "kio"]);
        assert_eq!(corrections("baloo", &dict), vec!["balo"]);
    }

    #[test]
    fn no_suggestions_for_unrelated_or_exact_names() {
        assert!(corrections("frobnicator", &dictionary(&[])).is_empty());
        assert!(corrections("frobnicator", &dictionary(&["kio", "okular"])).is_empty());
        assert!(corrections("kio", &dictionary(&["kio"])).is_empty());
    }

    #[test]
    fn falls_back_to_single_best_distant_candidate() {
        let dict = dictionary(&["kdevplatform-extras", "kdevplatform-extra", "kio"]);
        assert!(levenshtein("kdevplatform", "kdevplatform-extra") > 3);
        assert!(jaro_winkler("kdevplatform-extra", "kdevplatform") > 0.9);
        assert_eq!(corrections("kdevplatform", &dict), vec!["kdevplatform-extra"]);
    }
}
