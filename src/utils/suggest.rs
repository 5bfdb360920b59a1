//! "Did you mean" lookups for tool names, argument keys and enum values.

fn fold(value: &str) -> Vec<char> {
    value
        .trim()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn edit_distance(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return a.len().max(b.len());
    }
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = diagonal + usize::from(ca != cb);
            diagonal = row[j + 1];
            row[j + 1] = substitution.min(row[j] + 1).min(row[j + 1] + 1);
        }
    }
    row[b.len()]
}

/// Typos allowed before a candidate stops being a plausible match.
fn tolerance(len: usize) -> usize {
    match len {
        0 => 0,
        1..=4 => 1,
        5..=8 => 2,
        _ => (len / 3).max(3),
    }
}

fn distance(input: &[char], candidate: &[char]) -> Option<usize> {
    if input.is_empty() || candidate.is_empty() {
        return None;
    }
    if input == candidate {
        return Some(0);
    }
    let contains = |hay: &[char], needle: &[char]| hay.windows(needle.len()).any(|w| w == needle);
    if contains(candidate, input) || contains(input, candidate) {
        return Some(1);
    }
    let d = edit_distance(input, candidate);
    (d <= tolerance(input.len())).then_some(d)
}

/// Closest candidates first; ties go to the shorter name, then alphabetical.
pub fn suggest<S: AsRef<str>>(input: &str, candidates: &[S], limit: usize) -> Vec<String> {
    let folded = fold(input);
    if folded.is_empty() {
        return Vec::new();
    }
    let mut ranked: Vec<(usize, &str)> = candidates
        .iter()
        .map(|c| c.as_ref())
        .filter_map(|c| distance(&folded, &fold(c)).map(|d| (d, c)))
        .collect();
    ranked.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then_with(|| a.1.len().cmp(&b.1.len()))
            .then_with(|| a.1.cmp(b.1))
    });
    ranked.dedup_by(|a, b| a.1 == b.1);
    ranked
        .into_iter()
        .take(limit.max(1))
        .map(|(_, c)| c.to_string())
        .collect()
}
