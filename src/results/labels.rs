use std::collections::HashSet;

use crate::error::TagSqlError;

/// How many `{base}_{n}` candidates are tried before giving up.
const RENAME_BOUND: usize = 999;

/// Resolve duplicate column labels so every key in a row mapping is unique.
///
/// The first occurrence keeps its bare name. Each later duplicate takes
/// `{base}_{n}` with the smallest n >= 2 whose candidate is not already
/// assigned, which also steps around columns that were literally named like
/// a candidate. A statement needing more than the candidate budget is a
/// configuration problem, not something to paper over.
pub(crate) fn resolve_labels(raw: &[String]) -> Result<Vec<String>, TagSqlError> {
    let mut resolved: Vec<String> = Vec::with_capacity(raw.len());
    let mut assigned: HashSet<String> = HashSet::with_capacity(raw.len());

    for name in raw {
        if !assigned.contains(name) {
            assigned.insert(name.clone());
            resolved.push(name.clone());
            continue;
        }
        let mut renamed = None;
        for n in 2..RENAME_BOUND {
            let candidate = format!("{name}_{n}");
            if !assigned.contains(&candidate) {
                renamed = Some(candidate);
                break;
            }
        }
        match renamed {
            Some(candidate) => {
                assigned.insert(candidate.clone());
                resolved.push(candidate);
            }
            None => {
                return Err(TagSqlError::Config(format!(
                    "column '{name}' repeats past the rename budget of {RENAME_BOUND} candidates"
                )));
            }
        }
    }
    Ok(resolved)
}
