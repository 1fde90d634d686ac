use crate::{PlaceRecord, PlaceTable};

/// Jaro-Winkler similarity in `[0, 1]`.
pub fn similarity(query: &str, name: &str, case_sensitive: bool) -> f64 {
    if case_sensitive {
        strsim::jaro_winkler(query, name)
    } else {
        strsim::jaro_winkler(&query.to_lowercase(), &name.to_lowercase())
    }
}

/// Best match for `query` among `table`, scoring strictly above `threshold`.
///
/// Rows are scanned in order and the best is only replaced by a strictly
/// higher score, so equal scores resolve to the earlier row.
pub fn resolve<'a>(
    query: &str,
    table: &'a [PlaceRecord],
    threshold: f64,
    case_sensitive: bool,
) -> Option<&'a PlaceRecord> {
    let query = query.trim();
    let mut best: Option<(&PlaceRecord, f64)> = None;
    for record in table {
        let score = similarity(query, &record.name, case_sensitive);
        if score <= threshold {
            continue;
        }
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((record, score)),
        }
    }
    best.map(|(record, _)| record)
}

impl PlaceTable {
    pub fn resolve(&self, query: &str) -> Option<&PlaceRecord> {
        resolve(query, &self.records, self.threshold, self.case_sensitive)
    }
}
