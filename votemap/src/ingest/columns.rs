use serde_json::{Map, Value};

use crate::config::Year;
use crate::error::VotemapError;

/// Category of the votes that went to neither of the two main candidates.
pub const OTHER: &str = "Other";

/// Assignment of vote count columns of an election to categories.
///
/// Result columns are named like `G20PREDBID` (general election 2020, president, Democrat, Biden). Every column
/// containing the election prefix belongs to this election. The columns containing one of the candidate codes are
/// the votes of that candidate, the rest are summed into [`OTHER`].
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateColumns {
    prefix: String,
    candidates: Vec<(String, String)>,
}

impl CandidateColumns {
    /// Creates a column assignment. Candidates are given as `(code, category)` pairs.
    pub fn new<'a>(
        prefix: &str,
        candidates: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        Self {
            prefix: prefix.to_uppercase(),
            candidates: candidates
                .into_iter()
                .map(|(code, category)| (code.to_uppercase(), category.to_string()))
                .collect(),
        }
    }

    /// Presidential election 2016: Clinton and Trump.
    pub fn election_2016() -> Self {
        Self::new("G16PRE", [("CLI", "Clinton"), ("TRU", "Trump")])
    }

    /// Presidential election 2020: Biden and Trump.
    pub fn election_2020() -> Self {
        Self::new("G20PRE", [("BID", "Biden"), ("TRU", "Trump")])
    }

    /// Column assignment of the year.
    pub fn for_year(year: Year) -> Result<Self, VotemapError> {
        match year.value() {
            2016 => Ok(Self::election_2016()),
            2020 => Ok(Self::election_2020()),
            _ => Err(VotemapError::UnknownYear(year.to_string())),
        }
    }

    /// Output categories: the candidates, then [`OTHER`].
    pub fn categories(&self) -> Vec<&str> {
        self.candidates
            .iter()
            .map(|(_, category)| category.as_str())
            .chain(std::iter::once(OTHER))
            .collect()
    }

    /// Vote counts of every category, in the order of [`CandidateColumns::categories`].
    pub fn votes(&self, properties: &Map<String, Value>) -> Result<Vec<f64>, VotemapError> {
        let relevant: Vec<(&str, &Value)> = properties
            .iter()
            .filter(|(name, _)| name.to_uppercase().contains(&self.prefix))
            .map(|(name, value)| (name.as_str(), value))
            .collect();

        let mut used = Vec::with_capacity(self.candidates.len());
        let mut votes = Vec::with_capacity(self.candidates.len() + 1);
        for (code, category) in &self.candidates {
            let (name, value) = relevant
                .iter()
                .find(|(name, _)| name.to_uppercase().contains(code.as_str()))
                .ok_or_else(|| {
                    VotemapError::Ingest(format!(
                        "no {} column for {category} ({code})",
                        self.prefix
                    ))
                })?;
            used.push(*name);
            votes.push(vote_count(name, value)?);
        }

        let mut other = 0.0;
        for (name, value) in &relevant {
            if !used.contains(name) {
                other += vote_count(name, value)?;
            }
        }
        votes.push(other);

        Ok(votes)
    }
}

fn vote_count(column: &str, value: &Value) -> Result<f64, VotemapError> {
    let count = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        Value::Null => Some(0.0),
        _ => None,
    };

    count.ok_or_else(|| {
        VotemapError::Ingest(format!("column {column} is not a vote count: {value}"))
    })
}
