use std::collections::HashSet;
use std::fmt::Write;

use super::profile::Profile;
use crate::error::ServerError;

/// Ordered list of stored server records
///
/// Records stay in their raw line form so that lines which are never touched
/// are written back byte for byte. Positions are 1-based and equal to the
/// line number in the backing file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    records: Vec<String>,
}

impl Registry {
    /// Build a registry from raw records in file order
    pub fn from_records(records: Vec<String>) -> Self {
        Registry { records }
    }

    /// Raw records in file order
    pub fn records(&self) -> &[String] {
        &self.records
    }

    /// Get the number of stored servers
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the registry holds no servers
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check a 1-based position against the current count
    pub fn check_position(&self, position: i64) -> Result<usize, ServerError> {
        match usize::try_from(position) {
            Ok(index) if index >= 1 && index <= self.records.len() => Ok(index),
            _ => Err(ServerError::InvalidPosition {
                position,
                count: self.records.len(),
            }),
        }
    }

    /// Decode the record at a 1-based position
    pub fn profile(&self, position: i64) -> Result<Profile, ServerError> {
        let position = self.check_position(position)?;
        decode_line(position, &self.records[position - 1])
    }

    /// Decode every record, keeping each result next to its position
    pub fn entries(&self) -> Vec<(usize, Result<Profile, ServerError>)> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, record)| (i + 1, decode_line(i + 1, record)))
            .collect()
    }

    /// Drop every record whose position is listed
    /// Unknown positions are ignored; returns how many records were removed
    pub fn remove_positions(&mut self, positions: &[i64]) -> usize {
        let doomed: HashSet<i64> = positions.iter().copied().collect();
        let before = self.records.len();

        let mut position = 0i64;
        self.records.retain(|_| {
            position += 1;
            !doomed.contains(&position)
        });

        let removed = before - self.records.len();
        log::debug!("Removed {} of {} records", removed, before);
        removed
    }

    /// Replace the record at a 1-based position
    pub fn replace(&mut self, position: i64, profile: &Profile) -> Result<(), ServerError> {
        let position = self.check_position(position)?;
        self.records[position - 1] = profile.encode();
        Ok(())
    }

    /// Render the numbered listing shown by `list` and before every edit
    ///
    /// With `skip_malformed` a bad line is reported in place instead of
    /// aborting the whole listing.
    pub fn render_listing(&self, verbose: bool, skip_malformed: bool) -> Result<String, ServerError> {
        let mut out = String::from("Currently available servers:\n");

        for (position, entry) in self.entries() {
            let profile = match entry {
                Ok(profile) => profile,
                Err(err) if skip_malformed => {
                    log::warn!("Skipping {}", err);
                    let _ = writeln!(out, " {}: <malformed entry skipped>", position);
                    continue;
                }
                Err(err) => return Err(err),
            };

            let _ = writeln!(out, " {}: {}", position, profile.server_name());
            if verbose {
                let _ = writeln!(out, "    Port: {}", profile.port);
                let _ = writeln!(out, "    Options: {}", profile.options);
            }
            let _ = writeln!(out, "    Comment: {}", profile.comment);
        }

        Ok(out)
    }
}

/// Read a 1-based position typed by the operator
///
/// Anything made of an optional sign and ASCII digits is a position. Values
/// beyond the `i64` range saturate, so they still fail the bounds check
/// instead of being taken for something else. Returns `None` for any other
/// text.
pub fn parse_position(text: &str) -> Option<i64> {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    match text.parse::<i64>() {
        Ok(position) => Some(position),
        Err(_) if text.starts_with('-') => Some(i64::MIN),
        Err(_) => Some(i64::MAX),
    }
}

fn decode_line(line: usize, record: &str) -> Result<Profile, ServerError> {
    Profile::decode(record).map_err(|source| ServerError::MalformedRecord { line, source })
}
