//! Deterministic index names for every logical table

use borga_store::UserId;

/// Encode an id so it can appear inside an index name.
///
/// Index names must be lowercase and avoid a handful of separators, so
/// `[a-z0-9]` pass through, an uppercase `X` becomes `+x` and any other byte,
/// `_` included, becomes `-hh`. The only underscores in a composed name are
/// the fixed separators, so distinct id pairs never share an index.
pub fn index_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'a'..=b'z' | b'0'..=b'9' => out.push(byte as char),
            b'A'..=b'Z' => {
                out.push('+');
                out.push(byte.to_ascii_lowercase() as char);
            }
            other => out.push_str(&format!("-{:02x}", other)),
        }
    }
    out
}

/// Index names derived from one prefix
#[derive(Debug, Clone)]
pub struct IndexNames {
    prefix: String,
}

impl IndexNames {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_lowercase(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn tokens(&self) -> String {
        format!("{}_tokens", self.prefix)
    }

    pub fn users(&self) -> String {
        format!("{}_users", self.prefix)
    }

    /// Global game table
    pub fn games(&self) -> String {
        format!("{}_games", self.prefix)
    }

    pub fn user_groups(&self, user_id: &UserId) -> String {
        format!("{}_{}_groups", self.users(), index_segment(user_id.as_str()))
    }

    pub fn group_games(&self, user_id: &UserId, group_id: &str) -> String {
        format!(
            "{}_{}_games",
            self.user_groups(user_id),
            index_segment(group_id)
        )
    }
}
