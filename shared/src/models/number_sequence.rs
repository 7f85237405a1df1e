//! Number sequence models
//!
//! A sequence definition describes how document codes look; counters hold
//! the last issued number per scope key. Scope keys combine an optional
//! branch segment with the date bucket implied by the reset policy, so one
//! definition can run many independent counters.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ParseEnumError;

/// Scope key used when neither a branch nor a date bucket applies
pub const GLOBAL_SCOPE_KEY: &str = "global";

/// Separator between branch and date-bucket segments of a scope key
pub const SCOPE_KEY_SEPARATOR: &str = "-";

/// How often a counter restarts from 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResetPolicy {
    None,
    Daily,
    #[default]
    Monthly,
    Yearly,
}

impl ResetPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResetPolicy::None => "none",
            ResetPolicy::Daily => "daily",
            ResetPolicy::Monthly => "monthly",
            ResetPolicy::Yearly => "yearly",
        }
    }

    /// Date bucket segment of the scope key, if the policy resets at all
    pub fn date_bucket(&self, date: NaiveDate) -> Option<String> {
        match self {
            ResetPolicy::None => None,
            ResetPolicy::Yearly => Some(format!("{:04}", date.year())),
            ResetPolicy::Monthly => Some(format!("{:04}-{:02}", date.year(), date.month())),
            ResetPolicy::Daily => Some(format!(
                "{:04}-{:02}-{:02}",
                date.year(),
                date.month(),
                date.day()
            )),
        }
    }
}

impl FromStr for ResetPolicy {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(ResetPolicy::None),
            "daily" => Ok(ResetPolicy::Daily),
            "monthly" => Ok(ResetPolicy::Monthly),
            "yearly" => Ok(ResetPolicy::Yearly),
            other => Err(ParseEnumError::new("reset policy", other)),
        }
    }
}

/// Whether counters are shared globally or kept per branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScopeType {
    #[default]
    Global,
    Branch,
}

impl ScopeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeType::Global => "global",
            ScopeType::Branch => "branch",
        }
    }
}

impl FromStr for ScopeType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" => Ok(ScopeType::Global),
            "branch" => Ok(ScopeType::Branch),
            other => Err(ParseEnumError::new("scope type", other)),
        }
    }
}

impl fmt::Display for ScopeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A number sequence definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumberSequence {
    pub id: i64,
    pub uuid: Uuid,
    /// Lookup code, e.g. `stock-transfer`
    pub code: String,
    pub name: String,
    pub prefix: String,
    pub separator: String,
    /// Token template, e.g. `{prefix}{sep}{branch}{sep}{YYYY}{sep}{MM}{sep}{seq}`
    pub format: String,
    pub reset_type: ResetPolicy,
    pub scope_type: ScopeType,
    pub sequence_length: i16,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NumberSequence {
    pub fn is_branch_scoped(&self) -> bool {
        self.scope_type == ScopeType::Branch
    }

    pub fn scope_key(&self, branch_code: Option<&str>, date: NaiveDate) -> String {
        build_scope_key(self.reset_type, branch_code, date)
    }

    /// Render `number` with this definition's template
    pub fn format_number(&self, number: i64, branch_code: Option<&str>, date: NaiveDate) -> String {
        render_template(
            &FormatTemplate {
                prefix: &self.prefix,
                separator: &self.separator,
                format: &self.format,
                sequence_length: self.sequence_length.max(0) as usize,
            },
            number,
            branch_code,
            date,
        )
    }
}

/// Counter state for one scope of a sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumberSequenceCounter {
    pub id: i64,
    pub number_sequence_id: i64,
    pub scope_key: String,
    pub last_number: i64,
}

/// Build the counter key for a branch and a date.
///
/// Both segments are optional; when both are absent the key is `"global"`.
pub fn build_scope_key(reset: ResetPolicy, branch_code: Option<&str>, date: NaiveDate) -> String {
    let parts: Vec<String> = branch_code
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .into_iter()
        .chain(reset.date_bucket(date))
        .collect();

    if parts.is_empty() {
        GLOBAL_SCOPE_KEY.to_string()
    } else {
        parts.join(SCOPE_KEY_SEPARATOR)
    }
}

/// The literal parts of a template rendering
#[derive(Debug, Clone, Copy)]
pub struct FormatTemplate<'a> {
    pub prefix: &'a str,
    pub separator: &'a str,
    pub format: &'a str,
    pub sequence_length: usize,
}

/// Substitute template tokens.
///
/// Recognised tokens are `{prefix} {sep} {branch} {YYYY} {YY} {MM} {DD} {seq}`.
/// Anything else, including unknown `{...}` tokens, is copied verbatim.
pub fn render_template(
    template: &FormatTemplate<'_>,
    number: i64,
    branch_code: Option<&str>,
    date: NaiveDate,
) -> String {
    let seq = format!("{:0>width$}", number, width = template.sequence_length);
    let mut out = String::with_capacity(template.format.len() + seq.len());
    let mut rest = template.format;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let candidate = &rest[open..];

        let Some(close) = candidate.find('}') else {
            out.push_str(candidate);
            return out;
        };

        let token = &candidate[..=close];
        match token {
            "{prefix}" => out.push_str(template.prefix),
            "{sep}" => out.push_str(template.separator),
            "{branch}" => out.push_str(branch_code.unwrap_or("")),
            "{YYYY}" => out.push_str(&format!("{:04}", date.year())),
            "{YY}" => out.push_str(&format!("{:02}", date.year().rem_euclid(100))),
            "{MM}" => out.push_str(&format!("{:02}", date.month())),
            "{DD}" => out.push_str(&format!("{:02}", date.day())),
            "{seq}" => out.push_str(&seq),
            _ => {
                // Unknown token: emit the brace and rescan after it so a
                // nested `{seq}` inside e.g. `{x{seq}` still resolves.
                out.push('{');
                rest = &candidate[1..];
                continue;
            }
        }
        rest = &candidate[close + 1..];
    }

    out.push_str(rest);
    out
}

/// Preview a template with the sample number 1.
///
/// Used by the configuration UI; the branch code only shows for
/// branch-scoped definitions.
pub fn preview_format(
    template: &FormatTemplate<'_>,
    scope_type: ScopeType,
    branch_code: Option<&str>,
    date: NaiveDate,
) -> String {
    let branch = match scope_type {
        ScopeType::Branch => branch_code,
        ScopeType::Global => None,
    };
    render_template(template, 1, branch, date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn template<'a>(prefix: &'a str, sep: &'a str, format: &'a str, len: usize) -> FormatTemplate<'a> {
        FormatTemplate {
            prefix,
            separator: sep,
            format,
            sequence_length: len,
        }
    }

    #[test]
    fn test_scope_key_global_without_reset() {
        assert_eq!(build_scope_key(ResetPolicy::None, None, date(2026, 3, 15)), "global");
    }

    #[test]
    fn test_scope_key_branch_monthly() {
        let key = build_scope_key(ResetPolicy::Monthly, Some("BDG"), date(2026, 3, 15));
        assert_eq!(key, "BDG-2026-03");
    }

    #[test]
    fn test_scope_key_date_buckets() {
        let d = date(2026, 3, 5);
        assert_eq!(build_scope_key(ResetPolicy::Yearly, None, d), "2026");
        assert_eq!(build_scope_key(ResetPolicy::Monthly, None, d), "2026-03");
        assert_eq!(build_scope_key(ResetPolicy::Daily, None, d), "2026-03-05");
        assert_eq!(build_scope_key(ResetPolicy::None, Some("JKT"), d), "JKT");
    }

    #[test]
    fn test_scope_key_ignores_empty_branch() {
        assert_eq!(build_scope_key(ResetPolicy::None, Some(""), date(2026, 1, 1)), "global");
    }

    #[test]
    fn test_render_simple_global() {
        let t = template("CBG", "-", "{prefix}-{seq}", 4);
        assert_eq!(render_template(&t, 1, None, date(2026, 3, 15)), "CBG-0001");
        assert_eq!(render_template(&t, 2, None, date(2026, 3, 15)), "CBG-0002");
    }

    #[test]
    fn test_render_branch_monthly() {
        let t = template("TRF", "/", "{prefix}{sep}{branch}{sep}{YYYY}{sep}{MM}{sep}{seq}", 4);
        assert_eq!(
            render_template(&t, 1, Some("BDG"), date(2026, 3, 15)),
            "TRF/BDG/2026/03/0001"
        );
    }

    #[test]
    fn test_render_short_year_and_day() {
        let t = template("KWT", ".", "{prefix}{sep}{YY}{MM}{DD}{sep}{seq}", 3);
        assert_eq!(render_template(&t, 7, None, date(2026, 1, 9)), "KWT.260109.007");
    }

    #[test]
    fn test_render_unknown_tokens_verbatim() {
        let t = template("X", "-", "{prefix}{foo}{seq}{", 2);
        assert_eq!(render_template(&t, 3, None, date(2026, 1, 1)), "X{foo}03{");
    }

    #[test]
    fn test_render_number_wider_than_length() {
        let t = template("P", "-", "{prefix}-{seq}", 2);
        assert_eq!(render_template(&t, 12345, None, date(2026, 1, 1)), "P-12345");
    }

    #[test]
    fn test_render_missing_branch_is_empty() {
        let t = template("PO", "/", "{prefix}{sep}{branch}{sep}{seq}", 4);
        assert_eq!(render_template(&t, 1, None, date(2026, 1, 1)), "PO//0001");
    }

    #[test]
    fn test_preview_hides_branch_for_global_scope() {
        let t = template("PO", "/", "{prefix}{sep}{branch}{sep}{seq}", 4);
        let d = date(2026, 6, 1);
        assert_eq!(preview_format(&t, ScopeType::Global, Some("BDG"), d), "PO//0001");
        assert_eq!(preview_format(&t, ScopeType::Branch, Some("BDG"), d), "PO/BDG/0001");
    }

    #[test]
    fn test_reset_policy_roundtrip_str() {
        for policy in [ResetPolicy::None, ResetPolicy::Daily, ResetPolicy::Monthly, ResetPolicy::Yearly] {
            assert_eq!(policy.as_str().parse::<ResetPolicy>().unwrap(), policy);
        }
        assert!("weekly".parse::<ResetPolicy>().is_err());
    }
}
