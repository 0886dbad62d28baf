//! Value-column naming convention.
//!
//! Provider value columns are named `<code><suffix>`:
//!
//! - `<code>` is `<table>_<line>`, e.g. `B02001_002`, where `<table>` is
//!   uppercase letters, digits, then optional uppercase letters (`B19001A`)
//! - `<suffix>` is a single `E` (estimate) or `M` (margin of error)
//!
//! Anything else (annotation columns such as `B02001_002EA`, `GEO_ID`, `NAME`)
//! is not a value column.

use std::sync::LazyLock;

use regex::Regex;

static VALUE_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<code>[A-Z]+[0-9]+[A-Z]*_[0-9]+)(?P<suffix>[EM])$")
        .expect("value column pattern is valid")
});

/// Which half of an estimate/margin pair a column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueSuffix {
    Estimate,
    Margin,
}

impl ValueSuffix {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'E' => Some(ValueSuffix::Estimate),
            'M' => Some(ValueSuffix::Margin),
            _ => None,
        }
    }
}

/// A parsed value column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueColumn<'a> {
    pub code: &'a str,
    pub suffix: ValueSuffix,
}

impl<'a> ValueColumn<'a> {
    pub fn parse(name: &'a str) -> Option<Self> {
        let caps = VALUE_COLUMN.captures(name)?;
        let code = caps.name("code")?.as_str();
        let suffix = caps
            .name("suffix")?
            .as_str()
            .chars()
            .next()
            .and_then(ValueSuffix::from_char)?;
        Some(Self { code, suffix })
    }

    pub fn is_margin(&self) -> bool {
        self.suffix == ValueSuffix::Margin
    }
}

/// True when `name` is a margin-of-error column.
pub fn is_margin_column(name: &str) -> bool {
    ValueColumn::parse(name).is_some_and(|c| c.is_margin())
}

/// True when `name` is an estimate or margin column.
pub fn is_value_column(name: &str) -> bool {
    ValueColumn::parse(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_estimate_and_margin() {
        let e = ValueColumn::parse("B02001_002E").unwrap();
        assert_eq!(e.code, "B02001_002");
        assert_eq!(e.suffix, ValueSuffix::Estimate);

        let m = ValueColumn::parse("B02001_002M").unwrap();
        assert_eq!(m.code, "B02001_002");
        assert!(m.is_margin());
    }

    #[test]
    fn accepts_lettered_table_ids() {
        let e = ValueColumn::parse("B19001A_017E").unwrap();
        assert_eq!(e.code, "B19001A_017");
    }

    #[test]
    fn rejects_non_value_columns() {
        for name in ["GEOID", "NAME", "GEO_ID", "B02001_002EA", "B02001_002MA", "B02001_002", "state"] {
            assert!(ValueColumn::parse(name).is_none(), "{name} should not parse");
        }
    }

    #[test]
    fn margin_predicate() {
        assert!(is_margin_column("B01001_001M"));
        assert!(!is_margin_column("B01001_001E"));
        assert!(!is_margin_column("GEOID"));
        assert!(is_value_column("B01001_001E"));
    }

    #[test]
    fn suffix_chars() {
        assert_eq!(ValueSuffix::from_char('E'), Some(ValueSuffix::Estimate));
        assert_eq!(ValueSuffix::from_char('M'), Some(ValueSuffix::Margin));
        assert_eq!(ValueSuffix::from_char('A'), None);
    }
}
