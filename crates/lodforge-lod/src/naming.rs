//! Primitive name parsing.
//!
//! Exporters encode the object identity and resolution tier in the primitive
//! name, e.g. `leg;hires`, `pipe_rack_lowres` or `armHires`. All knowledge of
//! those conventions lives here; the rest of the engine only sees
//! [`ParsedName`]s.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{MalformedReason, ParseError, TierLabel};

/// Separators trimmed from the object identifier in suffix mode (`arm_hires` -> `arm`).
const SUFFIX_SEPARATORS: &[char] = &['_', ';', '-', '.', ' '];

/// How a primitive name encodes its group and tier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NamingConvention {
    /// `object;tier`, split on the last `;`.
    #[default]
    Semicolon,
    /// `object_tier`, split on the last `_`.
    Underscore,
    /// `objectTier`, matched case-insensitively against the known tier labels.
    Suffix,
}

impl NamingConvention {
    pub fn delimiter(self) -> Option<char> {
        match self {
            NamingConvention::Semicolon => Some(';'),
            NamingConvention::Underscore => Some('_'),
            NamingConvention::Suffix => None,
        }
    }
}

/// Identifier shared by every tier of one logical object.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey(String);

impl GroupKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Result of parsing one primitive name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedName {
    pub key: GroupKey,
    pub tier: TierLabel,
}

/// Maps primitive names to a group key and tier under one convention.
#[derive(Clone, Copy, Debug, Default)]
pub struct NameParser {
    convention: NamingConvention,
}

impl NameParser {
    pub fn new(convention: NamingConvention) -> Self {
        Self { convention }
    }

    pub fn convention(&self) -> NamingConvention {
        self.convention
    }

    pub fn parse(&self, name: &str) -> Result<ParsedName, ParseError> {
        match self.convention.delimiter() {
            Some(delimiter) => parse_delimited(name, delimiter),
            None => parse_suffix(name),
        }
    }
}

fn malformed(name: &str, reason: MalformedReason) -> ParseError {
    ParseError::Malformed {
        name: name.to_string(),
        reason,
    }
}

fn parse_delimited(name: &str, delimiter: char) -> Result<ParsedName, ParseError> {
    let (key, token) = name
        .rsplit_once(delimiter)
        .ok_or_else(|| malformed(name, MalformedReason::MissingDelimiter(delimiter)))?;
    let key = key.trim();
    let token = token.trim();

    if key.is_empty() {
        return Err(malformed(name, MalformedReason::EmptyKey));
    }
    if token.is_empty() {
        return Err(malformed(name, MalformedReason::EmptyToken));
    }

    let tier = TierLabel::from_token(token).ok_or_else(|| ParseError::UnknownTier {
        name: name.to_string(),
        token: token.to_string(),
    })?;

    Ok(ParsedName {
        key: GroupKey::new(key),
        tier,
    })
}

fn parse_suffix(name: &str) -> Result<ParsedName, ParseError> {
    let trimmed = name.trim();
    let lower = trimmed.to_ascii_lowercase();

    let tier = TierLabel::ALL
        .into_iter()
        .find(|tier| lower.ends_with(tier.label()))
        .ok_or_else(|| ParseError::UnknownTier {
            name: name.to_string(),
            token: trimmed.to_string(),
        })?;

    // ASCII lowercasing keeps byte offsets, and the matched suffix is ASCII.
    let key = trimmed[..trimmed.len() - tier.label().len()].trim_end_matches(SUFFIX_SEPARATORS);
    if key.is_empty() {
        return Err(malformed(name, MalformedReason::EmptyKey));
    }

    Ok(ParsedName {
        key: GroupKey::new(key),
        tier,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(convention: NamingConvention, name: &str) -> Result<ParsedName, ParseError> {
        NameParser::new(convention).parse(name)
    }

    #[test]
    fn test_semicolon_names() {
        for (name, tier) in [
            ("leg;hires", TierLabel::Hires),
            ("leg;medres", TierLabel::MedRes),
            ("leg;lowres", TierLabel::LowRes),
        ] {
            let parsed = parse(NamingConvention::Semicolon, name).unwrap();
            assert_eq!(parsed.key.as_str(), "leg");
            assert_eq!(parsed.tier, tier);
        }
    }

    #[test]
    fn test_underscore_splits_on_last_delimiter() {
        let parsed = parse(NamingConvention::Underscore, "pipe_rack_01_LowRes").unwrap();
        assert_eq!(parsed.key, GroupKey::from("pipe_rack_01"));
        assert_eq!(parsed.tier, TierLabel::LowRes);
    }

    #[test]
    fn test_suffix_match() {
        let parsed = parse(NamingConvention::Suffix, "armHires").unwrap();
        assert_eq!(parsed.key.as_str(), "arm");
        assert_eq!(parsed.tier, TierLabel::Hires);

        let parsed = parse(NamingConvention::Suffix, "beam_medres").unwrap();
        assert_eq!(parsed.key.as_str(), "beam");
        assert_eq!(parsed.tier, TierLabel::MedRes);
    }

    #[test]
    fn test_missing_delimiter_is_malformed() {
        assert_eq!(
            parse(NamingConvention::Semicolon, "leg"),
            Err(ParseError::Malformed {
                name: "leg".into(),
                reason: MalformedReason::MissingDelimiter(';'),
            })
        );
    }

    #[test]
    fn test_empty_parts_are_malformed() {
        assert!(matches!(
            parse(NamingConvention::Semicolon, ";hires"),
            Err(ParseError::Malformed {
                reason: MalformedReason::EmptyKey,
                ..
            })
        ));
        assert!(matches!(
            parse(NamingConvention::Semicolon, "leg;"),
            Err(ParseError::Malformed {
                reason: MalformedReason::EmptyToken,
                ..
            })
        ));
        assert!(matches!(
            parse(NamingConvention::Suffix, "_hires"),
            Err(ParseError::Malformed {
                reason: MalformedReason::EmptyKey,
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_tier_token() {
        assert_eq!(
            parse(NamingConvention::Semicolon, "leg;ultra"),
            Err(ParseError::UnknownTier {
                name: "leg;ultra".into(),
                token: "ultra".into(),
            })
        );
        assert!(matches!(
            parse(NamingConvention::Suffix, "armature"),
            Err(ParseError::UnknownTier { .. })
        ));
    }

    #[test]
    fn test_parsing_is_deterministic() {
        let parser = NameParser::new(NamingConvention::Underscore);
        assert_eq!(parser.parse("a_hires"), parser.parse("a_hires"));
    }
}
