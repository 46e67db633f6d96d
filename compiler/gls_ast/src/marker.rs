//! Annotation-comment marker grammar.
//!
//! Region boundaries that the preprocessor cannot express structurally are
//! carried as leading comments on the following node, in a fixed grammar:
//!
//! ```text
//! @include-begin <name>        @include-end <name>
//! @extension <name> <behavior>
//! @section-begin               @section-end
//! @protect <index>
//! @remove-begin                @remove-end
//! ```
//!
//! The collector decodes include/extension/section markers into sequence
//! events; the translator handles protect/remove markers during emission.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Behavior clause of an `#extension` directive.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionBehavior {
    Require,
    Enable,
    Warn,
    Disable,
}

impl ExtensionBehavior {
    pub fn as_str(self) -> &'static str {
        match self {
            ExtensionBehavior::Require => "require",
            ExtensionBehavior::Enable => "enable",
            ExtensionBehavior::Warn => "warn",
            ExtensionBehavior::Disable => "disable",
        }
    }
}

impl fmt::Display for ExtensionBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtensionBehavior {
    type Err = MalformedMarker;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "require" => Ok(ExtensionBehavior::Require),
            "enable" => Ok(ExtensionBehavior::Enable),
            "warn" => Ok(ExtensionBehavior::Warn),
            "disable" => Ok(ExtensionBehavior::Disable),
            _ => Err(MalformedMarker {
                text: format!("unknown extension behavior `{s}`"),
            }),
        }
    }
}

/// A decoded marker comment.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Marker {
    IncludeBegin(String),
    IncludeEnd(String),
    Extension {
        name: String,
        behavior: ExtensionBehavior,
    },
    SectionBegin,
    SectionEnd,
    Protect(usize),
    RemoveBegin,
    RemoveEnd,
}

/// A comment that starts like a marker but does not parse.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct MalformedMarker {
    pub text: String,
}

impl fmt::Display for MalformedMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed region marker: {}", self.text)
    }
}

impl std::error::Error for MalformedMarker {}

impl Marker {
    /// Decode one comment. `Ok(None)` for ordinary comments; `Err` for
    /// comments in marker position (`@`-prefixed) that do not parse.
    pub fn parse(comment: &str) -> Result<Option<Marker>, MalformedMarker> {
        let trimmed = comment.trim();
        if !trimmed.starts_with('@') {
            return Ok(None);
        }
        let mut words = trimmed.split_whitespace();
        let head = words.next().unwrap_or_default();
        let marker = match head {
            "@include-begin" => Marker::IncludeBegin(expect_word(trimmed, words.next())?),
            "@include-end" => Marker::IncludeEnd(expect_word(trimmed, words.next())?),
            "@extension" => {
                let name = expect_word(trimmed, words.next())?;
                let behavior = expect_word(trimmed, words.next())?.parse()?;
                Marker::Extension { name, behavior }
            }
            "@section-begin" => Marker::SectionBegin,
            "@section-end" => Marker::SectionEnd,
            "@protect" => {
                let index = expect_word(trimmed, words.next())?;
                Marker::Protect(index.parse().map_err(|_| MalformedMarker {
                    text: format!("non-numeric protect index in `{trimmed}`"),
                })?)
            }
            "@remove-begin" => Marker::RemoveBegin,
            "@remove-end" => Marker::RemoveEnd,
            _ => {
                return Err(MalformedMarker {
                    text: format!("unknown marker `{head}`"),
                })
            }
        };
        Ok(Some(marker))
    }
}

fn expect_word(whole: &str, word: Option<&str>) -> Result<String, MalformedMarker> {
    word.map(str::to_owned).ok_or_else(|| MalformedMarker {
        text: format!("missing operand in `{whole}`"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_include_pair() {
        assert_eq!(
            Marker::parse(" @include-begin lighting.glsl "),
            Ok(Some(Marker::IncludeBegin("lighting.glsl".into())))
        );
        assert_eq!(
            Marker::parse("@include-end lighting.glsl"),
            Ok(Some(Marker::IncludeEnd("lighting.glsl".into())))
        );
    }

    #[test]
    fn decodes_extension() {
        assert_eq!(
            Marker::parse("@extension GL_OES_standard_derivatives enable"),
            Ok(Some(Marker::Extension {
                name: "GL_OES_standard_derivatives".into(),
                behavior: ExtensionBehavior::Enable,
            }))
        );
    }

    #[test]
    fn ordinary_comment_is_not_a_marker() {
        assert_eq!(Marker::parse("blinn-phong specular term"), Ok(None));
    }

    #[test]
    fn malformed_markers_are_rejected() {
        assert!(Marker::parse("@include-begin").is_err());
        assert!(Marker::parse("@extension GL_EXT_foo maybe").is_err());
        assert!(Marker::parse("@protect x").is_err());
        assert!(Marker::parse("@bogus").is_err());
    }

    #[test]
    fn decodes_section_and_remove() {
        assert_eq!(Marker::parse("@section-begin"), Ok(Some(Marker::SectionBegin)));
        assert_eq!(Marker::parse("@remove-end"), Ok(Some(Marker::RemoveEnd)));
        assert_eq!(Marker::parse("@protect 3"), Ok(Some(Marker::Protect(3))));
    }
}
