//! Qualifier adjudication.
//!
//! A name declared several times in one scope (preprocessor branches leave
//! such duplicates) may carry a different storage qualifier on each
//! declaration. The ordered qualifier list folds through a small state
//! machine; the final state applies to every declaration of that name and
//! scope. `Error` marks contradictory storage classes, a hard failure.

use gls_ast::Qualifier;

/// Verdict states of the qualifier automaton.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Fate {
    /// Rename freely.
    Obfuscate,
    /// Rename through the shared varying table.
    ObfuscateAsVarying,
    /// Part of the host interface; keep the original name.
    Skip,
    /// Contradictory qualifiers.
    Error,
}

impl Fate {
    fn step(self, qualifier: Qualifier) -> Fate {
        match (self, qualifier) {
            (Fate::Error, _) => Fate::Error,
            (Fate::Obfuscate, Qualifier::Uniform | Qualifier::Attribute) => Fate::Skip,
            (Fate::Obfuscate, Qualifier::Varying) => Fate::ObfuscateAsVarying,
            (Fate::Obfuscate, Qualifier::Const | Qualifier::None) => Fate::Obfuscate,
            (Fate::Skip, Qualifier::Varying) => Fate::Error,
            (Fate::Skip, _) => Fate::Skip,
            (Fate::ObfuscateAsVarying, Qualifier::Uniform | Qualifier::Attribute) => Fate::Error,
            (Fate::ObfuscateAsVarying, _) => Fate::ObfuscateAsVarying,
        }
    }
}

/// Fold a declaration's ordered qualifier list into its final fate.
pub fn adjudicate(qualifiers: impl IntoIterator<Item = Qualifier>) -> Fate {
    qualifiers
        .into_iter()
        .fold(Fate::Obfuscate, Fate::step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn uniform_is_skipped() {
        assert_eq!(adjudicate([Qualifier::Uniform]), Fate::Skip);
    }

    #[test]
    fn uniform_then_varying_is_contradictory() {
        assert_eq!(
            adjudicate([Qualifier::Uniform, Qualifier::Varying]),
            Fate::Error
        );
    }

    #[test]
    fn const_then_varying_renames_as_varying() {
        assert_eq!(
            adjudicate([Qualifier::Const, Qualifier::Varying]),
            Fate::ObfuscateAsVarying
        );
    }

    #[test]
    fn plain_locals_rename_freely() {
        assert_eq!(adjudicate([Qualifier::None, Qualifier::None]), Fate::Obfuscate);
        assert_eq!(adjudicate([Qualifier::Const]), Fate::Obfuscate);
    }

    #[test]
    fn varying_then_attribute_is_contradictory() {
        assert_eq!(
            adjudicate([Qualifier::Varying, Qualifier::Attribute]),
            Fate::Error
        );
    }
}
