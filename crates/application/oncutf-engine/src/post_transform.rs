//! Post-transform: the single case/separator/transliteration pass applied once, after
//! the full module chain, "if it is effective on the data" (§4.4.2, Glossary).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseStyle {
    Keep,
    Lower,
    Upper,
    Title,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeparatorStyle {
    Keep,
    Space,
    Underscore,
    Dash,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostTransform {
    #[serde(default)]
    pub case: CaseStyle,
    #[serde(default)]
    pub separator: SeparatorStyle,
    /// Transliterates Greek letters to their closest Latin equivalent ("greeklish").
    #[serde(default)]
    pub transliterate_greek: bool,
}

impl Default for CaseStyle {
    fn default() -> Self {
        CaseStyle::Keep
    }
}

impl Default for SeparatorStyle {
    fn default() -> Self {
        SeparatorStyle::Keep
    }
}

impl Default for PostTransform {
    fn default() -> Self {
        PostTransform { case: CaseStyle::Keep, separator: SeparatorStyle::Keep, transliterate_greek: false }
    }
}

impl PostTransform {
    /// True when applying this transform would change at least one basename; the
    /// preview engine skips the pass entirely when this is false (§4.4.2).
    pub fn is_effective(&self) -> bool {
        self.case != CaseStyle::Keep || self.separator != SeparatorStyle::Keep || self.transliterate_greek
    }

    pub fn apply(&self, basename: &str) -> String {
        let mut out = basename.to_string();

        if self.transliterate_greek {
            out = transliterate_greek(&out);
        }

        out = match self.separator {
            SeparatorStyle::Keep => out,
            SeparatorStyle::Space => out.replace(['_', '-'], " "),
            SeparatorStyle::Underscore => out.replace([' ', '-'], "_"),
            SeparatorStyle::Dash => out.replace([' ', '_'], "-"),
        };

        out = match self.case {
            CaseStyle::Keep => out,
            CaseStyle::Lower => out.to_lowercase(),
            CaseStyle::Upper => out.to_uppercase(),
            CaseStyle::Title => title_case(&out),
        };

        out
    }
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str().to_lowercase().as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Small, deterministic Greek-to-Latin letter table covering the common Greek
/// alphabet; not a full ISO 843 transliteration, just enough for filenames.
fn transliterate_greek(s: &str) -> String {
    s.chars()
        .map(|c| {
            match c {
                'α' | 'Α' => "a",
                'β' | 'Β' => "b",
                'γ' | 'Γ' => "g",
                'δ' | 'Δ' => "d",
                'ε' | 'Ε' => "e",
                'ζ' | 'Ζ' => "z",
                'η' | 'Η' => "i",
                'θ' | 'Θ' => "th",
                'ι' | 'Ι' => "i",
                'κ' | 'Κ' => "k",
                'λ' | 'Λ' => "l",
                'μ' | 'Μ' => "m",
                'ν' | 'Ν' => "n",
                'ξ' | 'Ξ' => "x",
                'ο' | 'Ο' => "o",
                'π' | 'Π' => "p",
                'ρ' | 'Ρ' => "r",
                'σ' | 'ς' | 'Σ' => "s",
                'τ' | 'Τ' => "t",
                'υ' | 'Υ' => "y",
                'φ' | 'Φ' => "f",
                'χ' | 'Χ' => "x",
                'ψ' | 'Ψ' => "p",
                'ω' | 'Ω' => "o",
                other => return other.to_string(),
            }
            .to_string()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keep_everything_is_not_effective() {
        let t = PostTransform::default();
        assert!(!t.is_effective());
        assert_eq!(t.apply("Vacation Photo"), "Vacation Photo");
    }

    #[test]
    fn lowercase_and_underscore_separator() {
        let t = PostTransform { case: CaseStyle::Lower, separator: SeparatorStyle::Underscore, transliterate_greek: false };
        assert!(t.is_effective());
        assert_eq!(t.apply("Vacation Photo-1"), "vacation_photo_1");
    }

    #[test]
    fn title_case_capitalizes_each_word() {
        let t = PostTransform { case: CaseStyle::Title, separator: SeparatorStyle::Keep, transliterate_greek: false };
        assert_eq!(t.apply("vacation photo"), "Vacation Photo");
    }

    #[test]
    fn transliterates_common_greek_letters() {
        let t = PostTransform { case: CaseStyle::Keep, separator: SeparatorStyle::Keep, transliterate_greek: true };
        assert_eq!(t.apply("φωτο"), "foto");
    }
}
