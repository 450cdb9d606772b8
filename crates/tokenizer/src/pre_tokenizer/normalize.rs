//! Unicode normalization for pre-tokenization.
//!
//! Provides the standard Unicode forms (NFC, NFD, NFKC, NFKD) and a
//! BERT-style text cleanup, applied to content before splitting.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use structok_core::TokenizerError;
use unicode_normalization::UnicodeNormalization;

/// Normalization form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizationForm {
    /// Canonical composition
    #[default]
    NFC,
    /// Canonical decomposition
    NFD,
    /// Compatibility composition
    NFKC,
    /// Compatibility decomposition
    NFKD,
    /// BERT cleanup without lowercasing: drops control characters, maps
    /// whitespace to a plain space and pads CJK ideographs with spaces
    Bert,
    /// No normalization
    None,
}

impl fmt::Display for NormalizationForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NormalizationForm::NFC => "nfc",
            NormalizationForm::NFD => "nfd",
            NormalizationForm::NFKC => "nfkc",
            NormalizationForm::NFKD => "nfkd",
            NormalizationForm::Bert => "bert",
            NormalizationForm::None => "none",
        };
        f.write_str(name)
    }
}

impl FromStr for NormalizationForm {
    type Err = TokenizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nfc" => Ok(NormalizationForm::NFC),
            "nfd" => Ok(NormalizationForm::NFD),
            "nfkc" => Ok(NormalizationForm::NFKC),
            "nfkd" => Ok(NormalizationForm::NFKD),
            "bert" => Ok(NormalizationForm::Bert),
            "none" => Ok(NormalizationForm::None),
            other => Err(TokenizerError::InvalidConfig(format!(
                "unknown normalization form {:?}",
                other
            ))),
        }
    }
}

/// Unicode normalizer.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    /// Normalization form to apply
    form: NormalizationForm,
}

impl Normalizer {
    /// Create a new normalizer.
    pub fn new(form: NormalizationForm) -> Self {
        Self { form }
    }

    /// Create an NFC normalizer (default).
    pub fn nfc() -> Self {
        Self::new(NormalizationForm::NFC)
    }

    /// The configured form.
    pub fn form(&self) -> NormalizationForm {
        self.form
    }

    /// Normalize text.
    pub fn normalize(&self, text: &str) -> String {
        match self.form {
            NormalizationForm::NFC => text.nfc().collect(),
            NormalizationForm::NFD => text.nfd().collect(),
            NormalizationForm::NFKC => text.nfkc().collect(),
            NormalizationForm::NFKD => text.nfkd().collect(),
            NormalizationForm::Bert => bert_clean(text),
            NormalizationForm::None => text.to_string(),
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::nfc()
    }
}

fn bert_clean(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == '\0' || ch == char::REPLACEMENT_CHARACTER {
            continue;
        }
        if ch.is_whitespace() {
            out.push(' ');
        } else if ch.is_control() {
            continue;
        } else if is_cjk_ideograph(ch) {
            out.push(' ');
            out.push(ch);
            out.push(' ');
        } else {
            out.push(ch);
        }
    }
    out
}

fn is_cjk_ideograph(ch: char) -> bool {
    matches!(
        ch as u32,
        0x4E00..=0x9FFF
            | 0x3400..=0x4DBF
            | 0x20000..=0x2A6DF
            | 0x2A700..=0x2B73F
            | 0x2B740..=0x2B81F
            | 0x2B820..=0x2CEAF
            | 0xF900..=0xFAFF
            | 0x2F800..=0x2FA1F
    )
}
