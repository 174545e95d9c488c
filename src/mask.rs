//! Glob-style file-name masks.
//!
//! A mask is matched against the file *name* only, never the full path. The
//! empty mask matches every name. `*` matches any run of characters, `?`
//! matches exactly one; everything else matches literally.

use std::ffi::OsStr;

use regex_automata::meta::Regex;

use crate::error::{Result, StreamError};

// characters that carry meaning in regex syntax and need a backslash
const REGEX_META: &str = r"\.+*?()|[]{}^$#&-~";

/// A compiled file-name mask.
#[derive(Debug)]
pub struct Mask {
    // None is the empty mask: match everything
    regex: Option<Regex>,
}

impl Mask {
    /// Compile a mask. The empty string matches every name.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidMask`] if the translated pattern fails
    /// to compile.
    pub fn new(mask: &str) -> Result<Self> {
        if mask.is_empty() {
            return Ok(Mask { regex: None });
        }

        let mut pattern = String::with_capacity(mask.len() + 2);
        pattern.push('^');
        for ch in mask.chars() {
            match ch {
                '*' => pattern.push_str(".*"),
                '?' => pattern.push('.'),
                c => {
                    if REGEX_META.contains(c) {
                        pattern.push('\\');
                    }
                    pattern.push(c);
                }
            }
        }
        pattern.push('$');

        let regex = Regex::new(&pattern).map_err(|err| StreamError::InvalidMask {
            mask: mask.to_string(),
            reason: err.to_string(),
        })?;
        Ok(Mask { regex: Some(regex) })
    }

    /// Check whether a file name matches.
    pub fn matches(&self, name: &str) -> bool {
        match &self.regex {
            Some(regex) => regex.is_match(name),
            None => true,
        }
    }

    /// Check an OS file name. Names that are not valid UTF-8 only match the
    /// empty mask.
    pub fn matches_os(&self, name: &OsStr) -> bool {
        match &self.regex {
            Some(regex) => name.to_str().is_some_and(|name| regex.is_match(name)),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_mask_matches_everything() {
        let mask = Mask::new("").unwrap();
        assert!(mask.matches("anything"));
        assert!(mask.matches(""));
        assert!(mask.matches("no.extension.at.all"));
    }

    #[test]
    fn test_star_suffix() {
        let mask = Mask::new("*.tar").unwrap();
        assert!(mask.matches("shard-000.tar"));
        assert!(mask.matches(".tar"));
        assert!(!mask.matches("shard-000.tar.gz"));
        assert!(!mask.matches("shard-000.tgz"));
    }

    #[test]
    fn test_question_mark() {
        let mask = Mask::new("shard-?.tar").unwrap();
        assert!(mask.matches("shard-0.tar"));
        assert!(!mask.matches("shard-10.tar"));
        assert!(!mask.matches("shard-.tar"));
    }

    #[test]
    fn test_literal_dot_is_not_a_wildcard() {
        let mask = Mask::new("a.b").unwrap();
        assert!(mask.matches("a.b"));
        assert!(!mask.matches("axb"));
    }

    #[test]
    fn test_whole_name_must_match() {
        let mask = Mask::new("*.tar").unwrap();
        assert!(!mask.matches("x.tar/member"));
    }

    #[test]
    fn test_star_in_the_middle() {
        let mask = Mask::new("train-*.json").unwrap();
        assert!(mask.matches("train-2024.json"));
        assert!(mask.matches("train-.json"));
        assert!(!mask.matches("eval-2024.json"));
    }
}
