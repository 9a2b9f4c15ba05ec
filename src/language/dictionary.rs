use include_dir::{include_dir, Dir};
use serde::Deserialize;

use super::Language;
use crate::{Error, Result};

static LANG_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/lang");

/// A bundled, read-only vocabulary table
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Dictionary {
    pub name: String,
    pub size: u32,
    pub words: Vec<String>,
}

impl Dictionary {
    pub fn load(language: Language) -> Result<Self> {
        read_dictionary_from_file(&format!("{language}.json"))
    }

    /// Build an in-memory dictionary, e.g. for a custom word list
    pub fn from_words(name: impl Into<String>, words: Vec<String>) -> Result<Self> {
        let name = name.into();
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();
        if words.is_empty() {
            return Err(Error::EmptyDictionary(name));
        }
        Ok(Self {
            size: words.len() as u32,
            name,
            words,
        })
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }
}

fn read_dictionary_from_file(file_name: &str) -> Result<Dictionary> {
    let file = LANG_DIR
        .get_file(file_name)
        .ok_or_else(|| Error::DictionaryNotFound(file_name.to_string()))?;

    let contents = file
        .contents_utf8()
        .ok_or_else(|| Error::DictionaryNotFound(file_name.to_string()))?;

    let dictionary: Dictionary =
        serde_json::from_str(contents).map_err(|source| Error::DictionaryFormat {
            name: file_name.to_string(),
            source,
        })?;

    if dictionary.words.is_empty() {
        return Err(Error::EmptyDictionary(dictionary.name));
    }

    Ok(dictionary)
}
