//! Style table and composer.
//!
//! The style table maps semantic class tokens (`"page"`, `"view"`, `"span"`,
//! `"flex"`, `"w-50"`, ...) to attribute bundles. Both renderers read it: the
//! document renderer through [`StyleComposer::compose`], the interactive
//! renderer through [`StyleTable::to_css`].

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Built-in table used when no styles file is configured.
const DEFAULT_TABLE: &str = include_str!("../assets/styles.json");

/// A resolved mapping of style attribute → value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleBundle(BTreeMap<String, String>);

impl StyleBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, attr: &str) -> Option<&str> {
        self.0.get(attr).map(String::as_str)
    }

    pub fn set(&mut self, attr: impl Into<String>, value: impl Into<String>) {
        self.0.insert(attr.into(), value.into());
    }

    /// Builder form of [`StyleBundle::set`].
    pub fn with(mut self, attr: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(attr, value);
        self
    }

    /// Shallow merge: every attribute of `other` overwrites ours.
    pub fn merge(&mut self, other: &StyleBundle) {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), v.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StyleBundle {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Token → bundle lookup table. Immutable once handed to a composer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleTable(BTreeMap<String, StyleBundle>);

impl StyleTable {
    /// The table shipped with the crate.
    pub fn builtin() -> Self {
        serde_json::from_str(DEFAULT_TABLE).unwrap_or_else(|e| {
            log::warn!("built-in style table is invalid: {e}");
            Self::default()
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn insert(&mut self, token: impl Into<String>, bundle: StyleBundle) {
        self.0.insert(token.into(), bundle);
    }

    pub fn get(&self, token: &str) -> Option<&StyleBundle> {
        self.0.get(token)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Translate the table into a CSS stylesheet, one rule per token.
    ///
    /// Attribute names are camelCase in the table and kebab-case in CSS.
    pub fn to_css(&self) -> String {
        let mut css = String::new();
        for (token, bundle) in &self.0 {
            if bundle.is_empty() {
                continue;
            }
            css.push('.');
            css.push_str(&css_escape_class(token));
            css.push_str(" {");
            for (attr, value) in bundle.iter() {
                if !is_plain_declaration(attr, value) {
                    log::warn!("skipping style {token}.{attr}: unsupported characters");
                    continue;
                }
                css.push(' ');
                css.push_str(&kebab_case(attr));
                css.push_str(": ");
                css.push_str(value);
                css.push(';');
            }
            css.push_str(" }\n");
        }
        css
    }
}

/// Looks tokens up in an owned [`StyleTable`] and merges the bundles.
#[derive(Debug, Clone)]
pub struct StyleComposer {
    table: StyleTable,
}

impl StyleComposer {
    pub fn new(table: StyleTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &StyleTable {
        &self.table
    }

    /// Merge the bundles of every whitespace-separated token, left to right.
    /// Unknown tokens contribute nothing.
    pub fn compose(&self, tokens: &str) -> StyleBundle {
        let mut out = StyleBundle::new();
        for token in tokens.split_whitespace() {
            match self.table.get(token) {
                Some(bundle) => out.merge(bundle),
                None => log::trace!("style token {token:?} not in table"),
            }
        }
        out
    }
}

impl Default for StyleComposer {
    fn default() -> Self {
        Self::new(StyleTable::builtin())
    }
}

/// `backgroundColor` → `background-color`. Already kebab names pass through.
pub fn kebab_case(attr: &str) -> String {
    let mut out = String::with_capacity(attr.len() + 4);
    for c in attr.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Attribute names are letters and dashes; values must not close the
/// declaration, the rule or the surrounding `<style>` element.
fn is_plain_declaration(attr: &str, value: &str) -> bool {
    !attr.is_empty()
        && attr.chars().all(|c| c.is_ascii_alphabetic() || c == '-')
        && !value.contains(['<', '>', '{', '}', ';'])
}

fn css_escape_class(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    for c in token.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            out.push(c);
        } else {
            // Hex escapes keep `<` and friends out of the page markup.
            out.push_str(&format!("\\{:x} ", c as u32));
        }
    }
    out
}
