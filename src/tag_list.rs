// veridkim – verification of DKIM signatures
// Copyright © 2026 The veridkim developers
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.

//! DKIM tag-list parsing.
//!
//! Both the `DKIM-Signature` header value and the public key record in DNS
//! are `tag=value` lists separated by semicolons (RFC 6376, section 3.2).
//! Whitespace, including folded whitespace, is not significant anywhere in
//! a tag list, so the parser removes it wholesale before splitting.

use std::{
    collections::HashSet,
    error::Error,
    fmt::{self, Display, Formatter},
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TagListSyntax;

impl Display for TagListSyntax {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "malformed tag list")
    }
}

impl Error for TagListSyntax {}

/// One `name=value` pair.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Tag {
    pub name: Box<str>,
    pub value: Box<str>,
}

/// A parsed tag list.
///
/// Duplicate tag names are retained in order; lookups resolve to the last
/// occurrence, and [`duplicate_names`][TagList::duplicate_names] reports
/// the names affected so callers can record a diagnostic.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TagList {
    tags: Vec<Tag>,
}

impl TagList {
    /// Parses a tag list.
    ///
    /// Empty segments (eg from a trailing `;`) are ignored. A non-empty
    /// segment without `=`, or with an empty tag name, is a syntax error.
    pub fn parse(s: &str) -> Result<Self, TagListSyntax> {
        let stripped: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '\t' | '\r' | '\n'))
            .collect();

        let mut tags = vec![];

        for segment in stripped.split(';') {
            if segment.is_empty() {
                continue;
            }

            let (name, value) = segment.split_once('=').ok_or(TagListSyntax)?;
            if name.is_empty() {
                return Err(TagListSyntax);
            }

            tags.push(Tag {
                name: name.into(),
                value: value.into(),
            });
        }

        Ok(Self { tags })
    }

    /// Returns the value of the named tag. Tag names are case-sensitive;
    /// with duplicates, the last occurrence wins.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .rev()
            .find(|tag| &*tag.name == name)
            .map(|tag| &*tag.value)
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Tag names occurring more than once, in first-appearance order.
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut duplicates = vec![];

        for tag in &self.tags {
            if !seen.insert(&*tag.name) && !duplicates.contains(&&*tag.name) {
                duplicates.push(&*tag.name);
            }
        }

        duplicates
    }
}
