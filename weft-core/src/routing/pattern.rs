/*
 * Copyright (c) 2025. The Weft Authors
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

/// A glob filter over hierarchical message names.
///
/// Matching follows POSIX path-style rules: the pattern and the name are
/// compared segment by segment (segments separated by `/`), and `*` matches
/// any run of characters *within* one segment but never crosses a segment
/// boundary. `command/project/*` therefore matches `command/project/create`
/// but not `command/project/a/b`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamePattern {
    raw: String,
}

impl NamePattern {
    /// Creates a pattern from its textual form.
    #[must_use]
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            raw: pattern.into(),
        }
    }

    /// The textual form of the pattern.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the given message name matches this pattern.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        let mut pattern_segments = self.raw.split('/');
        let mut name_segments = name.split('/');
        loop {
            match (pattern_segments.next(), name_segments.next()) {
                (Some(pattern), Some(segment)) => {
                    if !segment_matches(pattern, segment) {
                        return false;
                    }
                }
                (None, None) => return true,
                _ => return false,
            }
        }
    }
}

impl std::fmt::Display for NamePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Matches one segment against a pattern segment, `*` being the only
/// metacharacter. Iterative backtracking, no recursion.
fn segment_matches(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while t < text.len() {
        if p < pattern.len() && (pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            backtrack = Some((p, t));
            p += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            t = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }
    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }
    p == pattern.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_names_match_themselves() {
        let pattern = NamePattern::new("command/project/create");
        assert!(pattern.matches("command/project/create"));
        assert!(!pattern.matches("command/project/delete"));
    }

    #[test]
    fn star_matches_within_one_segment() {
        let pattern = NamePattern::new("command/project/*");
        assert!(pattern.matches("command/project/create"));
        assert!(pattern.matches("command/project/delete"));
        assert!(!pattern.matches("command/project/a/b"));
        assert!(!pattern.matches("command/project"));
    }

    #[test]
    fn star_matches_partial_segments() {
        let pattern = NamePattern::new("event/network/*-connected");
        assert!(pattern.matches("event/network/client-connected"));
        assert!(pattern.matches("event/network/server-connected"));
        assert!(!pattern.matches("event/network/disconnected"));
    }

    #[test]
    fn star_never_crosses_separators() {
        let pattern = NamePattern::new("command/*");
        assert!(pattern.matches("command/ping"));
        assert!(!pattern.matches("command/project/create"));
    }

    #[test]
    fn multiple_stars_backtrack() {
        let pattern = NamePattern::new("*a*b");
        assert!(pattern.matches("xaYYb"));
        assert!(pattern.matches("ab"));
        assert!(!pattern.matches("ba"));
    }
}
