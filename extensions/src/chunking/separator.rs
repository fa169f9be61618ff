//! Splitting text around a single separator.

use std::iter::FusedIterator;


/// Lazily splits `text` around every occurrence of `separator`.
///
/// * An empty `separator` yields one piece per character (Unicode scalar
///   value), never per byte.
/// * With `keep_separator`, each separator stays attached to the end of the
///   piece it terminates, so concatenating all pieces reproduces `text`.
///   Otherwise separators are dropped.
/// * Empty pieces (from leading, trailing or adjacent separators) are skipped.
///
/// The returned iterator is `Clone`, so a split can be restarted from any point.
pub fn split_on_separator<'a>(text: &'a str, separator: &'a str, keep_separator: bool) -> SeparatorSplit<'a> {
    SeparatorSplit {
        text,
        separator,
        keep_separator,
        position: 0,
        finished: false,
    }
}

/// Iterator returned by [`split_on_separator`].
#[derive(Debug, Clone)]
pub struct SeparatorSplit<'a> {
    text: &'a str,
    separator: &'a str,
    keep_separator: bool,
    position: usize, // byte offset where the next piece starts
    finished: bool,
}

impl<'a> SeparatorSplit<'a> {
    /// Appends `suffix` to every piece.
    pub fn with_suffix(self, suffix: &'a str) -> impl Iterator<Item = String> + Clone + 'a {
        self.map(move |piece| format!("{}{}", piece, suffix))
    }

    /// The next piece, possibly empty.
    fn next_raw(&mut self) -> Option<&'a str> {
        if self.finished {
            return None;
        }
        let rest = &self.text[self.position..];

        if self.separator.is_empty() {
            let Some(c) = rest.chars().next() else {
                self.finished = true;
                return None;
            };
            let start = self.position;
            self.position += c.len_utf8();
            return Some(&self.text[start..self.position]);
        }

        match rest.find(self.separator) {
            Some(offset) => {
                let start = self.position;
                let separator_start = start + offset;
                let separator_end = separator_start + self.separator.len();
                self.position = separator_end;
                let end = if self.keep_separator { separator_end } else { separator_start };
                Some(&self.text[start..end])
            }
            None => {
                self.finished = true;
                Some(rest)
            }
        }
    }
}

impl<'a> Iterator for SeparatorSplit<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        loop {
            let piece = self.next_raw()?;
            if !piece.is_empty() {
                return Some(piece);
            }
        }
    }
}

impl FusedIterator for SeparatorSplit<'_> {}
