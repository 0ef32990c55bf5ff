//! Raw stream splitting on YAML document markers.
//!
//! Works line by line and never looks inside a document, so a stream
//! with one broken document still splits cleanly around it.

/// What a single line means to the splitter.
#[derive(Debug, PartialEq, Eq)]
enum Marker<'a> {
    /// `---`, with whatever followed the marker on the same line.
    Start(&'a str),
    /// `...`
    End,
    /// Anything else.
    Content,
}

fn classify(line: &str) -> Marker<'_> {
    let line = line.trim_end_matches(['\n', '\r']);
    if let Some(rest) = line.strip_prefix("---") {
        if rest.is_empty() || rest.starts_with([' ', '\t']) {
            return Marker::Start(rest.trim_start());
        }
        return Marker::Content;
    }
    if let Some(rest) = line.strip_prefix("...")
        && rest.trim().is_empty()
    {
        return Marker::End;
    }
    Marker::Content
}

/// Lazily yields the raw text of each document in a stream.
///
/// Empty chunks (between two adjacent markers, or before the first one)
/// are yielded too; deciding what counts as empty is the parser's job.
pub(crate) struct Chunks<'a> {
    lines: std::str::SplitInclusive<'a, char>,
    carry: Option<String>,
    exhausted: bool,
}

impl<'a> Chunks<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self {
            lines: text.split_inclusive('\n'),
            carry: None,
            exhausted: false,
        }
    }
}

impl Iterator for Chunks<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.exhausted {
            return None;
        }

        let mut chunk = self.carry.take().unwrap_or_default();
        let mut saw_line = !chunk.is_empty();

        for line in self.lines.by_ref() {
            match classify(line) {
                Marker::Start(rest) => {
                    // Inline content after the marker (`--- # note`, `--- !tag`)
                    // belongs to the next document.
                    if !rest.is_empty() && !rest.starts_with('#') {
                        self.carry = Some(format!("{rest}\n"));
                    }
                    return Some(chunk);
                }
                Marker::End => return Some(chunk),
                Marker::Content => {
                    saw_line = true;
                    chunk.push_str(line);
                }
            }
        }

        self.exhausted = true;
        saw_line.then_some(chunk)
    }
}

/// True when a chunk holds nothing but whitespace and comments.
pub(crate) fn is_blank(chunk: &str) -> bool {
    chunk.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    })
}
