use std::io;

use once_cell::sync::Lazy;
use regex::Regex;

/// The default delimiters: the `File` marker starting every frame, and the two ways a thread
/// is announced in a multi-thread dump.
pub const DEFAULT_DELIMITERS: &str = "(File|# Thread_id|<Thread)";

/// Substrings removed from a trace before it is split, by default.
///
/// Traces stored for display carry HTML line breaks next to (or instead of) the real ones.
pub const DEFAULT_NOISE: &[&str] = &["<br />", "\n", "\r"];

static DEFAULT_DELIMITER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(DEFAULT_DELIMITERS).expect("default delimiter pattern is a valid regex")
});

/// A piece of a cleaned trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token<'a> {
    /// Text matched by the delimiter pattern.
    Delimiter(&'a str),

    /// Text between two delimiters (or the start or end of the trace).
    Text(&'a str),
}

impl<'a> Token<'a> {
    /// Returns `true` if this delimiter announces a new thread.
    pub fn is_thread_delimiter(&self) -> bool {
        match self {
            Token::Delimiter(d) => d.starts_with("# Thread_id") || d.starts_with("<Thread"),
            Token::Text(_) => false,
        }
    }
}

/// Cleans raw trace text and cuts it into tokens.
///
/// To construct one, either use `Splitter::default()` or use [`Splitter::new`] with a custom noise
/// list and delimiter pattern.
#[derive(Clone, Debug)]
pub struct Splitter {
    noise: Vec<String>,
    delimiters: Regex,
}

impl Default for Splitter {
    fn default() -> Self {
        Self {
            noise: DEFAULT_NOISE.iter().map(|s| s.to_string()).collect(),
            delimiters: Regex::clone(&DEFAULT_DELIMITER_RE),
        }
    }
}

impl Splitter {
    /// Builds a splitter removing `noise` (in order) and splitting on the `delimiters` regex.
    ///
    /// Returns an error of kind `InvalidInput` if `delimiters` is not a valid regex, or if it
    /// matches the empty string.
    pub fn new<I, S>(noise: I, delimiters: &str) -> io::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let delimiters = Regex::new(delimiters).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid delimiter pattern: {}", e),
            )
        })?;
        if delimiters.is_match("") {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "Delimiter pattern '{}' matches the empty string",
                    delimiters.as_str()
                ),
            ));
        }

        Ok(Self {
            noise: noise
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty())
                .collect(),
            delimiters,
        })
    }

    /// The noise substrings, in removal order.
    pub fn noise(&self) -> &[String] {
        &self.noise
    }

    /// Removes every occurrence of each noise substring.
    ///
    /// Substrings are removed one after the other, so a later entry is matched against text from
    /// which the earlier entries are already gone.
    pub fn clean(&self, raw: &str) -> String {
        let mut cleaned = raw.to_string();
        for noise in &self.noise {
            if cleaned.contains(noise.as_str()) {
                cleaned = cleaned.replace(noise.as_str(), "");
            }
        }
        cleaned
    }

    /// Cuts already-cleaned text into delimiters and the text around them, in order.
    ///
    /// Leading and trailing text are always present as (possibly empty) `Text` tokens, as is the
    /// text between two adjacent delimiters.
    pub fn tokens<'a>(&self, cleaned: &'a str) -> Vec<Token<'a>> {
        let mut tokens = Vec::new();
        let mut last = 0;
        for m in self.delimiters.find_iter(cleaned) {
            tokens.push(Token::Text(&cleaned[last..m.start()]));
            tokens.push(Token::Delimiter(m.as_str()));
            last = m.end();
        }
        tokens.push(Token::Text(&cleaned[last..]));
        tokens
    }

    /// Cleans `raw` and returns the trimmed text between delimiters.
    ///
    /// The delimiters themselves are consumed. Empty tokens are kept; it is up to the trace parser
    /// to skip them.
    pub fn split(&self, raw: &str) -> Vec<String> {
        let cleaned = self.clean(raw);
        self.tokens(&cleaned)
            .into_iter()
            .filter_map(|token| match token {
                Token::Text(text) => Some(text.trim().to_string()),
                Token::Delimiter(_) => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_removes_noise_in_order() {
        let splitter = Splitter::new(vec!["ab", "", "c"], "File").unwrap();
        assert_eq!(splitter.noise(), &["ab".to_string(), "c".to_string()]);
        // Removing "c" first would have joined a new "ab".
        assert_eq!(splitter.clean("aacbb"), "aabb");
        assert_eq!(splitter.clean("xabyabc"), "xy");

        let splitter = Splitter::default();
        assert_eq!(splitter.noise(), DEFAULT_NOISE);
        assert_eq!(
            splitter.clean("File \"a.py\"<br />\r\n    pass\n"),
            "File \"a.py\"    pass"
        );
    }

    #[test]
    fn split_without_delimiters_is_single_token() {
        let splitter = Splitter::default();
        assert_eq!(
            splitter.split("  nothing to see here  "),
            vec!["nothing to see here"]
        );
        assert_eq!(splitter.split(""), vec![""]);
    }

    #[test]
    fn split_consumes_delimiters() {
        let splitter = Splitter::default();
        let raw = "Traceback:\nFile \"a.py\", line 1, in foo\n    foo()\n# Thread_id: 42\n<Thread(Thread-1, started 42)>\nFile \"b.py\", line 2, in bar";
        assert_eq!(
            splitter.split(raw),
            vec![
                "Traceback:",
                "\"a.py\", line 1, in foo    foo()",
                ": 42",
                "(Thread-1, started 42)>",
                "\"b.py\", line 2, in bar",
            ]
        );
    }

    #[test]
    fn adjacent_delimiters_leave_empty_tokens() {
        let splitter = Splitter::default();
        assert_eq!(splitter.split("FileFile"), vec!["", "", ""]);
    }

    #[test]
    fn tokens_alternate_text_and_delimiters() {
        let splitter = Splitter::default();
        assert_eq!(
            splitter.tokens("x# Thread_id: 1File y"),
            vec![
                Token::Text("x"),
                Token::Delimiter("# Thread_id"),
                Token::Text(": 1"),
                Token::Delimiter("File"),
                Token::Text(" y"),
            ]
        );
        assert!(Token::Delimiter("# Thread_id").is_thread_delimiter());
        assert!(Token::Delimiter("<Thread").is_thread_delimiter());
        assert!(!Token::Delimiter("File").is_thread_delimiter());
        assert!(!Token::Text("<Thread").is_thread_delimiter());
    }

    #[test]
    fn invalid_delimiters_are_rejected() {
        let err = Splitter::new(DEFAULT_NOISE.iter().copied(), "(File").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(err.to_string().starts_with("Invalid delimiter pattern"));

        let err = Splitter::new(DEFAULT_NOISE.iter().copied(), "x*").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
