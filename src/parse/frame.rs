use std::fmt;

/// One level of a captured call stack.
///
/// All four fields are kept as raw text. In particular `line` is never parsed into a number: it is
/// only ever used as part of a `file:line` key.
///
/// A record with every field empty is the *unparsed* record. [`parse_frame`] returns it for lines
/// that do not describe a frame at all (thread-id annotations, thread reprs, the `Traceback`
/// header). It is kept in traces so that callers may display it, but it never counts as a call
/// site.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FrameRecord {
    /// Path of the source file, without quotes.
    pub file: String,

    /// Line number, as text.
    pub line: String,

    /// Name of the function executing in this frame.
    pub function: String,

    /// Text of the source line, if the traceback captured one.
    pub source: String,
}

impl FrameRecord {
    /// The record produced for input that is not a frame.
    pub fn unparsed() -> Self {
        Self::default()
    }

    /// Returns `true` if every field is empty.
    pub fn is_unparsed(&self) -> bool {
        self.file.is_empty()
            && self.line.is_empty()
            && self.function.is_empty()
            && self.source.is_empty()
    }

    /// The `file:line` key identifying where this frame occurred.
    pub fn site(&self) -> String {
        let mut site = String::with_capacity(self.file.len() + self.line.len() + 1);
        site.push_str(&self.file);
        site.push(':');
        site.push_str(&self.line);
        site
    }
}

impl fmt::Display for FrameRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.file, self.line, self.function, self.source
        )
    }
}

/// Parses a single frame of a traceback.
///
/// The expected input looks like:
///
/// ```text
///  "/usr/local/lib/python3.6/threading.py", line 884, in _bootstrap    self._bootstrap_inner()
/// ```
///
/// that is, what is left of a `File "...", line ..., in ...` line once the `File` marker has been
/// split off and line breaks have been removed. The source text is separated from the function
/// name by (at least) two spaces, which is all that remains of the newline and indentation the
/// traceback formatter put between them.
///
/// This never fails. Input that does not have the expected shape yields a record with some or all
/// of its fields empty:
///
/// ```
/// use stacktally::parse::frame::{parse_frame, FrameRecord};
///
/// let frame = parse_frame(r#" "app.py", line 12, in handler    return compute()"#);
/// assert_eq!(frame.file, "app.py");
/// assert_eq!(frame.line, "12");
/// assert_eq!(frame.function, "handler");
/// assert_eq!(frame.source, "return compute()");
///
/// assert_eq!(parse_frame(": 139968529811200"), FrameRecord::unparsed());
/// ```
pub fn parse_frame(line: &str) -> FrameRecord {
    // Thread ids (": 1234") and thread reprs ("(Thread-1138, started daemon 1399)>") carry no
    // quoted path.
    let after_quote = match line.split_once('"') {
        Some((_, rest)) => rest,
        None => return FrameRecord::unparsed(),
    };

    let (file, rest) = split_field(after_quote, ',');
    let file = file.trim().replace('"', "");

    let (line_field, rest) = match rest {
        Some(rest) => split_field(rest, ','),
        None => ("", None),
    };
    let line = strip_keyword(line_field, "line");

    let (function, source) = match rest {
        Some(rest) => match rest.split_once("  ") {
            Some((function, source)) => (function, source.trim()),
            // No captured source line, as for lambdas and other synthetic frames.
            None => (rest, ""),
        },
        None => ("", ""),
    };
    let function = strip_keyword(function, "in");

    FrameRecord {
        file,
        line: line.to_string(),
        function: function.to_string(),
        source: source.to_string(),
    }
}

fn split_field(s: &str, delimiter: char) -> (&str, Option<&str>) {
    match s.split_once(delimiter) {
        Some((field, rest)) => (field, Some(rest)),
        None => (s, None),
    }
}

// Removes a leading keyword such as `line` or `in` from a field, along with surrounding
// whitespace. Only a whole word is removed, so `inner` stays `inner`.
fn strip_keyword<'a>(field: &'a str, keyword: &str) -> &'a str {
    let field = field.trim();
    match field.strip_prefix(keyword) {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => rest.trim(),
        _ => field,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(file: &str, line: &str, function: &str, source: &str) -> FrameRecord {
        FrameRecord {
            file: file.to_string(),
            line: line.to_string(),
            function: function.to_string(),
            source: source.to_string(),
        }
    }

    #[test]
    fn parses_full_frame() {
        let input =
            r#" "/usr/local/lib/python3.6/threading.py", line 884, in _bootstrap    self._bootstrap_inner() "#;
        assert_eq!(
            parse_frame(input),
            frame(
                "/usr/local/lib/python3.6/threading.py",
                "884",
                "_bootstrap",
                "self._bootstrap_inner()"
            )
        );
    }

    #[test]
    fn source_text_keeps_commas_and_inner_spaces() {
        let input = r#" "views.py", line 7, in get    return render(request,  "page.html", ctx)"#;
        assert_eq!(
            parse_frame(input),
            frame(
                "views.py",
                "7",
                "get",
                r#"return render(request,  "page.html", ctx)"#
            )
        );
    }

    #[test]
    fn frame_without_source_line() {
        assert_eq!(
            parse_frame(r#" "worker.py", line 41, in <lambda>"#),
            frame("worker.py", "41", "<lambda>", "")
        );
    }

    #[test]
    fn function_names_containing_keywords_are_kept() {
        assert_eq!(
            parse_frame(r#" "main.py", line 3, in main    join()"#),
            frame("main.py", "3", "main", "join()")
        );
        assert_eq!(
            parse_frame(r#" "pool.py", line 3, in inner_loop    pass"#),
            frame("pool.py", "3", "inner_loop", "pass")
        );
    }

    #[test]
    fn lines_without_quotes_are_unparsed() {
        for line in &[
            ": 139968529811200",
            "(Thread-1138, started daemon 139968529811200)>",
            "Traceback (most recent call last):",
            "",
        ] {
            let parsed = parse_frame(line);
            assert!(parsed.is_unparsed(), "{:?} parsed as {:?}", line, parsed);
        }
    }

    #[test]
    fn truncated_frames_degrade_to_partial_records() {
        assert_eq!(parse_frame(r#" "cut.py"#), frame("cut.py", "", "", ""));
        assert_eq!(parse_frame(r#" "cut.py", line 9"#), frame("cut.py", "9", "", ""));
        assert_eq!(
            parse_frame(r#" "cut.py", line 9, in"#),
            frame("cut.py", "9", "", "")
        );
    }

    #[test]
    fn site_joins_file_and_line() {
        assert_eq!(frame("a.py", "1", "foo", "pass").site(), "a.py:1");
        assert_eq!(FrameRecord::unparsed().site(), ":");
    }

    #[test]
    fn display_is_tab_separated() {
        assert_eq!(
            frame("a.py", "1", "foo", "pass").to_string(),
            "a.py\t1\tfoo\tpass"
        );
    }
}
