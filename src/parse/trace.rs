use std::slice;

use crate::parse::frame::{parse_frame, FrameRecord};
use crate::parse::split::Token;

/// The frames of one captured stack trace, in the order they appear in the text.
///
/// A trace that spans several threads is flattened: `frames` holds every thread's frames one
/// after the other. Where each thread starts is kept on the side (see [`Trace::thread_starts`]).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Trace {
    frames: Vec<FrameRecord>,
    thread_starts: Vec<usize>,
}

impl Trace {
    /// All frames, including unparsed records.
    pub fn frames(&self) -> &[FrameRecord] {
        &self.frames
    }

    /// Consumes the trace, returning its frames.
    pub fn into_frames(self) -> Vec<FrameRecord> {
        self.frames
    }

    /// Indices into [`Trace::frames`] at which a thread delimiter was seen, in increasing order.
    pub fn thread_starts(&self) -> &[usize] {
        &self.thread_starts
    }

    /// The frames of each thread, in order. Threads without frames are skipped.
    ///
    /// A trace without thread delimiters is a single thread.
    pub fn threads(&self) -> Threads<'_> {
        Threads {
            frames: &self.frames,
            starts: self.thread_starts.iter(),
            start: 0,
        }
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` if the trace has no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    fn push_token(&mut self, token: &str) {
        if should_skip(token) {
            trace!("Skipping non-frame token: {}", token);
            return;
        }
        self.frames.push(parse_frame(token));
    }

    fn mark_thread(&mut self) {
        let here = self.frames.len();
        if self.thread_starts.last() != Some(&here) {
            self.thread_starts.push(here);
        }
    }
}

impl AsRef<[FrameRecord]> for Trace {
    fn as_ref(&self) -> &[FrameRecord] {
        &self.frames
    }
}

impl From<Vec<FrameRecord>> for Trace {
    fn from(frames: Vec<FrameRecord>) -> Self {
        Self {
            frames,
            thread_starts: Vec::new(),
        }
    }
}

/// Iterator over the threads of a [`Trace`]; see [`Trace::threads`].
#[derive(Debug)]
pub struct Threads<'a> {
    frames: &'a [FrameRecord],
    starts: slice::Iter<'a, usize>,
    start: usize,
}

impl<'a> Iterator for Threads<'a> {
    type Item = &'a [FrameRecord];

    fn next(&mut self) -> Option<Self::Item> {
        while self.start < self.frames.len() {
            let end = self
                .starts
                .find(|&&s| s > self.start)
                .copied()
                .unwrap_or(self.frames.len());
            let thread = &self.frames[self.start..end];
            self.start = end;
            if !thread.is_empty() {
                return Some(thread);
            }
        }
        None
    }
}

// Tokens that are known not to be frames never reach the frame parser: empty text, the markers
// themselves, and `<Thread(...)>` reprs.
fn should_skip(token: &str) -> bool {
    token.is_empty() || token == "File" || token.starts_with('<') || token == "# Thread_id"
}

/// Parses the frames out of a sequence of tokens, as produced by
/// [`Splitter::split`](crate::parse::split::Splitter::split).
///
/// Tokens that are empty, that are a bare `File` or `# Thread_id` marker, or that start with `<`
/// are skipped. Every other token goes through [`parse_frame`], and its result is kept even if it
/// is the unparsed record. The output is in token order.
pub fn parse_tokens<I, S>(tokens: I) -> Vec<FrameRecord>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut trace = Trace::default();
    for token in tokens {
        trace.push_token(token.as_ref());
    }
    trace.into_frames()
}

/// Parses the frames out of a lexed trace, as produced by
/// [`Splitter::tokens`](crate::parse::split::Splitter::tokens), keeping track of thread
/// boundaries.
///
/// The resulting frames are exactly those [`parse_tokens`] returns for the trimmed `Text` tokens.
pub fn parse_lexed(tokens: &[Token<'_>]) -> Trace {
    let mut trace = Trace::default();
    for token in tokens {
        match *token {
            Token::Text(text) => trace.push_token(text.trim()),
            Token::Delimiter(_) if token.is_thread_delimiter() => trace.mark_thread(),
            Token::Delimiter(_) => {}
        }
    }
    trace
}
