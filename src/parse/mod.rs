/// Parsing of a single frame line.
pub mod frame;

/// Cleaning and tokenizing of raw trace text.
pub mod split;

/// Turning tokens into the frames of one trace.
pub mod trace;

use std::io;

pub use self::frame::{parse_frame, FrameRecord};
pub use self::split::{Splitter, Token};
pub use self::trace::{parse_lexed, parse_tokens, Trace};

/// Parser configuration options.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Options {
    /// Substrings removed from the trace before splitting, in order.
    ///
    /// Default is `<br />`, `\n` and `\r`.
    pub noise: Vec<String>,

    /// Regular expression matching the markers that separate frames and threads.
    ///
    /// Default is `(File|# Thread_id|<Thread)`.
    pub delimiters: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            noise: split::DEFAULT_NOISE.iter().map(|s| s.to_string()).collect(),
            delimiters: split::DEFAULT_DELIMITERS.to_string(),
        }
    }
}

/// Turns raw trace text into a [`Trace`].
///
/// To construct one, either use `Parser::default()` or create an [`Options`] and use
/// [`Parser::from_options`].
#[derive(Clone, Debug, Default)]
pub struct Parser {
    splitter: Splitter,
}

impl Parser {
    /// Builds a parser from the given options.
    ///
    /// Fails with `InvalidInput` if the delimiter pattern is not usable.
    pub fn from_options(opt: Options) -> io::Result<Self> {
        Ok(Self {
            splitter: Splitter::new(opt.noise, &opt.delimiters)?,
        })
    }

    /// The splitter used to tokenize traces.
    pub fn splitter(&self) -> &Splitter {
        &self.splitter
    }

    /// Splits `raw` into tokens. See [`Splitter::split`].
    pub fn split(&self, raw: &str) -> Vec<String> {
        self.splitter.split(raw)
    }

    /// Parses the frames of one raw trace.
    pub fn parse(&self, raw: &str) -> Trace {
        let cleaned = self.splitter.clean(raw);
        let trace = parse_lexed(&self.splitter.tokens(&cleaned));
        debug!(
            "Parsed {} frames across {} threads",
            trace.len(),
            trace.threads().count()
        );
        trace
    }
}
