//! Stacktally reads the stack traces recorded for outlier requests and tells you which functions
//! and which lines of code show up in them the most.
//!
//! The traces it understands are the ones a Python-style runtime prints by default:
//!
//! ```text
//! Traceback (most recent call last):
//!   File "/srv/app/views.py", line 31, in get_possible_translations
//!     data = fetch(word)
//!   File "/srv/app/client.py", line 8, in fetch
//!     return session.get(url, timeout=3)
//! ```
//!
//! possibly as a dump of every thread, each announced by a `# Thread_id: <n>` line and a
//! `<Thread(...)>` repr, and possibly with `<br />` line breaks left over from having been stored
//! for display in a dashboard.
//!
//! Like other stack-processing tools, it works in two stages: parsing and counting.
//!
//! # Parsing
//!
//! The [`parse`] module turns the text of a single trace into a [`parse::Trace`]: the ordered list
//! of its frames, each a [`parse::FrameRecord`] holding the file, line number, function name and
//! source line of one level of the stack. Parsing is best-effort and never fails. Lines that are
//! not frames at all (thread ids, the `Traceback` header) become an *unparsed* record whose fields
//! are all empty, and truncated frames keep whatever fields could be recovered.
//!
//! ```console
//! $ stacktally-parse --skip-unparsed trace.txt
//! /srv/app/views.py	31	get_possible_translations	data = fetch(word)
//! /srv/app/client.py	8	fetch	return session.get(url, timeout=3)
//! ```
//!
//! # Counting
//!
//! Given the traces of many incidents, the [`aggregate`] module counts how often each function is
//! on the stack ([`aggregate::call_frequency`]) and how often each `file:line` call site is
//! ([`aggregate::site_frequency`]), and ranks them by count.
//!
//! Incidents are read by the [`incident`] module as JSON lines, one
//! `{"id": .., "endpoint": .., "stacktrace": ..}` object per line:
//!
//! ```console
//! $ stacktally-count --endpoint api.get_possible_translations outliers.jsonl
//! /srv/app/client.py:8 : 41
//! /srv/app/views.py:31 : 41
//! /usr/lib/python3.6/threading.py:884 : 12
//! ```
//!
//! # Programmatic access
//!
//! ```
//! use stacktally::aggregate::Tally;
//! use stacktally::parse::Parser;
//!
//! let parser = Parser::default();
//! let mut tally = Tally::default();
//! for raw in &[
//!     "File \"a.py\", line 1, in foo\n    bar()\nFile \"a.py\", line 7, in bar\n    pass",
//!     "File \"a.py\", line 1, in foo\n    bar()",
//! ] {
//!     tally.add_trace(parser.parse(raw).frames());
//! }
//! assert_eq!(tally.sites().ranked(), vec![("a.py:1", 2), ("a.py:7", 1)]);
//! assert_eq!(tally.calls().get("foo"), Some(2));
//! ```

#![deny(missing_docs)]

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

#[macro_use]
extern crate log;

/// Turning trace text into frame records.
///
/// See the [crate-level documentation] for details.
///
///   [crate-level documentation]: ../index.html
pub mod parse;

/// Frequency tables over parsed traces.
///
/// See the [crate-level documentation] for details.
///
///   [crate-level documentation]: ../index.html
pub mod aggregate;

/// Reading recorded incidents and dumping what was made of them.
pub mod incident;
