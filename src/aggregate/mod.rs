use std::io;

use indexmap::IndexMap;

use crate::parse::FrameRecord;

const CAPACITY_MAP: usize = 512;

/// Occurrence counts, keyed by string.
///
/// Keys are kept in the order they were first seen, which is what makes [`Occurrences::ranked`]
/// deterministic for keys with equal counts.
#[derive(Clone, Debug)]
pub struct Occurrences {
    map: IndexMap<String, usize, ahash::RandomState>,
}

impl Default for Occurrences {
    fn default() -> Self {
        Self::new()
    }
}

impl Occurrences {
    /// An empty table.
    pub fn new() -> Self {
        Self {
            map: IndexMap::with_capacity_and_hasher(CAPACITY_MAP, ahash::RandomState::new()),
        }
    }

    /// Adds `count` to the count of `key`, inserting it if it was not present.
    pub fn insert_or_add(&mut self, key: &str, count: usize) {
        if let Some(value) = self.map.get_mut(key) {
            *value += count;
        } else {
            self.map.insert(key.to_string(), count);
        }
    }

    /// The count of `key`, if it was ever seen.
    pub fn get(&self, key: &str) -> Option<usize> {
        self.map.get(key).copied()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if no key was ever seen.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.map.values().sum()
    }

    /// Key-count pairs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.map.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Key-count pairs sorted by descending count. Equal counts keep first-seen order.
    pub fn ranked(&self) -> Vec<(&str, usize)> {
        let mut contents: Vec<_> = self.iter().collect();
        contents.sort_by(|a, b| b.1.cmp(&a.1));
        contents
    }

    /// Writes one `key : count` line per key, in [`Occurrences::ranked`] order.
    pub fn write_ranked<W>(&self, mut writer: W) -> io::Result<()>
    where
        W: io::Write,
    {
        let mut count = itoa::Buffer::new();
        for (key, value) in self.ranked() {
            writer.write_all(key.as_bytes())?;
            writer.write_all(b" : ")?;
            writer.write_all(count.format(value).as_bytes())?;
            writer.write_all(b"\n")?;
        }
        Ok(())
    }
}

/// Counts how often each function appears across `traces`.
///
/// Every record counts once per occurrence, duplicates within one trace included. Unparsed
/// records are counted too, under the empty function name.
pub fn call_frequency<I, T>(traces: I) -> Occurrences
where
    I: IntoIterator<Item = T>,
    T: AsRef<[FrameRecord]>,
{
    let mut calls = Occurrences::new();
    for trace in traces {
        for frame in trace.as_ref() {
            add_call(&mut calls, frame);
        }
    }
    calls
}

/// Counts how often each `file:line` call site appears across `traces`.
///
/// Every record counts once per occurrence, except unparsed records, which are not call sites.
pub fn site_frequency<I, T>(traces: I) -> Occurrences
where
    I: IntoIterator<Item = T>,
    T: AsRef<[FrameRecord]>,
{
    let mut sites = Occurrences::new();
    for trace in traces {
        for frame in trace.as_ref() {
            add_site(&mut sites, frame);
        }
    }
    sites
}

fn add_call(calls: &mut Occurrences, frame: &FrameRecord) {
    calls.insert_or_add(&frame.function, 1);
}

fn add_site(sites: &mut Occurrences, frame: &FrameRecord) {
    if !frame.is_unparsed() {
        sites.insert_or_add(&frame.site(), 1);
    }
}

/// Call and call-site frequencies, accumulated one trace at a time.
///
/// Feeding every trace to [`Tally::add_trace`] gives the same tables as [`call_frequency`] and
/// [`site_frequency`] over the whole collection, without having to keep the traces around.
#[derive(Clone, Debug, Default)]
pub struct Tally {
    calls: Occurrences,
    sites: Occurrences,
    ntraces: usize,
}

impl Tally {
    /// Counts the frames of one more trace.
    pub fn add_trace(&mut self, frames: &[FrameRecord]) {
        for frame in frames {
            add_call(&mut self.calls, frame);
            add_site(&mut self.sites, frame);
        }
        self.ntraces += 1;
    }

    /// Function name frequencies.
    pub fn calls(&self) -> &Occurrences {
        &self.calls
    }

    /// `file:line` frequencies.
    pub fn sites(&self) -> &Occurrences {
        &self.sites
    }

    /// Number of traces added so far.
    pub fn ntraces(&self) -> usize {
        self.ntraces
    }
}

#[cfg(test)]
mod tests {
    use maplit::hashmap;
    use std::collections::HashMap;

    use super::*;
    use crate::parse::parse_tokens;

    fn as_map(occurrences: &Occurrences) -> HashMap<&str, usize> {
        occurrences.iter().collect()
    }

    fn trace(tokens: &[&str]) -> Vec<FrameRecord> {
        parse_tokens(tokens)
    }

    #[test]
    fn counts_identical_traces() {
        let traces = vec![
            trace(&[r#""a.py", line 1, in foo    pass"#]),
            trace(&[r#""a.py", line 1, in foo    pass"#]),
        ];
        assert_eq!(as_map(&call_frequency(&traces)), hashmap! { "foo" => 2 });
        assert_eq!(as_map(&site_frequency(&traces)), hashmap! { "a.py:1" => 2 });
    }

    #[test]
    fn unparsed_records_count_as_calls_but_not_sites() {
        let traces = vec![trace(&[
            ": 1234",
            r#""a.py", line 1, in foo    bar()"#,
            r#""a.py", line 4, in bar    baz()"#,
            r#""a.py", line 4, in bar    baz()"#,
        ])];
        assert_eq!(
            as_map(&call_frequency(&traces)),
            hashmap! { "" => 1, "foo" => 1, "bar" => 2 }
        );
        assert_eq!(
            as_map(&site_frequency(&traces)),
            hashmap! { "a.py:1" => 1, "a.py:4" => 2 }
        );
    }

    #[test]
    fn ranked_is_descending_and_stable() {
        let mut occurrences = Occurrences::new();
        for key in &["b", "a", "c", "a", "d", "c", "a"] {
            occurrences.insert_or_add(key, 1);
        }
        assert_eq!(
            occurrences.ranked(),
            vec![("a", 3), ("c", 2), ("b", 1), ("d", 1)]
        );
        assert_eq!(occurrences.total(), 7);
        assert_eq!(occurrences.len(), 4);
        assert_eq!(occurrences.get("c"), Some(2));
        assert_eq!(occurrences.get("e"), None);
    }

    #[test]
    fn write_ranked_format() {
        let mut occurrences = Occurrences::new();
        occurrences.insert_or_add("views.py:31", 1);
        occurrences.insert_or_add("client.py:8", 12);
        let mut out = Vec::new();
        occurrences.write_ranked(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "client.py:8 : 12\nviews.py:31 : 1\n"
        );
    }

    #[test]
    fn tally_matches_separate_passes() {
        let traces = vec![
            trace(&[
                r#""a.py", line 1, in foo    bar()"#,
                ": 77",
                r#""b.py", line 2, in bar    pass"#,
            ]),
            trace(&[r#""b.py", line 2, in bar    pass"#]),
            trace(&[]),
        ];

        let mut tally = Tally::default();
        for frames in &traces {
            tally.add_trace(frames);
        }

        assert_eq!(tally.ntraces(), 3);
        assert_eq!(tally.calls().ranked(), call_frequency(&traces).ranked());
        assert_eq!(tally.sites().ranked(), site_frequency(&traces).ranked());
    }
}
