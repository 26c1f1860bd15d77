//! Reading and writing the SLF text lattice format.
//!
//! An SLF file is line oriented: `#` starts a comment line, and every
//! other line is a whitespace-separated list of `key=value` or
//! `key="quoted value"` assignments. The header (`start`, `end`,
//! `lmscale`) has no explicit terminator; it ends the moment a line
//! carries an `I` (node) or `J` (link) key.

use std::borrow::Cow;
use std::io::{self, BufRead, BufReader, Read, Write};

use hashbrown::HashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use smol_str::SmolStr;
use thiserror::Error;

use crate::constants::{NO_NODE, SLF_VERSION};
use crate::lattice::index::AdjacencyIndex;
use crate::lattice::{Label, Lattice, Link, Node};
use crate::types::NodeId;

// Matches one assignment, e.g. E=997788 or W="that is". Quoted values
// may contain backslash-escaped characters.
static ASSIGNMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(\S+)=(?:"((?:[^\\"]+|\\.)*)"|(\S+))"#).unwrap());

/// Errors produced while reading an SLF lattice.
///
/// Parsing never recovers partially: any error aborts the read and no
/// lattice is returned.
#[derive(Debug, Error)]
pub enum SlfError {
    /// The input could not be read.
    #[error("error reading lattice")]
    Io(#[from] io::Error),

    /// A field carried a value that does not parse as a number.
    #[error("line {line}: invalid value for {key}: {value}")]
    InvalidValue {
        /// 1-based input line number.
        line: usize,
        /// The assignment key.
        key: &'static str,
        /// The offending value.
        value: String,
    },

    /// A link line was missing a required field.
    #[error("line {line}: link is missing required field {field}")]
    MissingField {
        /// 1-based input line number.
        line: usize,
        /// The missing key.
        field: &'static str,
    },

    /// The body defined no nodes at all.
    #[error("no nodes read")]
    NoNodes,
}

// Splits a line into its assignments. Quoted values are unescaped;
// tokens that are not assignments are ignored.
fn assignments(line: &str) -> HashMap<SmolStr, SmolStr> {
    ASSIGNMENT_RE
        .captures_iter(line)
        .map(|caps| {
            let key = SmolStr::new(&caps[1]);
            let value = match caps.get(2) {
                Some(quoted) => SmolStr::new(unescape(quoted.as_str())),
                None => SmolStr::new(&caps[3]),
            };
            (key, value)
        })
        .collect()
}

// Drops the backslash from every escaped character, keeping the
// character itself literally.
fn unescape(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                result.push(escaped);
            }
        } else {
            result.push(c);
        }
    }
    result
}

// Quotes a label for output if the assignment grammar could not read it
// back raw.
fn quote(word: &str) -> Cow<'_, str> {
    if !word.is_empty()
        && !word
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '\\')
    {
        return Cow::Borrowed(word);
    }
    let mut quoted = String::with_capacity(word.len() + 2);
    quoted.push('"');
    for c in word.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    Cow::Owned(quoted)
}

fn parse_number<T: std::str::FromStr>(
    line: usize,
    key: &'static str,
    value: &str,
) -> Result<T, SlfError> {
    value.parse().map_err(|_| SlfError::InvalidValue {
        line,
        key,
        value: value.to_string(),
    })
}

fn require<'a>(
    fields: &'a HashMap<SmolStr, SmolStr>,
    line: usize,
    field: &'static str,
) -> Result<&'a str, SlfError> {
    fields
        .get(field)
        .map(|value| value.as_str())
        .ok_or(SlfError::MissingField { line, field })
}

impl Lattice {
    /// Reads a lattice from SLF text.
    ///
    /// Node ids are remapped to a dense `0..N-1` range in order of first
    /// appearance and all references are updated accordingly, except an
    /// end id equal to the [`NO_NODE`] sentinel, which passes through.
    /// Reference counts are initialized: one for the start node and one
    /// per link for its end node.
    pub fn read_slf<R: Read>(reader: R) -> Result<Lattice, SlfError> {
        let mut nodes: Vec<Node> = Vec::new();
        let mut links: Vec<Link> = Vec::new();
        let mut start_node: Option<NodeId> = None;
        let mut end_node: Option<NodeId> = None;
        let mut lm_scale = 1.0;
        let mut at_header = true;

        for (number, line) in BufReader::new(reader).lines().enumerate() {
            let line = line?;
            let number = number + 1;
            if line.starts_with('#') {
                continue;
            }
            let fields = assignments(&line);
            if at_header {
                if let Some(value) = fields.get("start") {
                    start_node = Some(parse_number(number, "start", value)?);
                }
                if let Some(value) = fields.get("end") {
                    end_node = Some(parse_number(number, "end", value)?);
                }
                if let Some(value) = fields.get("lmscale") {
                    lm_scale = parse_number(number, "lmscale", value)?;
                }
                if fields.contains_key("I") || fields.contains_key("J") {
                    at_header = false;
                }
            }
            if !at_header {
                if let Some(value) = fields.get("I") {
                    let id = parse_number(number, "I", value)?;
                    let time = match fields.get("t") {
                        Some(value) => parse_number(number, "t", value)?,
                        None => 0,
                    };
                    nodes.push(Node::new(id, time));
                } else if let Some(value) = fields.get("J") {
                    let id = parse_number(number, "J", value)?;
                    let start = parse_number(number, "S", require(&fields, number, "S")?)?;
                    let end = parse_number(number, "E", require(&fields, number, "E")?)?;
                    let word = Label::new(require(&fields, number, "W")?);
                    let ac_score = match fields.get("a") {
                        Some(value) => parse_number(number, "a", value)?,
                        None => 0.0,
                    };
                    let lm_score = parse_number(number, "l", require(&fields, number, "l")?)?;
                    links.push(Link {
                        id,
                        start_node: start,
                        end_node: end,
                        word,
                        ac_score,
                        lm_score,
                    });
                }
            }
        }

        if nodes.is_empty() {
            return Err(SlfError::NoNodes);
        }
        let start_node = start_node.unwrap_or(nodes[0].id);
        let end_node = end_node.unwrap_or(nodes[nodes.len() - 1].id);

        let mut lattice = Lattice {
            nodes,
            links,
            index: AdjacencyIndex::default(),
            start_node,
            end_node,
            lm_scale,
        };
        lattice.renumber_nodes();
        lattice.rebuild_index();

        lattice.nodes[lattice.start_node as usize].reference_count += 1;
        for position in 0..lattice.links.len() {
            let end = lattice.links[position].end_node;
            lattice.nodes[end as usize].reference_count += 1;
        }
        Ok(lattice)
    }

    /// Writes the lattice in SLF form.
    ///
    /// Labels that the assignment grammar could not read back raw are
    /// written quoted with backslash escapes, so reparsing the output
    /// reproduces the same node/link counts, start/end identities and
    /// per-link (word, ac_score, lm_score) triples.
    pub fn write_slf<W: Write>(&self, writer: W) -> io::Result<()> {
        let mut writer = io::BufWriter::new(writer);
        writeln!(writer, "# Header")?;
        writeln!(writer, "VERSION={}", SLF_VERSION)?;
        writeln!(writer, "base=10")?;
        writeln!(writer, "dir=f")?;
        writeln!(writer, "lmscale={}", self.lm_scale)?;
        writeln!(writer, "start={}", self.start_node)?;
        writeln!(writer, "end={}", self.end_node)?;
        writeln!(writer, "NODES={} LINKS={}", self.nodes.len(), self.links.len())?;

        writeln!(writer, "# Nodes")?;
        for node in &self.nodes {
            writeln!(writer, "I={}\tt={}", node.id, node.time)?;
        }

        writeln!(writer, "# Links")?;
        for link in &self.links {
            writeln!(
                writer,
                "J={}\tS={}\tE={}\tW={}\ta={}\tv=0\tl={}",
                link.id,
                link.start_node,
                link.end_node,
                quote(link.word.as_str()),
                link.ac_score,
                link.lm_score
            )?;
        }
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(slf: &str) -> Lattice {
        Lattice::read_slf(slf.as_bytes()).unwrap()
    }

    #[test]
    fn a_minimal_lattice_parses() {
        let lattice = parse(
            "# a comment\n\
lmscale=9.5\n\
start=0\n\
end=2\n\
I=0\tt=0\n\
I=1\tt=7\n\
I=2\tt=13\n\
J=0\tS=0\tE=1\tW=hello\ta=-250.5\tl=-1.25\n\
J=1\tS=1\tE=2\tW=world\tl=-2.5\n",
        );

        assert_eq!(lattice.nodes().len(), 3);
        assert_eq!(lattice.links().len(), 2);
        assert_eq!(lattice.start_node(), 0);
        assert_eq!(lattice.end_node(), 2);
        assert_eq!(lattice.lm_scale(), 9.5);
        assert_eq!(lattice.nodes()[1].time(), 7);

        let hello = &lattice.links_from(0)[0];
        assert_eq!(hello.word().as_str(), "hello");
        assert_eq!(hello.ac_score(), -250.5);
        assert_eq!(hello.lm_score(), -1.25);
        // Missing a= defaults to zero.
        assert_eq!(lattice.links_from(1)[0].ac_score(), 0.0);

        // The start node and each link's end node hold one reference.
        assert_eq!(lattice.nodes()[0].reference_count(), 1);
        assert_eq!(lattice.nodes()[1].reference_count(), 1);
        assert_eq!(lattice.nodes()[2].reference_count(), 1);
    }

    #[test]
    fn sparse_node_ids_are_remapped_densely() {
        let lattice = parse(
            "start=10\n\
end=97\n\
I=10\n\
I=55\n\
I=97\n\
J=0\tS=10\tE=55\tW=a\tl=-1.0\n\
J=1\tS=55\tE=97\tW=b\tl=-1.0\n",
        );

        assert_eq!(lattice.start_node(), 0);
        assert_eq!(lattice.end_node(), 2);
        let ids: Vec<NodeId> = lattice.nodes().iter().map(|n| n.id()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(lattice.links_from(0)[0].end_node(), 1);
    }

    #[test]
    fn header_defaults_to_first_and_last_node() {
        let lattice = parse(
            "I=5\n\
I=6\n\
J=0\tS=5\tE=6\tW=a\tl=-1.0\n",
        );
        assert_eq!(lattice.start_node(), 0);
        assert_eq!(lattice.end_node(), 1);
    }

    #[test]
    fn header_ends_at_the_first_body_line() {
        // A start assignment after the first node line is no longer
        // header material.
        let lattice = parse(
            "I=0\n\
start=1\n\
I=1\n\
J=0\tS=0\tE=1\tW=a\tl=-1.0\n",
        );
        assert_eq!(lattice.start_node(), 0);
    }

    #[test]
    fn quoted_words_may_contain_whitespace_and_escapes() {
        let lattice = parse(
            "start=0\n\
end=1\n\
I=0\n\
I=1\n\
J=0\tS=0\tE=1\tW=\"New York\"\tl=-1.0\n",
        );
        assert_eq!(lattice.links()[0].word().as_str(), "New York");

        let lattice = parse(
            "start=0\n\
end=1\n\
I=0\n\
I=1\n\
J=0\tS=0\tE=1\tW=\"say \\\"hi\\\" \\\\ now\"\tl=-1.0\n",
        );
        assert_eq!(lattice.links()[0].word().as_str(), "say \"hi\" \\ now");
    }

    #[test]
    fn a_link_without_lm_score_is_an_error() {
        let result = Lattice::read_slf(
            "I=0\n\
I=1\n\
J=0\tS=0\tE=1\tW=a\n"
                .as_bytes(),
        );
        assert!(matches!(
            result,
            Err(SlfError::MissingField { field: "l", .. })
        ));
    }

    #[test]
    fn an_unparsable_number_is_an_error() {
        let result = Lattice::read_slf(
            "I=0\n\
I=1\n\
J=0\tS=0\tE=1\tW=a\tl=abc\n"
                .as_bytes(),
        );
        assert!(matches!(result, Err(SlfError::InvalidValue { key: "l", .. })));
    }

    #[test]
    fn zero_nodes_is_an_error() {
        assert!(matches!(
            Lattice::read_slf("# empty\nlmscale=1.0\n".as_bytes()),
            Err(SlfError::NoNodes)
        ));
        assert!(matches!(
            Lattice::read_slf("".as_bytes()),
            Err(SlfError::NoNodes)
        ));
    }

    #[test]
    fn round_trip_preserves_the_lattice() {
        let original = parse(
            "lmscale=12.0\n\
start=3\n\
end=44\n\
I=3\tt=0\n\
I=17\tt=5\n\
I=44\tt=9\n\
J=0\tS=3\tE=17\tW=\"New York\"\ta=-100.25\tl=-1.5\n\
J=1\tS=3\tE=17\tW=!NULL\ta=0\tl=0\n\
J=2\tS=17\tE=44\tW=city\ta=-50.125\tl=-0.75\n",
        );

        let mut buffer = Vec::new();
        original.write_slf(&mut buffer).unwrap();
        let reparsed = Lattice::read_slf(buffer.as_slice()).unwrap();

        assert_eq!(reparsed.nodes().len(), original.nodes().len());
        assert_eq!(reparsed.links().len(), original.links().len());
        assert_eq!(reparsed.start_node(), original.start_node());
        assert_eq!(reparsed.end_node(), original.end_node());
        assert_eq!(reparsed.lm_scale(), original.lm_scale());
        for (a, b) in original.links().iter().zip(reparsed.links().iter()) {
            assert_eq!(a.word(), b.word());
            assert_eq!(a.ac_score(), b.ac_score());
            assert_eq!(a.lm_score(), b.lm_score());
        }
    }

    #[test]
    fn a_pruned_lattice_round_trips_with_the_sentinel_end() {
        use hashbrown::HashSet;
        use smol_str::SmolStr;

        let mut lattice = parse(
            "start=0\n\
end=2\n\
I=0\n\
I=1\n\
I=2\n\
J=0\tS=0\tE=1\tW=a\tl=-1.0\n\
J=1\tS=1\tE=2\tW=b\tl=-1.0\n",
        );
        let words: HashSet<SmolStr> = std::iter::once(SmolStr::new("a")).collect();
        lattice.remove_words(&words);
        assert_eq!(lattice.end_node(), NO_NODE);

        let mut buffer = Vec::new();
        lattice.write_slf(&mut buffer).unwrap();
        let reparsed = Lattice::read_slf(buffer.as_slice()).unwrap();
        assert_eq!(reparsed.end_node(), NO_NODE);
        assert_eq!(reparsed.nodes().len(), 1);
    }
}
