//! Facilities for tracking the location of a value inside the instance
//! document and for composing JSON Pointer error context.
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters percent-encoded after `~`/`/` substitution. Mirrors the set a
/// URL path segment must escape.
const POINTER_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Convert a property name into a valid JSON Pointer reference token:
/// `~` becomes `~0`, `/` becomes `~1`, then the token is percent-encoded.
pub(crate) fn escape(token: &str) -> String {
    let mut escaped = String::with_capacity(token.len());
    for ch in token.chars() {
        match ch {
            '~' => escaped.push_str("~0"),
            '/' => escaped.push_str("~1"),
            _ => escaped.push(ch),
        }
    }
    utf8_percent_encode(&escaped, POINTER_SEGMENT).to_string()
}

/// One step into the instance: a property name or an array index.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Segment<'a> {
    Property(&'a str),
    Index(usize),
}

impl<'a> From<&'a str> for Segment<'a> {
    #[inline]
    fn from(value: &'a str) -> Segment<'a> {
        Segment::Property(value)
    }
}

impl From<usize> for Segment<'_> {
    #[inline]
    fn from(value: usize) -> Self {
        Segment::Index(value)
    }
}

/// A linked list of instance path segments living on the call stack.
///
/// Each validation frame pushes one node; building the full pointer string
/// happens only when an error is actually reported, so the happy path never
/// allocates for path bookkeeping.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct InstancePath<'a, 'b> {
    segment: Segment<'a>,
    parent: Option<&'b InstancePath<'b, 'a>>,
}

impl Default for InstancePath<'_, '_> {
    fn default() -> Self {
        InstancePath::new()
    }
}

impl<'a, 'b> InstancePath<'a, 'b> {
    /// The root of the instance document.
    pub(crate) const fn new() -> Self {
        InstancePath {
            // Sentinel, never rendered.
            segment: Segment::Index(0),
            parent: None,
        }
    }

    /// Extend the path with one more segment.
    #[inline]
    pub(crate) fn push(&'a self, segment: impl Into<Segment<'a>>) -> Self {
        InstancePath {
            segment: segment.into(),
            parent: Some(self),
        }
    }

    /// Render the path as a JSON Pointer. The root renders as an empty
    /// string per RFC 6901.
    pub(crate) fn to_pointer(&'a self) -> String {
        let mut segments = Vec::new();
        let mut head = self;
        if head.parent.is_some() {
            segments.push(head.segment);
        }
        while let Some(next) = head.parent {
            head = next;
            if head.parent.is_some() {
                segments.push(head.segment);
            }
        }
        segments.reverse();
        let mut pointer = String::new();
        let mut buffer = itoa::Buffer::new();
        for segment in segments {
            pointer.push('/');
            match segment {
                Segment::Property(name) => pointer.push_str(&escape(name)),
                Segment::Index(idx) => pointer.push_str(buffer.format(idx)),
            }
        }
        pointer
    }
}

#[cfg(test)]
mod tests {
    use super::{escape, InstancePath};
    use test_case::test_case;

    #[test_case("a", "a")]
    #[test_case("a/b", "a~1b")]
    #[test_case("~", "~0")]
    #[test_case("~1", "~01")]
    #[test_case("a b", "a%20b")]
    #[test_case("per%cent", "per%25cent")]
    fn escapes_tokens(token: &str, expected: &str) {
        assert_eq!(escape(token), expected);
    }

    #[test]
    fn root_is_empty() {
        assert_eq!(InstancePath::new().to_pointer(), "");
    }

    #[test]
    fn nested_segments() {
        let root = InstancePath::new();
        let first = root.push("a/b");
        let second = first.push(3);
        assert_eq!(second.to_pointer(), "/a~1b/3");
    }
}
