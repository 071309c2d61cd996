use strum_macros::{Display, EnumString};

use crate::{Error, Result};

/// The server-side structure a key is stored in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Kind {
    #[strum(serialize = "string")]
    String,
    #[strum(serialize = "hash")]
    Hash,
    #[strum(serialize = "list")]
    List,
    #[strum(serialize = "set")]
    Set,
    #[strum(to_string = "zset", serialize = "sorted_set")]
    SortedSet,
}

/// The shape of a Rust value, which decides which structures it may live in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    /// Plain text, always a string key.
    Text,
    /// Numbers, booleans, timestamps and durations, stored as their text form.
    Scalar,
    /// A serde record; a string key holding JSON, or a hash with one field per member.
    Record,
    /// A string-keyed map; a string key holding JSON, or a hash.
    Mapping,
    /// An ordered sequence; a string key holding JSON, or a list, set or sorted set.
    Sequence,
}

/// Resolves the structure for a read. The shape decides which structures are eligible; the
/// hint only picks among those and is otherwise ignored.
pub fn classify(shape: Shape, hint: Option<Kind>) -> Kind {
    match (shape, hint) {
        (Shape::Record | Shape::Mapping, Some(Kind::Hash)) => Kind::Hash,
        (Shape::Sequence, Some(kind @ (Kind::List | Kind::Set | Kind::SortedSet))) => kind,
        _ => Kind::String,
    }
}

/// Resolves the structure for a write. Sorted sets need a score per member, which a plain
/// value cannot carry, so they are written through a ranking board instead.
pub fn classify_write(shape: Shape, hint: Option<Kind>) -> Result<Kind> {
    match classify(shape, hint) {
        Kind::SortedSet => Err(Error::InvalidArgument(
            "sorted sets are written through a ranking board".to_string(),
        )),
        kind => Ok(kind),
    }
}
