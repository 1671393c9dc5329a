pub mod compiler;
pub mod dialect;
pub mod parsed;
pub mod renderer;
pub mod splitter;

/// Splits a possibly qualified column (`"posts.author_id"`) into the name
/// sent over the wire and whether a qualifier was present.
pub fn leaf_key(column: &str) -> (&str, bool) {
    match column.rsplit_once('.') {
        Some((_, leaf)) => (leaf, true),
        None => (column, false),
    }
}
