pub(crate) mod admin;
pub(crate) mod session;
pub(crate) mod user;

/// An `ILIKE ... ESCAPE '\'` pattern matching `query` anywhere, with its own
/// wildcards taken literally.
pub(crate) fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');

    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }

    pattern.push('%');
    pattern
}
