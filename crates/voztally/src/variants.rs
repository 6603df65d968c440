/// Expands a person's name into the spellings newspapers tend to use.
///
/// The original term always comes first, followed by `"C. SURNAME"` and the
/// bare surname. A compound surname is kept whole. Duplicates are dropped by
/// exact comparison; no case or accent folding happens.
pub fn name_variants(full_name: &str) -> Vec<String> {
    let mut variants = vec![full_name.to_string()];

    let tokens: Vec<&str> = full_name.split_whitespace().collect();
    let [first, rest @ ..] = tokens.as_slice() else {
        return variants;
    };
    if rest.is_empty() {
        return variants;
    }

    let surname = rest.join(" ");
    let candidates = first
        .chars()
        .next()
        .map(|initial| format!("{initial}. {surname}"))
        .into_iter()
        .chain(std::iter::once(surname.clone()));

    for candidate in candidates {
        if !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }

    variants
}
