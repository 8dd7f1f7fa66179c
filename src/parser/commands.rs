/// Commands that would take control of the program away from the debugger.
pub const BLOCKED_COMMANDS: &[&str] = &[
    "goto", "gosub", "run", "chain", "list", "new", "load", "merge", "save", "edit", "renum",
];

/// Returns the first word of a statement, lower-cased, skipping an optional
/// leading line number. A word ends at the first character that cannot be
/// part of a keyword.
pub fn first_keyword(statement: &str) -> Option<String> {
    let mut rest = statement.trim_start();

    let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let after = &rest[digits..];
        // `10goto` is not a line number followed by a command
        if after.starts_with(char::is_whitespace) {
            rest = after.trim_start();
        }
    }

    let word: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    (!word.is_empty()).then_some(word)
}

/// Whether the console must refuse to run this statement.
pub fn is_blocked_in_console(statement: &str) -> bool {
    first_keyword(statement).is_some_and(|word| BLOCKED_COMMANDS.contains(&word.as_str()))
}

/// Check if a source line carries no code.
pub fn is_comment(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('\'') || first_keyword(trimmed).as_deref() == Some("rem")
}
