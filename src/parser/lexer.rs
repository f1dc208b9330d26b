//! Sequence Message Lexer
//!
//! Splits a single message line into source, arrow, activation marker,
//! target and text. Participant resolution happens later in validation.

/// Arrow tokens of sequence messages, longest first so that `-->>` wins over `->`
pub const ARROWS: &[&str] = &[
    "<<-->>", "<<->>", "-->>", "->>", "-->", "--x", "--)", "->", "-x", "-)",
];

/// Activation shorthand attached to a message arrow (`->>+` / `-->>-`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationMarker {
    /// `+`: activates the message target
    Activate,
    /// `-`: deactivates the message source
    Deactivate,
}

/// The pieces of a message line like `Alice->>+Bob: Hello`
#[derive(Debug, Clone, PartialEq)]
pub struct MessageTokens<'a> {
    pub source: &'a str,
    pub arrow: &'static str,
    pub marker: Option<ActivationMarker>,
    /// Byte offset of the marker character within the tokenized line
    pub marker_at: Option<usize>,
    pub target: &'a str,
    pub text: Option<&'a str>,
}

/// Tokenize a message line
///
/// Returns `None` when the line carries no arrow or when source/target are not
/// single name tokens. Leading whitespace is allowed, so the original
/// (untrimmed) line can be passed and `marker_at` stays valid for it.
pub fn tokenize_message(line: &str) -> Option<MessageTokens<'_>> {
    // Participants never contain ':', everything after it is message text
    let (head, text) = match line.split_once(':') {
        Some((head, text)) => (head, Some(text.trim())),
        None => (line, None),
    };

    let (arrow_at, arrow) = find_arrow(head)?;
    let source = head[..arrow_at].trim();

    let after_arrow = arrow_at + arrow.len();
    let rest = &head[after_arrow..];
    let skipped = rest.len() - rest.trim_start().len();
    let marker_pos = after_arrow + skipped;

    let (marker, marker_at, target_start) = match head[marker_pos..].chars().next() {
        Some('+') => (Some(ActivationMarker::Activate), Some(marker_pos), marker_pos + 1),
        Some('-') => (
            Some(ActivationMarker::Deactivate),
            Some(marker_pos),
            marker_pos + 1,
        ),
        _ => (None, None, marker_pos),
    };

    let target = head[target_start..].trim();

    if !is_name_token(source) || !is_name_token(target) {
        return None;
    }

    Some(MessageTokens {
        source,
        arrow,
        marker,
        marker_at,
        target,
        text,
    })
}

/// Find the earliest arrow in the text, preferring the longest token at a position
fn find_arrow(text: &str) -> Option<(usize, &'static str)> {
    for (idx, _) in text.char_indices() {
        let tail = &text[idx..];
        if let Some(arrow) = ARROWS.iter().find(|arrow| tail.starts_with(**arrow)) {
            return Some((idx, arrow));
        }
    }
    None
}

fn is_name_token(text: &str) -> bool {
    !text.is_empty() && !text.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_plain_message() {
        let tokens = tokenize_message("Alice->>Bob: Hello there").unwrap();

        assert_eq!(tokens.source, "Alice");
        assert_eq!(tokens.arrow, "->>");
        assert_eq!(tokens.target, "Bob");
        assert_eq!(tokens.marker, None);
        assert_eq!(tokens.text, Some("Hello there"));
    }

    #[test]
    fn test_tokenize_activation_marker() {
        let tokens = tokenize_message("Client->>+Server: Request").unwrap();

        assert_eq!(tokens.marker, Some(ActivationMarker::Activate));
        assert_eq!(tokens.target, "Server");
        assert_eq!(tokens.marker_at, Some(9));
    }

    #[test]
    fn test_tokenize_deactivation_marker_keeps_offset_with_indent() {
        let line = "    Server-->>-Client: Response";
        let tokens = tokenize_message(line).unwrap();

        assert_eq!(tokens.arrow, "-->>");
        assert_eq!(tokens.marker, Some(ActivationMarker::Deactivate));
        assert_eq!(tokens.source, "Server");
        assert_eq!(&line[tokens.marker_at.unwrap()..][..1], "-");
    }

    #[test]
    fn test_longest_arrow_wins() {
        assert_eq!(tokenize_message("A-->B").unwrap().arrow, "-->");
        assert_eq!(tokenize_message("A--xB").unwrap().arrow, "--x");
        assert_eq!(tokenize_message("A-)B: async").unwrap().arrow, "-)");
        assert_eq!(tokenize_message("A<<->>B: both").unwrap().arrow, "<<->>");
    }

    #[test]
    fn test_message_without_text() {
        let tokens = tokenize_message("A->>B").unwrap();
        assert_eq!(tokens.text, None);
    }

    #[test]
    fn test_rejects_prose_and_missing_target() {
        assert!(tokenize_message("this line -> is prose").is_none());
        assert!(tokenize_message("A->>: nobody").is_none());
        assert!(tokenize_message("no arrow here").is_none());
    }

    #[test]
    fn test_arrow_inside_text_is_ignored() {
        let tokens = tokenize_message("A->>B: a -> b").unwrap();
        assert_eq!(tokens.target, "B");
        assert_eq!(tokens.text, Some("a -> b"));
    }
}
