//! Text formats exchanged with the operator chat.

use buran_common::escape_html;

/// Label that precedes the visitor id in relayed messages.
pub const CONVERSATION_MARKER: &str = "Foydalanuvchi:";

/// HTML body relayed to the operator for one visitor message.
pub fn visitor_envelope(user_id: &str, text: &str) -> String {
    format!(
        "👤 <b>{CONVERSATION_MARKER}</b> {}\n\n💬 <b>Xabar:</b>\n{}",
        escape_html(user_id),
        escape_html(text)
    )
}

/// Visitor id named by a `Foydalanuvchi: <id>` line, if `text` has one.
///
/// Works on both the plain text Telegram delivers in updates and the HTML
/// we send (where the marker is followed by a closing `</b>`).
pub fn extract_conversation_marker(text: &str) -> Option<&str> {
    let start = text.find(CONVERSATION_MARKER)? + CONVERSATION_MARKER.len();
    let mut rest = &text[start..];
    if let Some(stripped) = rest.strip_prefix("</b>") {
        rest = stripped;
    }
    let rest = rest.trim_start();
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let token = &rest[..end];
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[test]
    fn envelope_matches_operator_format() {
        assert_eq!(
            visitor_envelope("abc123", "Salom"),
            "👤 <b>Foydalanuvchi:</b> abc123\n\n💬 <b>Xabar:</b>\nSalom"
        );
    }

    #[test]
    fn envelope_escapes_visitor_input() {
        let body = visitor_envelope("u<1>", "<script>&");
        assert!(body.contains("u&lt;1&gt;"));
        assert!(body.contains("&lt;script&gt;&amp;"));
    }

    #[rstest]
    #[case("👤 Foydalanuvchi: abc123\n\n💬 Xabar:\nSalom", Some("abc123"))]
    #[case("Foydalanuvchi:\tu-42 extra", Some("u-42"))]
    #[case("Foydalanuvchi:", None)]
    #[case("Foydalanuvchi:   \n", None)]
    #[case("no marker here", None)]
    fn extracts_marker_token(#[case] text: &str, #[case] expected: Option<&str>) {
        assert_eq!(extract_conversation_marker(text), expected);
    }

    #[test]
    fn extracts_from_own_envelope() {
        let body = visitor_envelope("abc123", "hi");
        assert_eq!(extract_conversation_marker(&body), Some("abc123"));
    }
}
