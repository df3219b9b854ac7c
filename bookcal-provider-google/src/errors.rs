//! Maps failures onto protocol error kinds.

use std::fmt;

use bookcal_core::provider::protocol::ErrorKind;

/// A calendar or event that does not exist (any more).
#[derive(Debug)]
pub struct NotFound(pub String);

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} not found", self.0)
    }
}

impl std::error::Error for NotFound {}

/// The Google client reports HTTP failures only through its message text.
/// Only the client's own error is read; context added on top may quote
/// event titles.
pub fn classify(error: &anyhow::Error) -> Option<ErrorKind> {
    if error.chain().any(|cause| cause.is::<NotFound>()) {
        return Some(ErrorKind::NotFound);
    }

    let text = error.root_cause().to_string();
    let has = |codes: &[&str]| codes.iter().any(|code| text.contains(code));

    if has(&["404", "410", "Not Found", "Gone"]) {
        Some(ErrorKind::NotFound)
    } else if has(&["401", "403", "Unauthorized", "Forbidden"]) {
        Some(ErrorKind::Auth)
    } else if has(&["400", "409", "412", "Bad Request"]) {
        Some(ErrorKind::Rejected)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_not_found_marker_survives_context() {
        let err = Err::<(), _>(NotFound("calendar studio".into()))
            .context("Failed to resolve calendar")
            .unwrap_err();
        assert_eq!(classify(&err), Some(ErrorKind::NotFound));
    }

    #[test]
    fn test_http_codes_in_messages() {
        let gone = anyhow::anyhow!("code: 410 Gone, error: Resource has been deleted");
        let denied = anyhow::anyhow!("code: 403 Forbidden, error: insufficient scope");
        let bad = anyhow::anyhow!("code: 400 Bad Request, error: invalid end time");
        let network = anyhow::anyhow!("error sending request: connection reset");

        assert_eq!(classify(&gone), Some(ErrorKind::NotFound));
        assert_eq!(classify(&denied), Some(ErrorKind::Auth));
        assert_eq!(classify(&bad), Some(ErrorKind::Rejected));
        assert_eq!(classify(&network), None);
    }

    #[test]
    fn test_event_title_does_not_look_like_a_status() {
        let err = Err::<(), _>(anyhow::anyhow!("error sending request: connection reset"))
            .context("Failed to create event: [HEAVY] Room 404")
            .unwrap_err();
        assert_eq!(classify(&err), None);

        let err = Err::<(), _>(anyhow::anyhow!("code: 404 Not Found, error: Not Found"))
            .context("Failed to update event: [LIGHT] Gone fishing")
            .unwrap_err();
        assert_eq!(classify(&err), Some(ErrorKind::NotFound));
    }
}
