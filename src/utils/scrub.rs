//! Redaction of credential values from surfaced text.

/// Replace every occurrence of the given secret values in `message` with
/// `[redacted]`.
///
/// Applied by the rotation orchestrator to every error message that crossed
/// a provider or location boundary while a live credential value was in
/// scope, so that no error, log line, or displayed text can carry the value.
pub fn scrub_secrets(message: &str, secrets: &[&str]) -> String {
    let mut out = message.to_string();
    for secret in secrets {
        if !secret.is_empty() {
            out = out.replace(secret, "[redacted]");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_every_occurrence() {
        let msg = "failed writing sk-live-123: echo sk-live-123 rejected";
        let out = scrub_secrets(msg, &["sk-live-123"]);
        assert_eq!(out, "failed writing [redacted]: echo [redacted] rejected");
    }

    #[test]
    fn empty_secret_is_ignored() {
        let out = scrub_secrets("nothing to hide", &[""]);
        assert_eq!(out, "nothing to hide");
    }

    #[test]
    fn scrubs_multiple_values() {
        let out = scrub_secrets("old=aaa new=bbb", &["aaa", "bbb"]);
        assert_eq!(out, "old=[redacted] new=[redacted]");
    }
}
