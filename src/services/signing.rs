use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Moderation links stay valid for 7 days.
pub const LINK_TTL_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationAction {
    Accepted,
    Refused,
    Reply,
}

impl ModerationAction {
    /// Maps every action spelling ever emitted in a link to its canonical
    /// form. Unknown strings are invalid.
    pub fn normalize(raw: &str) -> Option<Self> {
        match raw {
            "accept" | "accepted" => Some(ModerationAction::Accepted),
            "reject" | "rejected" | "refused" => Some(ModerationAction::Refused),
            "reply" => Some(ModerationAction::Reply),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationAction::Accepted => "accepted",
            ModerationAction::Refused => "refused",
            ModerationAction::Reply => "reply",
        }
    }
}

/// Signs and validates the one-click moderation links embedded in host
/// emails. Two message formats are live: the canonical query-style message
/// and the legacy dotted message older links were signed with. Validation
/// tries each in order and accepts the first match; formats are appended,
/// never removed, while old links may still be outstanding.
pub struct LinkSigner {
    secret: String,
}

impl LinkSigner {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }

    fn hmac_hex(&self, message: &str) -> String {
        let mut mac = match Hmac::<Sha256>::new_from_slice(self.secret.as_bytes()) {
            Ok(m) => m,
            Err(_) => return String::new(),
        };
        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn canonical_message(id: &str, action: ModerationAction, exp: i64) -> String {
        format!("id={id}&action={}&exp={exp}", action.as_str())
    }

    /// Legacy links were signed over the raw, unnormalized action string
    /// (e.g. "accept" rather than "accepted").
    fn legacy_message(id: &str, raw_action: &str, exp: i64) -> String {
        format!("{id}.{raw_action}.{exp}")
    }

    /// Hex signature for a new link (canonical format only).
    pub fn sign(&self, id: &str, action: ModerationAction, exp: i64) -> String {
        self.hmac_hex(&Self::canonical_message(id, action, exp))
    }

    /// Validates a link's parameters against every live format. Returns the
    /// normalized action on success; any missing value, unknown action,
    /// malformed or past expiry, or signature mismatch is invalid.
    pub fn verify(
        &self,
        id: &str,
        raw_action: &str,
        exp: &str,
        sig: &str,
        now: i64,
    ) -> Option<ModerationAction> {
        if id.is_empty() || raw_action.is_empty() || exp.is_empty() || sig.is_empty() {
            return None;
        }

        let action = ModerationAction::normalize(raw_action)?;

        let exp_secs: i64 = exp.parse().ok()?;
        if exp_secs < now {
            return None;
        }

        let candidates = [
            self.hmac_hex(&Self::canonical_message(id, action, exp_secs)),
            self.hmac_hex(&Self::legacy_message(id, raw_action, exp_secs)),
        ];

        if candidates.iter().any(|expected| expected == sig) {
            Some(action)
        } else {
            None
        }
    }
}
