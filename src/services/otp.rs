use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Codes are scoped to 600-second windows since the epoch.
pub const WINDOW_SECS: i64 = 600;

/// Derives and verifies the 6-digit signature codes without storing any
/// per-code state: the code is an HMAC over (booking id, on-file email,
/// time window). A code stays valid for its own window plus the following
/// one, covering window-boundary and delivery latency.
pub struct OtpAuthenticator {
    secret: String,
}

impl OtpAuthenticator {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }

    fn code_for_window(&self, id: &str, email_norm: &str, window: i64) -> String {
        let mut mac = match Hmac::<Sha256>::new_from_slice(self.secret.as_bytes()) {
            Ok(m) => m,
            Err(_) => return String::new(),
        };
        mac.update(format!("{id}.{email_norm}.{window}").as_bytes());
        let digest = mac.finalize().into_bytes();

        let n = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
        format!("{:06}", n % 1_000_000)
    }

    /// The code for the current window, to be emailed to the booking's
    /// on-file address.
    pub fn current_code(&self, id: &str, email: &str, now: i64) -> String {
        let email_norm = email.trim().to_lowercase();
        self.code_for_window(id, &email_norm, now / WINDOW_SECS)
    }

    /// Accepts the current window's code and the immediately preceding
    /// window's (grace for codes received just before a boundary). Non-digit
    /// characters in the input are stripped and the rest truncated to six.
    pub fn verify(&self, id: &str, email: &str, supplied: &str, now: i64) -> bool {
        let digits: String = supplied.chars().filter(|c| c.is_ascii_digit()).take(6).collect();
        if digits.len() != 6 {
            return false;
        }

        let email_norm = email.trim().to_lowercase();
        let window = now / WINDOW_SECS;

        digits == self.code_for_window(id, &email_norm, window)
            || digits == self.code_for_window(id, &email_norm, window - 1)
    }
}
