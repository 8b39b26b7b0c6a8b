//! OAuth 1.0a request signing (HMAC-SHA1) for the Twitter API.
//!
//! Only request signing lives here; obtaining tokens is done elsewhere and
//! the four credentials arrive already decrypted.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use postvault_core::SecretString;
use postvault_secrets::TwitterCredentials;
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha1::Sha1;
use urlencoding::encode;

type HmacSha1 = Hmac<Sha1>;

const NONCE_LEN: usize = 32;

/// Signs requests with a user-context OAuth 1.0a credential set.
#[derive(Debug, Clone)]
pub struct OAuth1Signer {
    consumer_key: SecretString,
    consumer_secret: SecretString,
    token: SecretString,
    token_secret: SecretString,
}

impl OAuth1Signer {
    pub fn new(credentials: TwitterCredentials) -> Self {
        Self {
            consumer_key: credentials.consumer_key,
            consumer_secret: credentials.consumer_secret,
            token: credentials.access_token,
            token_secret: credentials.access_token_secret,
        }
    }

    /// Build the `Authorization` header for a request.
    ///
    /// `url` must not contain a query string; query and form-encoded body
    /// parameters go in `params`. JSON and multipart bodies are not signed.
    pub fn authorization_header(&self, method: &str, url: &str, params: &[(&str, &str)]) -> String {
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LEN)
            .map(char::from)
            .collect();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        self.authorization_header_with(method, url, params, &nonce, &timestamp)
    }

    /// Deterministic variant of [`Self::authorization_header`].
    pub fn authorization_header_with(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
        nonce: &str,
        timestamp: &str,
    ) -> String {
        let oauth_params = [
            ("oauth_consumer_key", self.consumer_key.expose_secret()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", timestamp),
            ("oauth_token", self.token.expose_secret()),
            ("oauth_version", "1.0"),
        ];
        let signature = self.sign(method, url, params, &oauth_params);

        let fields: Vec<String> = oauth_params
            .iter()
            .copied()
            .chain(std::iter::once(("oauth_signature", signature.as_str())))
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .collect();
        format!("OAuth {}", fields.join(", "))
    }

    fn sign(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
        oauth_params: &[(&str, &str)],
    ) -> String {
        let all: Vec<(&str, &str)> = params.iter().chain(oauth_params).copied().collect();
        let base = signature_base_string(method, url, &all);
        let key = format!(
            "{}&{}",
            encode(self.consumer_secret.expose_secret()),
            encode(self.token_secret.expose_secret())
        );

        let mut mac =
            HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC can take a key of any size");
        mac.update(base.as_bytes());
        STANDARD.encode(mac.finalize().into_bytes())
    }
}

/// `METHOD&url&params`, each component percent-encoded, params sorted.
fn signature_base_string(method: &str, url: &str, params: &[(&str, &str)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k).into_owned(), encode(v).into_owned()))
        .collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(url),
        encode(&param_string)
    )
}
