// Google service account auth and the Sheets REST API.
//
// Everything that touches HTTP, JSON wire formats or RSA lives here; the
// core layer only sees the `AssertionSigner`, `TokenExchange` and
// `SheetsApi` traits.

pub mod assertion_signer;
pub mod credential_store;
pub mod sheets_client;
pub mod token_client;

#[cfg(test)]
mod test_server;

use reqwest::Client;
use std::time::Duration;

pub use assertion_signer::ServiceAccountSigner;
pub use sheets_client::GoogleSheetsClient;
pub use token_client::GoogleTokenClient;

/// Shared HTTP client. Every request made through it (token exchange,
/// range reads and writes) is bounded by `timeout`.
pub fn http_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder().timeout(timeout).build()
}
