use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::redirect::Policy;
use reqwest::Client;

const APP_USER_AGENT: &str = concat!("BundleLauncher/", env!("CARGO_PKG_VERSION"));
const MAX_REDIRECTS: usize = 10;

/// Builds the transport client shared by every download worker.
///
/// `identity` encoding keeps `Content-Length` equal to the bytes written to
/// disk, which progress reporting relies on.
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .build()
}
