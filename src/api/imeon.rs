mod endpoint;
mod error;

use std::time::Duration;

use reqwest::{
    Response,
    StatusCode,
    header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, ORIGIN, REFERER},
};
use serde_json::Value;
use tokio::sync::Mutex;

pub use self::{
    endpoint::{InstantKind, MonitorRange},
    error::{Error, Result},
};
use self::endpoint::Stage;
use crate::prelude::{debug, info, instrument, warn};

/// The firmware keys its session cookie to a browser-looking client.
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

const PREVIEW_LENGTH: usize = 200;

/// Local LAN client of an Imeon inverter.
pub struct Client {
    inner: reqwest::Client,
    base_url: String,

    /// Credentials of the last successful login, also serving as the login guard.
    credentials: Mutex<Option<Credentials>>,
}

struct Credentials {
    username: String,
    password: String,
}

enum Body {
    Json(Value),
    Other { content_type: String, preview: String },
}

impl Client {
    /// Build a client for `host`, which may carry an `http://` or `https://` prefix.
    pub fn new(host: &str, timeout: Duration) -> Result<Self> {
        let host = host
            .trim()
            .trim_start_matches("http://")
            .trim_start_matches("https://")
            .trim_end_matches('/');
        let base_url = format!("http://{host}");
        let header_value =
            |value: &str| HeaderValue::from_str(value).map_err(|_| Error::InvalidHost(host.to_owned()));
        let headers = HeaderMap::from_iter([
            (ACCEPT, HeaderValue::from_static("application/json, text/plain, */*")),
            (REFERER, header_value(&format!("{base_url}/"))?),
            (ORIGIN, header_value(&base_url)?),
        ]);
        let inner = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .cookie_store(true)
            .timeout(timeout)
            .build()?;
        Ok(Self { inner, base_url, credentials: Mutex::new(None) })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Host name without the scheme, as used in the sensor IDs.
    pub fn host(&self) -> &str {
        self.base_url.trim_start_matches("http://")
    }

    /// Log in and remember the credentials for silent re-login.
    #[instrument(skip_all, fields(base_url = %self.base_url, username = username))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Value> {
        let mut stored = self.credentials.lock().await;
        let credentials =
            Credentials { username: username.to_owned(), password: password.to_owned() };
        let body = self.post_login(&credentials).await?;
        *stored = Some(credentials);
        Ok(body)
    }

    /// Fetch an instant snapshot, re-logging in and falling back to `/scan` when the device
    /// answers with anything but JSON.
    #[instrument(skip_all, fields(kind = ?kind))]
    pub async fn fetch_instant(&self, kind: InstantKind) -> Result<Value> {
        let mut stage = Stage::Initial;
        let mut target = kind;
        loop {
            let path = target.path();
            let (content_type, preview) = match self.get(path).await? {
                Body::Json(value) => return Ok(value),
                Body::Other { content_type, preview } => (content_type, preview),
            };
            warn!(path, content_type = %content_type, ?stage, "unexpected response type");
            if stage == Stage::Initial && self.try_relogin().await {
                stage = Stage::RetriedLogin;
            } else if stage != Stage::TriedFallback && kind == InstantKind::Primary {
                info!("falling back to the scan endpoint…");
                target = InstantKind::Scan;
                stage = Stage::TriedFallback;
            } else {
                return Err(Error::UnexpectedResponseType {
                    path: path.to_owned(),
                    content_type,
                    preview,
                });
            }
        }
    }

    /// Fetch the aggregated monitor data, decoding a JSON-encoded `result` in place.
    #[instrument(skip_all, fields(range = %range))]
    pub async fn fetch_monitor(&self, range: MonitorRange) -> Result<Value> {
        let path = format!("/api/monitor?time={range}");
        let mut value = self.get_json(&path).await?;
        decode_embedded_result(&mut value);
        Ok(value)
    }

    #[instrument(skip_all)]
    pub async fn fetch_energy(&self) -> Result<Value> {
        self.get_json("/api/energy").await
    }

    /// Log in again with the stored credentials.
    ///
    /// Returns `false` when none are known or the login fails, so that the caller moves on.
    async fn try_relogin(&self) -> bool {
        match self.relogin().await {
            Ok(relogged_in) => relogged_in,
            Err(error) => {
                warn!("failed to log in again: {error}");
                false
            }
        }
    }

    async fn relogin(&self) -> Result<bool> {
        let stored = self.credentials.lock().await;
        let Some(credentials) = &*stored else {
            return Ok(false);
        };
        info!("session expired, logging in again…");
        self.post_login(credentials).await?;
        Ok(true)
    }

    async fn post_login(&self, credentials: &Credentials) -> Result<Value> {
        info!("logging in…");
        let response = self
            .inner
            .post(self.url("/login"))
            .form(&[
                ("do_login", "true"),
                ("email", credentials.username.as_str()),
                ("passwd", credentials.password.as_str()),
            ])
            .send()
            .await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::Auth { reason: format!("login responded with {status}") });
        }
        match read_body(response).await? {
            Body::Json(value) => {
                debug!("logged in");
                Ok(value)
            }
            Body::Other { content_type, preview } => Err(Error::Auth {
                reason: format!("unexpected login response type `{content_type}`: {preview}"),
            }),
        }
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        match self.get(path).await? {
            Body::Json(value) => Ok(value),
            Body::Other { content_type, preview } => {
                Err(Error::UnexpectedResponseType { path: path.to_owned(), content_type, preview })
            }
        }
    }

    async fn get(&self, path: &str) -> Result<Body> {
        debug!(path, "fetching…");
        let response = self.inner.get(self.url(path)).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::Status { path: path.to_owned(), status });
        }
        read_body(response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

async fn read_body(response: Response) -> Result<Body> {
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_lowercase();
    if content_type.contains("application/json") {
        Ok(Body::Json(serde_json::from_slice(&response.bytes().await?)?))
    } else {
        let preview = response.text().await?.chars().take(PREVIEW_LENGTH).collect();
        Ok(Body::Other { content_type, preview })
    }
}

fn decode_embedded_result(value: &mut Value) {
    let Some(result) = value.get_mut("result") else {
        return;
    };
    let Some(encoded) = result.as_str() else {
        return;
    };
    match serde_json::from_str::<Value>(encoded) {
        Ok(decoded) => *result = decoded,
        Err(error) => debug!(%error, "keeping the undecodable `result` string"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    use super::*;

    const JSON: &str = "application/json";

    fn new_client(server: &ServerGuard) -> Client {
        Client::new(&server.url(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn new_strips_scheme_ok() -> Result<()> {
        let client = Client::new("https://192.168.1.20/", Duration::from_secs(1))?;
        assert_eq!(client.base_url(), "http://192.168.1.20");
        assert_eq!(client.host(), "192.168.1.20");
        Ok(())
    }

    #[tokio::test]
    async fn login_ok() -> Result<()> {
        let mut server = Server::new_async().await;
        let login = server
            .mock("POST", "/login")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("do_login".into(), "true".into()),
                Matcher::UrlEncoded("email".into(), "installer@local".into()),
                Matcher::UrlEncoded("passwd".into(), "secret".into()),
            ]))
            .with_status(200)
            .with_header("content-type", JSON)
            .with_body(r#"{"accessGranted": true}"#)
            .create_async()
            .await;

        let body = new_client(&server).login("installer@local", "secret").await?;

        assert_eq!(body, json!({"accessGranted": true}));
        login.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn login_html_is_auth_error() {
        let mut server = Server::new_async().await;
        let _login = server
            .mock("POST", "/login")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body("<html>".repeat(100))
            .create_async()
            .await;

        let error = new_client(&server).login("user", "password").await.unwrap_err();

        match error {
            Error::Auth { reason } => {
                assert!(reason.contains("text/html"));
                assert!(reason.len() < 300);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn login_rejected_is_auth_error() {
        let mut server = Server::new_async().await;
        let _login = server.mock("POST", "/login").with_status(401).create_async().await;

        let result = new_client(&server).login("user", "password").await;

        assert!(matches!(result, Err(Error::Auth { .. })));
    }

    #[tokio::test]
    async fn html_primary_relogins_once_then_falls_back_to_scan() -> Result<()> {
        let mut server = Server::new_async().await;
        let login = server
            .mock("POST", "/login")
            .with_status(200)
            .with_header("content-type", JSON)
            .with_body("{}")
            .expect(2)
            .create_async()
            .await;
        let data = server
            .mock("GET", "/data")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html>login</html>")
            .expect(2)
            .create_async()
            .await;
        let scan = server
            .mock("GET", "/scan")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", JSON)
            .with_body(r#"{"val": [{"battery_soc": 55}]}"#)
            .expect(1)
            .create_async()
            .await;

        let client = new_client(&server);
        client.login("user", "password").await?;
        let value = client.fetch_instant(InstantKind::Primary).await?;

        assert_eq!(value, json!({"val": [{"battery_soc": 55}]}));
        login.assert_async().await;
        data.assert_async().await;
        scan.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn html_primary_without_credentials_falls_back_to_scan() -> Result<()> {
        let mut server = Server::new_async().await;
        let login = server.mock("POST", "/login").expect(0).create_async().await;
        let _data = server
            .mock("GET", "/data")
            .with_status(200)
            .with_header("content-type", "text/html")
            .create_async()
            .await;
        let scan = server
            .mock("GET", "/scan")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", JSON)
            .with_body(r#"{"val": []}"#)
            .create_async()
            .await;

        let value = new_client(&server).fetch_instant(InstantKind::Primary).await?;

        assert_eq!(value, json!({"val": []}));
        login.assert_async().await;
        scan.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn failed_relogin_falls_back_to_scan() -> Result<()> {
        let mut server = Server::new_async().await;
        let login = server
            .mock("POST", "/login")
            .with_status(200)
            .with_header("content-type", JSON)
            .with_body(r#"{"accessGranted": true}"#)
            .create_async()
            .await;
        let client = new_client(&server);
        client.login("installer@local", "secret").await?;
        login.remove_async().await;

        let html_login = server
            .mock("POST", "/login")
            .expect(1)
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html>login</html>")
            .create_async()
            .await;
        let data = server
            .mock("GET", "/data")
            .expect(1)
            .with_status(200)
            .with_header("content-type", "text/html")
            .create_async()
            .await;
        let scan = server
            .mock("GET", "/scan")
            .match_query(Matcher::Any)
            .expect(1)
            .with_status(200)
            .with_header("content-type", JSON)
            .with_body(r#"{"val": [{"em_power": 1}]}"#)
            .create_async()
            .await;

        let value = client.fetch_instant(InstantKind::Primary).await?;

        assert_eq!(value, json!({"val": [{"em_power": 1}]}));
        html_login.assert_async().await;
        data.assert_async().await;
        scan.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn logins_do_not_overlap() -> Result<()> {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_in_flight = Arc::new(AtomicUsize::new(0));
        let mut server = Server::new_async().await;
        let login = server
            .mock("POST", "/login")
            .expect(2)
            .with_status(200)
            .with_header("content-type", JSON)
            .with_body_from_request({
                let in_flight = Arc::clone(&in_flight);
                let max_in_flight = Arc::clone(&max_in_flight);
                move |_| {
                    let n_in_flight = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    max_in_flight.fetch_max(n_in_flight, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(100));
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    br#"{"accessGranted": true}"#.to_vec()
                }
            })
            .create_async()
            .await;
        let client = new_client(&server);

        let (first, (guard_was_held, second)) = tokio::join!(
            client.login("installer@local", "first"),
            async {
                // The first login is awaiting its response by now and holds the guard.
                let guard_was_held = client.credentials.try_lock().is_err();
                (guard_was_held, client.login("installer@local", "second").await)
            },
        );
        first?;
        second?;

        assert!(guard_was_held);
        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
        login.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn html_status_is_unexpected_after_one_relogin() {
        let mut server = Server::new_async().await;
        let login = server
            .mock("POST", "/login")
            .with_status(200)
            .with_header("content-type", JSON)
            .with_body("{}")
            .expect(2)
            .create_async()
            .await;
        let status = server
            .mock("GET", "/imeon-status")
            .with_status(200)
            .with_header("content-type", "text/plain")
            .with_body("nope")
            .expect(2)
            .create_async()
            .await;

        let client = new_client(&server);
        client.login("user", "password").await.unwrap();
        let error = client.fetch_instant(InstantKind::Status).await.unwrap_err();

        match error {
            Error::UnexpectedResponseType { path, content_type, preview } => {
                assert_eq!(path, "/imeon-status");
                assert_eq!(content_type, "text/plain");
                assert_eq!(preview, "nope");
            }
            other => panic!("unexpected error: {other}"),
        }
        login.assert_async().await;
        status.assert_async().await;
    }

    #[tokio::test]
    async fn non_ok_status_is_status_error() {
        let mut server = Server::new_async().await;
        let _energy = server.mock("GET", "/api/energy").with_status(404).create_async().await;

        let result = new_client(&server).fetch_energy().await;

        assert!(matches!(result, Err(Error::Status { status: StatusCode::NOT_FOUND, .. })));
    }

    #[tokio::test]
    async fn monitor_decodes_embedded_result() -> Result<()> {
        let mut server = Server::new_async().await;
        let _monitor = server
            .mock("GET", "/api/monitor")
            .match_query(Matcher::UrlEncoded("time".into(), "hour".into()))
            .with_status(200)
            .with_header("content-type", JSON)
            .with_body(json!({"result": r#"[{"pv_power": 1200}]"#}).to_string())
            .create_async()
            .await;

        let value = new_client(&server).fetch_monitor(MonitorRange::Hour).await?;

        assert_eq!(value, json!({"result": [{"pv_power": 1200}]}));
        Ok(())
    }

    #[test]
    fn undecodable_result_is_kept() {
        let mut value = json!({"result": "{not json"});
        decode_embedded_result(&mut value);
        assert_eq!(value, json!({"result": "{not json"}));
    }
}
