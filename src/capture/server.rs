use super::{CaptureService, Submission};
use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

const LOGIN_PAGE: &str = include_str!("../../assets/login.html");
const UNAVAILABLE_MESSAGE: &str =
    "We're experiencing technical difficulties. Please try again later.";

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CaptureService>,
    /// Read the client address from X-Forwarded-For
    pub trust_proxy_headers: bool,
}

/// Credentials pulled out of a login POST body
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl LoginForm {
    /// Read the body as url-encoded pairs whatever the declared content type.
    ///
    /// The first value of a repeated field wins. Anything that is not a
    /// form (JSON, binary, empty) yields no fields rather than an error.
    pub fn from_body(body: &[u8]) -> Self {
        let mut form = LoginForm::default();
        for (key, value) in url::form_urlencoded::parse(body) {
            let slot = match &*key {
                "username" => &mut form.username,
                "password" => &mut form.password,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        form
    }
}

/// Routes for the fake sign-on page
pub fn router(service: Arc<CaptureService>, trust_proxy_headers: bool) -> Router {
    let state = AppState {
        service,
        trust_proxy_headers,
    };

    Router::new()
        .route("/", get(index_handler))
        .route("/login", post(login_handler))
        .layer(middleware::map_response(security_headers))
        .with_state(state)
}

async fn index_handler() -> Html<String> {
    render_page(None)
}

async fn login_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let form = LoginForm::from_body(&body);
    let user_agent = headers
        .get(header::USER_AGENT)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());

    let submission = Submission {
        username: form.username,
        password: form.password,
        source_ip: client_ip(peer, &headers, state.trust_proxy_headers),
        user_agent,
    };

    match state.service.capture(submission).await {
        Ok(message) => render_page(Some(message)).into_response(),
        Err(e) => {
            log::error!("Failed to record login attempt: {}", e);
            let page = render_page(Some(UNAVAILABLE_MESSAGE));
            (StatusCode::INTERNAL_SERVER_ERROR, page).into_response()
        }
    }
}

/// Headers a real bank front end would send
async fn security_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN"));
    headers.insert(header::X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block"));
    response
}

/// Client address as logged
///
/// Behind a reverse proxy only the right-most X-Forwarded-For entry is
/// trusted, since that is the one the proxy itself appended.
pub fn client_ip(peer: SocketAddr, headers: &HeaderMap, trust_proxy_headers: bool) -> String {
    let forwarded = if trust_proxy_headers {
        headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit(',').map(str::trim).find(|hop| !hop.is_empty()))
            .and_then(|hop| hop.parse::<IpAddr>().ok())
    } else {
        None
    };

    display_ip(forwarded.unwrap_or_else(|| peer.ip()))
}

fn display_ip(ip: IpAddr) -> String {
    match ip {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => v4.to_string(),
            None => v6.to_string(),
        },
        IpAddr::V4(v4) => v4.to_string(),
    }
}

fn render_page(error: Option<&str>) -> Html<String> {
    let banner = match error {
        Some(message) => format!(
            "<div class=\"error\">{}</div>",
            html_escape::encode_text(message)
        ),
        None => String::new(),
    };
    Html(LOGIN_PAGE.replace("{{error}}", &banner))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{LogWriter, ResponsePicker, FAILURE_MESSAGES};
    use crate::input::LogLineParser;
    use axum::body::{to_bytes, Body};
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::Request;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::path::PathBuf;
    use tower::ServiceExt;

    fn app(path: PathBuf, trust_proxy_headers: bool) -> Router {
        let (log, _task) = LogWriter::spawn(path, 8);
        let picker = ResponsePicker::with_rng(0..=0, StdRng::seed_from_u64(11));
        let service = Arc::new(CaptureService::new(log, picker));
        router(service, trust_proxy_headers)
            .layer(MockConnectInfo(SocketAddr::from(([203, 0, 113, 7], 51234))))
    }

    fn bare_login_request(content_type: Option<&str>, body: &'static str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/login")
            .header(header::USER_AGENT, "Mozilla/5.0");
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        builder.body(Body::from(body)).unwrap()
    }

    async fn page_text(response: Response) -> String {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    fn login_request(body: &'static str, forwarded: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(header::USER_AGENT, "curl/7.68.0");
        if let Some(hops) = forwarded {
            builder = builder.header("x-forwarded-for", hops);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn test_index_serves_login_page() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(dir.path().join("attacks.log"), false)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-frame-options"], "SAMEORIGIN");
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let page = String::from_utf8(body.to_vec()).unwrap();
        assert!(page.contains("action=\"/login\""));
        assert!(!page.contains("{{error}}"));
    }

    #[tokio::test]
    async fn test_login_records_and_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attacks.log");
        let response = app(path.clone(), false)
            .oneshot(login_request("username=admin&password=hunter2", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-xss-protection"], "1; mode=block");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let page = String::from_utf8(body.to_vec()).unwrap();
        assert!(FAILURE_MESSAGES
            .iter()
            .any(|m| page.contains(&*html_escape::encode_text(m))));

        let contents = std::fs::read_to_string(&path).unwrap();
        let record = LogLineParser::new().unwrap().parse_line(&contents).unwrap();
        assert_eq!(record.source_ip, "203.0.113.7");
        assert_eq!(record.username, "admin");
        assert_eq!(record.password, "hunter2");
        assert!(record.is_bot);
    }

    #[tokio::test]
    async fn test_forwarded_for_only_when_trusted() {
        let dir = tempfile::tempdir().unwrap();

        let trusted = dir.path().join("trusted.log");
        app(trusted.clone(), true)
            .oneshot(login_request("username=a&password=b", Some("10.9.9.9, 198.51.100.4")))
            .await
            .unwrap();
        assert!(std::fs::read_to_string(&trusted).unwrap().contains("IP: 198.51.100.4 |"));

        let untrusted = dir.path().join("untrusted.log");
        app(untrusted.clone(), false)
            .oneshot(login_request("username=a&password=b", Some("198.51.100.4")))
            .await
            .unwrap();
        assert!(std::fs::read_to_string(&untrusted).unwrap().contains("IP: 203.0.113.7 |"));
    }

    #[tokio::test]
    async fn test_write_failure_returns_500() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(dir.path().join("gone").join("attacks.log"), false)
            .oneshot(login_request("username=a&password=b", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()["x-frame-options"], "SAMEORIGIN");
    }

    #[test]
    fn test_ipv4_mapped_peer() {
        let peer: SocketAddr = "[::ffff:192.0.2.10]:443".parse().unwrap();
        assert_eq!(client_ip(peer, &HeaderMap::new(), false), "192.0.2.10");
    }

    #[tokio::test]
    async fn test_login_without_content_type_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attacks.log");
        let response = app(path.clone(), false)
            .oneshot(bare_login_request(None, "username=root&password=toor"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        let page = page_text(response).await;
        assert!(FAILURE_MESSAGES.iter().any(|m| page.contains(m)));

        let contents = std::fs::read_to_string(&path).unwrap();
        let record = LogLineParser::new().unwrap().parse_line(&contents).unwrap();
        assert_eq!(record.username, "root");
        assert_eq!(record.password, "toor");
        assert!(!record.is_bot);
    }

    #[tokio::test]
    async fn test_json_login_is_recorded_without_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attacks.log");
        let response = app(path.clone(), false)
            .oneshot(bare_login_request(
                Some("application/json"),
                r#"{"username":"admin","password":"hunter2"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-frame-options"], "SAMEORIGIN");
        let page = page_text(response).await;
        assert!(!page.contains("Failed to deserialize"));
        assert!(!page.contains("Content-Type"));

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("| Username: - | Password: - |"));
        assert_eq!(contents.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_repeated_field_keeps_first_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attacks.log");
        let response = app(path.clone(), false)
            .oneshot(login_request("username=a&username=b&password=p", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-xss-protection"], "1; mode=block");

        let contents = std::fs::read_to_string(&path).unwrap();
        let record = LogLineParser::new().unwrap().parse_line(&contents).unwrap();
        assert_eq!(record.username, "a");
        assert_eq!(record.password, "p");
    }

    #[test]
    fn test_form_from_body() {
        assert_eq!(
            LoginForm::from_body(b"password=s%20p&username=alice&username=bob"),
            LoginForm {
                username: Some("alice".to_string()),
                password: Some("s p".to_string()),
            }
        );
        assert_eq!(LoginForm::from_body(b""), LoginForm::default());
        assert_eq!(LoginForm::from_body(&[0xff, 0xfe, b'=', 0x00]), LoginForm::default());
    }

    #[test]
    fn test_banner_is_escaped() {
        let Html(page) = render_page(Some("<b>&</b>"));
        assert!(page.contains("<div class=\"error\">&lt;b&gt;&amp;&lt;/b&gt;</div>"));
    }
}
