//! Full authentication and item lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives every client
//! operation over real HTTP through `UreqTransport`.

use std::io::{Read, Write};
use std::net::SocketAddr;
use std::time::Duration;

use mock_server::{MOCK_CONSUMER_KEY, MOCK_USERNAME};
use pocket_core::{
    Action, AddRequest, ApiError, ClientConfig, ItemState, ModifyRequest, PocketClient,
    RetrieveRequest, UreqTransport,
};

const REDIRECT_URI: &str = "app://authorized";

/// Serves exactly one connection with a fixed raw response, after draining
/// the request head and its `Content-Length` body.
fn serve_raw_once(response: &'static [u8]) -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut received = Vec::new();
        let mut chunk = [0u8; 1024];
        let head_end = loop {
            let n = stream.read(&mut chunk).unwrap();
            assert!(n > 0, "client closed before sending a request");
            received.extend_from_slice(&chunk[..n]);
            if let Some(pos) = received.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&received[..head_end]).to_ascii_lowercase();
        let content_length: usize = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .map(|value| value.trim().parse().unwrap())
            .unwrap_or(0);
        while received.len() < head_end + content_length {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            received.extend_from_slice(&chunk[..n]);
        }
        stream.write_all(response).unwrap();
        stream.flush().unwrap();
    });

    addr
}

fn start_mock_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn config(addr: SocketAddr) -> ClientConfig {
    ClientConfig::default()
        .with_base_url(&format!("http://{addr}"))
        .with_timeout(Duration::from_secs(10))
}

#[test]
fn authenticate_then_add_retrieve_modify() {
    let addr = start_mock_server();
    let mut client = PocketClient::with_config(MOCK_CONSUMER_KEY, &config(addr));

    // Step 1: item calls fail before authentication.
    let err = client.retrieve(RetrieveRequest::new()).unwrap_err();
    assert!(matches!(err, ApiError::MissingAccessToken));

    // Step 2: request token and authorization URL.
    let request_token = client.request_token(REDIRECT_URI).unwrap();
    assert!(!request_token.is_empty());
    let auth_url = client.authorization_url(&request_token, REDIRECT_URI);
    assert!(auth_url.starts_with(&format!("http://{addr}/auth/authorize?request_token={request_token}")));

    // Step 3: exchange for an access token.
    let credentials = client.fetch_access_token(&request_token).unwrap();
    assert_eq!(credentials.username, MOCK_USERNAME);
    assert!(client.is_authenticated());
    assert_eq!(client.access_token(), credentials.access_token);

    // Step 4: the request token is single-use.
    let err = client.fetch_access_token(&request_token).unwrap_err();
    assert_eq!(err.service_code(), Some(185));
    assert_eq!(client.access_token(), credentials.access_token);

    // Step 5: add an item.
    let added = client
        .add(
            &AddRequest::new("https://example.com/article")
                .title("Example")
                .tags(["rust", "http"]),
        )
        .unwrap();
    assert_eq!(added["status"], 1);
    let item_id = added["item"]["item_id"].as_str().unwrap().to_string();
    assert_eq!(added["item"]["given_title"], "Example");

    // Step 6: retrieve it with complete detail.
    let listed = client
        .retrieve(RetrieveRequest::new().count(5).complete_item_info())
        .unwrap();
    let item = &listed["list"][&item_id];
    assert_eq!(item["resolved_url"], "https://example.com/article");
    assert!(item["tags"].get("rust").is_some());

    // Step 7: batch modify; results come back in order.
    let modified = client
        .modify(
            &ModifyRequest::new()
                .action(Action::favorite(&item_id))
                .action(Action::archive(&item_id))
                .action(Action::tags_remove(&item_id, &["http"]))
                .action(Action::delete("424242")),
        )
        .unwrap();
    assert_eq!(modified["action_results"], serde_json::json!([true, true, true, false]));

    // Step 8: the item now shows up among archived favorites only.
    let unread = client.retrieve(RetrieveRequest::new()).unwrap();
    assert!(unread["list"].get(&item_id).is_none());
    let archived = client
        .retrieve(
            RetrieveRequest::new()
                .only_state(ItemState::Archive)
                .only_favorited()
                .complete_item_info(),
        )
        .unwrap();
    let tags = archived["list"][&item_id]["tags"].as_object().unwrap();
    assert_eq!(tags.len(), 1);
    assert!(tags.contains_key("rust"));
}

#[test]
fn service_errors_carry_pocket_headers() {
    let addr = start_mock_server();
    let config = config(addr);
    let transport = UreqTransport::new(&config);

    let wrong_key = PocketClient::with_transport("not-the-key", &config.base_url, &transport);
    match wrong_key.request_token(REDIRECT_URI).unwrap_err() {
        ApiError::Service { status, code, message, .. } => {
            assert_eq!(status, 403);
            assert_eq!(code, Some(152));
            assert_eq!(message, "Invalid consumer key.");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let bogus_token = PocketClient::with_transport(MOCK_CONSUMER_KEY, &config.base_url, &transport)
        .authenticated("not-a-token", "nobody");
    let err = bogus_token.retrieve(RetrieveRequest::new()).unwrap_err();
    assert!(err.is_auth_error());
    assert_eq!(err.service_code(), Some(107));
}

#[test]
fn connection_failure_is_transport_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let client = PocketClient::with_config(MOCK_CONSUMER_KEY, &config(addr));

    let err = client.request_token(REDIRECT_URI).unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}

#[test]
fn non_utf8_error_body_is_service_error() {
    let addr = serve_raw_once(
        b"HTTP/1.1 403 Forbidden\r\n\
          X-Error-Code: 152\r\n\
          X-Error: Invalid consumer key.\r\n\
          Content-Length: 7\r\n\
          Connection: close\r\n\
          \r\n\
          \xff\xfe oops",
    );
    let client = PocketClient::with_config("some-key", &config(addr));

    match client.request_token(REDIRECT_URI).unwrap_err() {
        ApiError::Service { status, code, message, body } => {
            assert_eq!(status, 403);
            assert_eq!(code, Some(152));
            assert_eq!(message, "Invalid consumer key.");
            assert!(body.ends_with(" oops"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn non_ascii_error_message_survives_transport() {
    let addr = serve_raw_once(
        "HTTP/1.1 401 Unauthorized\r\n\
         X-Error-Code: 107\r\n\
         X-Error: Cl\u{e9} d'acc\u{e8}s invalide\r\n\
         Content-Length: 0\r\n\
         Connection: close\r\n\
         \r\n"
            .as_bytes(),
    );
    let client = PocketClient::with_config("some-key", &config(addr)).authenticated("tok", "me");

    match client.retrieve(RetrieveRequest::new()).unwrap_err() {
        ApiError::Service { status, code, message, .. } => {
            assert_eq!(status, 401);
            assert_eq!(code, Some(107));
            assert_eq!(message, "Cl\u{e9} d'acc\u{e8}s invalide");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
