// Minimal HTTP servers for exercising the clients against canned responses.
//
// Every response carries `Connection: close`, so each client request arrives
// on its own connection and is answered in order.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: String,
    pub content_type: String,
    pub body: String,
}

impl MockResponse {
    pub fn new(status: &str, content_type: &str, body: &str) -> Self {
        MockResponse {
            status: status.to_string(),
            content_type: content_type.to_string(),
            body: body.to_string(),
        }
    }

    pub fn json(status: &str, body: &str) -> Self {
        MockResponse::new(status, "application/json", body)
    }

    /// A 200 chat-completion reply whose message content is `content`.
    pub fn completion(content: &str) -> Self {
        let body = serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        });
        MockResponse::json("200 OK", &body.to_string())
    }

    fn to_http(&self) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.status,
            self.content_type,
            self.body.len(),
            self.body
        )
    }
}

/// Accept one connection, reply, and resolve to the raw request text.
pub async fn serve_once(
    status: &str,
    content_type: &str,
    body: &str,
) -> (SocketAddr, JoinHandle<String>) {
    let (addr, handle) = serve_sequence(vec![MockResponse::new(status, content_type, body)]).await;
    let handle = tokio::spawn(async move {
        handle
            .await
            .unwrap()
            .into_iter()
            .next()
            .unwrap_or_default()
    });
    (addr, handle)
}

/// Answer one connection per response, in order, then stop. Resolves to the
/// raw request texts.
pub async fn serve_sequence(
    responses: Vec<MockResponse>,
) -> (SocketAddr, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let mut requests = Vec::new();
        for response in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            requests.push(read_request(&mut socket).await);
            socket.write_all(response.to_http().as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
        }
        requests
    });
    (addr, handle)
}

/// Requests recorded by [`serve_with`].
pub type RequestLog = Arc<Mutex<Vec<String>>>;

/// Answer every connection with `handler(request)` until the returned task
/// is aborted. Requests are appended to the log.
pub async fn serve_with<F>(handler: F) -> (SocketAddr, RequestLog, JoinHandle<()>)
where
    F: Fn(&str) -> MockResponse + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log: RequestLog = Arc::new(Mutex::new(Vec::new()));

    let task_log = log.clone();
    let handle = tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let request = read_request(&mut socket).await;
            let response = handler(&request);
            task_log.lock().unwrap().push(request);
            let _ = socket.write_all(response.to_http().as_bytes()).await;
            let _ = socket.flush().await;
        }
    });
    (addr, log, handle)
}

/// The body of a raw request (everything after the blank line).
pub fn request_body(request: &str) -> &str {
    request
        .find("\r\n\r\n")
        .map(|i| &request[i + 4..])
        .unwrap_or("")
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        if let Some(head_end) = find(&buf, b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..head_end]).to_lowercase();
            let length = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
