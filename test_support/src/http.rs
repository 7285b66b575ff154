//! Lightweight HTTP fixtures for geolocation tests.
//!
//! Provides helpers for spawning single-request HTTP servers that answer
//! with a fixed status and body, or never answer at all. The listener is
//! configured in non-blocking mode and guarded by a deadline so hung clients
//! cannot stall the test suite.

use std::{
    io::{self, Read, Write},
    net::{SocketAddr, TcpListener, TcpStream},
    thread,
    time::{Duration, Instant},
};

/// Join handle for a spawned HTTP fixture.
///
/// The handle joins the underlying thread when dropped to avoid leaking
/// background work if a test aborts early. Call [`HttpServer::join`] to surface
/// any panic from the server thread explicitly.
#[derive(Debug)]
#[must_use]
pub struct HttpServer {
    handle: Option<thread::JoinHandle<()>>,
    addr: SocketAddr,
}

impl HttpServer {
    /// Join the server thread and propagate any panic.
    pub fn join(mut self) -> thread::Result<()> {
        self.shutdown_listener();
        self.handle.take().expect("server already joined").join()
    }

    fn shutdown_listener(&self) {
        // Connect to unblock the accept loop; the outcome is irrelevant.
        let _ = TcpStream::connect(self.addr);
    }
}

impl Drop for HttpServer {
    fn drop(&mut self) {
        self.shutdown_listener();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Respond { status: u16, reason: &'static str, body: String },
    Stall(Duration),
}

/// Spawn a single-use HTTP server that returns `body` as `200 OK` JSON.
///
/// Returns the endpoint URL (with a trailing `/json/` path) and the server
/// handle.
pub fn spawn_http_server(body: impl Into<String>) -> (String, HttpServer) {
    spawn_http_server_with_status(200, "OK", body)
}

/// Spawn a single-use HTTP server that answers with `status`.
pub fn spawn_http_server_with_status(
    status: u16,
    reason: &'static str,
    body: impl Into<String>,
) -> (String, HttpServer) {
    spawn(Reply::Respond {
        status,
        reason,
        body: body.into(),
    })
}

/// Spawn a server that accepts one request and holds it open for `stall`
/// without answering.
pub fn spawn_stalled_server(stall: Duration) -> (String, HttpServer) {
    spawn(Reply::Stall(stall))
}

fn spawn(reply: Reply) -> (String, HttpServer) {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind HTTP listener");
    listener
        .set_nonblocking(true)
        .expect("set listener non-blocking");
    let addr = listener.local_addr().expect("local addr");
    let url = format!("http://{addr}/json/");
    let handle = thread::spawn(move || run_http_server(&listener, reply));
    (
        url,
        HttpServer {
            handle: Some(handle),
            addr,
        },
    )
}

fn run_http_server(listener: &TcpListener, reply: Reply) {
    let accept_deadline = Instant::now() + Duration::from_secs(5);
    let mut stream = accept_connection(listener, accept_deadline);
    stream
        .set_nonblocking(true)
        .expect("set stream non-blocking");
    let read_deadline = Instant::now() + Duration::from_millis(500);
    let bytes_read = read_request(&mut stream, read_deadline);
    if bytes_read == 0 {
        return;
    }
    match reply {
        Reply::Respond {
            status,
            reason,
            body,
        } => write_response(&mut stream, status, reason, &body),
        Reply::Stall(stall) => thread::sleep(stall),
    }
}

fn accept_connection(listener: &TcpListener, deadline: Instant) -> TcpStream {
    loop {
        match listener.accept() {
            Ok((stream, _)) => return stream,
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                assert!(
                    Instant::now() < deadline,
                    "timed out waiting for geolocation client"
                );
                thread::sleep(Duration::from_millis(10));
            }
            Err(err) => panic!("failed to accept connection: {err}"),
        }
    }
}

fn read_request(stream: &mut TcpStream, deadline: Instant) -> usize {
    let mut buf = [0u8; 1024];
    loop {
        if Instant::now() >= deadline {
            return 0;
        }
        match stream.read(&mut buf) {
            Ok(n) => return n,
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(5));
            }
            Err(err) => panic!("failed to read request: {err}"),
        }
    }
}

fn write_response(stream: &mut TcpStream, status: u16, reason: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len(),
    );
    let _ = stream.write_all(response.as_bytes());
}
