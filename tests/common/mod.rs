use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use tempfile::TempDir;

pub struct Server {
    pub addr: SocketAddr,
    child: Child,
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub fn free_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    listener.local_addr().expect("local addr")
}

pub fn base_cmd(data_dir: &TempDir, addr: SocketAddr) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_autoservice"));
    cmd.env("DOTENV_PATH", data_dir.path().join("missing.env"))
        .env("RUST_LOG", "warn")
        .arg("--data-dir")
        .arg(data_dir.path())
        .arg("--api-listen")
        .arg(addr.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    cmd
}

pub fn start(data_dir: &TempDir) -> Server {
    let addr = free_addr();
    let child = base_cmd(data_dir, addr).spawn().expect("spawn autoservice");
    let server = Server { addr, child };

    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if TcpStream::connect(addr).is_ok() {
            return server;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    panic!("autoservice did not start listening on {addr}");
}

/// Sends one HTTP/1.1 request and returns the status code and body.
pub fn request(addr: SocketAddr, method: &str, path: &str, body: Option<&str>) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).expect("connect");
    let payload = body.unwrap_or("");
    let mut raw = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\nContent-Length: {}\r\n",
        payload.len()
    );
    if body.is_some() {
        raw.push_str("Content-Type: application/json\r\n");
    }
    raw.push_str("\r\n");
    raw.push_str(payload);
    stream.write_all(raw.as_bytes()).expect("write request");

    let mut response = String::new();
    stream.read_to_string(&mut response).expect("read response");

    let status = response
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .expect("status code");
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_string())
        .unwrap_or_default();
    (status, body)
}
