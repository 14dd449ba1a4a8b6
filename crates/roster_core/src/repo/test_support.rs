//! Loopback HTTP stub for the Google adapters.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

pub(crate) const TEST_RSA_PRIVATE_KEY: &str =
    include_str!("../../tests/fixtures/service_account_key.pem");
pub(crate) const TEST_RSA_PUBLIC_KEY: &str =
    include_str!("../../tests/fixtures/service_account_pub.pem");

#[derive(Debug, Clone)]
pub(crate) struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn query_param(&self, name: &str) -> Option<String> {
        form_param(&self.query, name)
    }

    pub fn form_param(&self, name: &str) -> Option<String> {
        form_param(&self.body, name)
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("json request body")
    }
}

/// Answers one connection per `(status, body)` pair, in order, and returns
/// the captured requests.
pub(crate) fn serve(
    responses: Vec<(u16, &'static str)>,
) -> (String, JoinHandle<Vec<CapturedRequest>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    let handle = thread::spawn(move || {
        responses
            .into_iter()
            .map(|(status, body)| {
                let (stream, _) = listener.accept().expect("accept test connection");
                let mut reader = BufReader::new(stream);
                let captured = read_request(&mut reader);
                let response = format!(
                    "HTTP/1.1 {status} TEST\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                reader
                    .get_mut()
                    .write_all(response.as_bytes())
                    .expect("write response");
                captured
            })
            .collect()
    });
    (format!("http://{addr}"), handle)
}

fn read_request(reader: &mut BufReader<TcpStream>) -> CapturedRequest {
    let mut line = String::new();
    reader.read_line(&mut line).expect("read request line");
    let mut parts = line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default();
    let (path, query) = target.split_once('?').unwrap_or((target, ""));

    let mut headers = Vec::new();
    loop {
        let mut header = String::new();
        reader.read_line(&mut header).expect("read header");
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((key, value)) = header.split_once(':') {
            headers.push((key.trim().to_string(), value.trim().to_string()));
        }
    }

    let length = headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).expect("read body");

    CapturedRequest {
        method,
        path: path.to_string(),
        query: query.to_string(),
        headers,
        body: String::from_utf8_lossy(&body).to_string(),
    }
}

fn form_param(encoded: &str, name: &str) -> Option<String> {
    encoded
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| {
            urlencoding::decode(&value.replace('+', " "))
                .map(|decoded| decoded.into_owned())
                .unwrap_or_default()
        })
}
