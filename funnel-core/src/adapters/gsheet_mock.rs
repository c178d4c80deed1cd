//! Mock spreadsheet export server for testing
//!
//! Mimics the gviz CSV endpoint:
//! - GET /spreadsheets/d/{known id}/gviz/tq returns the configured CSV
//! - a sheet id containing "private" answers 200 with an HTML sign-in page
//! - any other id returns 404

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

/// Mock spreadsheet server serving one sheet
pub struct MockSheetServer {
    port: u16,
    running: Arc<AtomicBool>,
    requests: Arc<Mutex<Vec<String>>>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl MockSheetServer {
    /// Start on a random port, serving `csv` for `sheet_id`
    pub fn start(sheet_id: &str, csv: &str) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let requests = Arc::new(Mutex::new(Vec::new()));

        listener.set_nonblocking(true)?;

        let running_clone = running.clone();
        let requests_clone = requests.clone();
        let sheet_id = sheet_id.to_string();
        let csv = csv.to_string();

        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        handle_connection(stream, &sheet_id, &csv, &requests_clone);
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(std::time::Duration::from_millis(10));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            requests,
            thread_handle: Some(thread_handle),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Request targets received so far (path and query)
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockSheetServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn handle_connection(
    mut stream: TcpStream,
    sheet_id: &str,
    csv: &str,
    requests: &Mutex<Vec<String>>,
) {
    let _ = stream.set_nonblocking(false);
    let mut buffer = [0; 4096];
    let Ok(n) = stream.read(&mut buffer) else {
        return;
    };
    let request = String::from_utf8_lossy(&buffer[..n]);
    let target = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("")
        .to_string();
    if let Ok(mut seen) = requests.lock() {
        seen.push(target.clone());
    }

    let path = target.split('?').next().unwrap_or("");
    let requested_id = path
        .strip_prefix("/spreadsheets/d/")
        .and_then(|rest| rest.strip_suffix("/gviz/tq"))
        .unwrap_or("");

    if requested_id == sheet_id {
        send_response(&mut stream, 200, "OK", "text/csv; charset=utf-8", csv);
    } else if requested_id.contains("private") {
        send_response(
            &mut stream,
            200,
            "OK",
            "text/html; charset=utf-8",
            "<html><body>Sign in</body></html>",
        );
    } else {
        send_response(&mut stream, 404, "Not Found", "text/plain", "Not Found");
    }
}

fn send_response(stream: &mut TcpStream, status: u16, status_text: &str, content_type: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text,
        content_type,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}
