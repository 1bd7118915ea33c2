#![allow(dead_code)]

use cookie_dispatch::{
    Cookie, CookieDispatcher, DispatchConfig, Handler, OffsetCookieReader, Request,
    ResponseBuffer, ResponseWriter,
};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Header bytes used in front of every test message (OpenFlow 1.3 flow-removed).
pub const HEADER: [u8; 8] = [4, 11, 0, 56, 0, 0, 0, 1];

/// Build a message carrying `cookie` right after the header, followed by `payload`.
pub fn message(cookie: Cookie, payload: &[u8]) -> Vec<u8> {
    let mut bytes = HEADER.to_vec();
    bytes.extend_from_slice(&cookie.as_u64().to_be_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

pub fn request(cookie: Cookie, payload: &[u8]) -> Request {
    Request::new(message(cookie, payload))
}

/// Dispatcher with a fixed seed so failures are reproducible.
pub fn dispatcher() -> CookieDispatcher {
    CookieDispatcher::with_config(
        OffsetCookieReader::after_openflow_header(),
        &DispatchConfig::default().with_seed(0x5eed),
    )
}

/// Serve one request and hand back the response sink.
pub fn serve(dispatcher: &CookieDispatcher, req: &mut Request) -> ResponseBuffer {
    let mut rw = ResponseBuffer::new();
    dispatcher.serve(&mut rw, req);
    rw
}

/// Handler that counts invocations and records every body it saw.
#[derive(Default)]
pub struct Recorder {
    calls: AtomicUsize,
    bodies: Mutex<Vec<Vec<u8>>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn bodies(&self) -> Vec<Vec<u8>> {
        self.bodies.lock().unwrap().clone()
    }
}

impl Handler for Recorder {
    fn serve(&self, rw: &mut dyn ResponseWriter, req: &mut Request) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let body = req.body.read_all().unwrap();
        self.bodies.lock().unwrap().push(body);
        rw.write_all(b"ok").unwrap();
    }
}
