#![allow(dead_code)] // each test binary uses its own slice of these helpers

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::thread::{self, JoinHandle};

use battctl::error::Result;
use battctl::modbus::transport::Transport;

/// One expected request frame and the bytes the peer answers with.
pub struct Exchange {
    pub expect: Vec<u8>,
    pub reply: Vec<u8>,
}

pub fn exchange(expect: Vec<u8>, reply: Vec<u8>) -> Exchange {
    Exchange { expect, reply }
}

/// In-memory transport fed from a script, asserting every frame sent.
pub struct ScriptedTransport {
    script: VecDeque<Exchange>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Exchange>) -> Self {
        Self {
            script: script.into(),
        }
    }
}

impl Transport for ScriptedTransport {
    fn send_and_receive(&mut self, frame: &[u8]) -> Result<Vec<u8>> {
        let exchange = self.script.pop_front().expect("transport script exhausted");
        assert_eq!(frame, &exchange.expect[..], "unexpected request frame");
        Ok(exchange.reply)
    }
}

/// Scripted stand-in for the inverter: accepts one connection and answers
/// each expected request with canned bytes.
pub struct FakeDevice {
    addr: SocketAddr,
    handle: Option<JoinHandle<()>>,
}

impl FakeDevice {
    pub fn start(script: Vec<Exchange>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake device");
        let addr = listener.local_addr().expect("local addr");

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            for exchange in script {
                let mut request = vec![0; exchange.expect.len()];
                stream.read_exact(&mut request).expect("read request");
                assert_eq!(request, exchange.expect, "device got an unexpected frame");
                stream.write_all(&exchange.reply).expect("write reply");
            }
        });

        Self {
            addr,
            handle: Some(handle),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.addr.ip(), self.addr.port())
    }

    /// Blocks until the script ran to completion, re-raising any assertion
    /// failure from the device thread.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(panic) = handle.join() {
                std::panic::resume_unwind(panic);
            }
        }
    }
}

fn header(unit: u8, function: u8, remaining: u16) -> Vec<u8> {
    let mut frame = Vec::new();
    frame.extend_from_slice(&1u16.to_be_bytes());
    frame.extend_from_slice(&0u16.to_be_bytes());
    frame.extend_from_slice(&remaining.to_be_bytes());
    frame.push(unit);
    frame.push(function);
    frame
}

pub fn read_request(unit: u8, address: u16, count: u16) -> Vec<u8> {
    let mut frame = header(unit, 0x03, 6);
    frame.extend_from_slice(&address.to_be_bytes());
    frame.extend_from_slice(&count.to_be_bytes());
    frame
}

pub fn write_request(unit: u8, address: u16, value: u16) -> Vec<u8> {
    let mut frame = header(unit, 0x06, 6);
    frame.extend_from_slice(&address.to_be_bytes());
    frame.extend_from_slice(&value.to_be_bytes());
    frame
}

pub fn read_reply(unit: u8, values: &[u16]) -> Vec<u8> {
    let byte_count = (values.len() * 2) as u8;
    let mut frame = header(unit, 0x03, u16::from(byte_count) + 3);
    frame.push(byte_count);
    for value in values {
        frame.extend_from_slice(&value.to_be_bytes());
    }
    frame
}

// A write echo has the same shape as the request it answers.
pub fn write_reply(unit: u8, address: u16, value: u16) -> Vec<u8> {
    write_request(unit, address, value)
}

pub fn exception_reply(unit: u8, function: u8, code: u8) -> Vec<u8> {
    let mut frame = header(unit, function | 0x80, 3);
    frame.push(code);
    frame
}

/// Control block with the four interesting points set and the rest zeroed.
pub fn control_block(bits: u16, discharge_raw: u16, charge_raw: u16, exponent: u16) -> Vec<u16> {
    let mut block = vec![0u16; 26];
    block[5] = bits;
    block[12] = discharge_raw;
    block[13] = charge_raw;
    block[25] = exponent;
    block
}
