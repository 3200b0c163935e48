//! In-memory peripherals for tests and host simulation
//!
//! - [`MockSerial`]: byte stream with an injectable receive queue, a log of
//!   everything written, and scripted replies to command prefixes
//! - [`MockRegisterBus`]: register blocks set per base address, with
//!   per-register failure injection
//! - [`ConstantSource`] / [`SequenceSource`]: raw sample sources
//!
//! ```rust
//! use fixrelay_core::mock::MockSerial;
//! use fixrelay_core::traits::ByteStream;
//!
//! let mut modem = MockSerial::new();
//! modem.respond_to("AT", b"OK\r\n");
//!
//! modem.write_all(b"AT").unwrap();
//! assert_eq!(modem.read_byte().unwrap(), b'O');
//! assert_eq!(modem.written(), b"AT");
//! ```

extern crate std;

use std::collections::VecDeque;
use std::string::String;
use std::vec::Vec;

use crate::constants::sensors::SAMPLE_BLOCK_LEN;
use crate::sensors::RawTriplet;
use crate::traits::{ByteStream, RegisterBus, SampleSource};

/// Failure reported by the mocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockError {
    /// Receive queue drained on a stream marked to close
    Closed,
    /// Write refused
    WriteRefused,
    /// Register block set to fail
    BusFault,
}

#[derive(Debug, Clone)]
struct Responder {
    trigger: String,
    reply: Vec<u8>,
    hold_polls: usize,
}

/// Scripted serial peer
#[derive(Debug, Default)]
pub struct MockSerial {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    responders: Vec<Responder>,
    hold_polls: usize,
    close_when_drained: bool,
    refuse_writes: bool,
}

impl MockSerial {
    /// Empty stream
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for reception
    pub fn inject_rx(&mut self, data: &[u8]) {
        self.rx.extend(data.iter().copied());
    }

    /// Reply with `reply` whenever a write starts with `trigger`
    ///
    /// When several triggers match, the longest wins.
    pub fn respond_to(&mut self, trigger: &str, reply: &[u8]) {
        self.respond_after(trigger, reply, 0);
    }

    /// Like [`respond_to`](Self::respond_to), but the reply only becomes
    /// readable after `polls` reads have returned `WouldBlock`
    pub fn respond_after(&mut self, trigger: &str, reply: &[u8], polls: usize) {
        self.responders.push(Responder {
            trigger: trigger.into(),
            reply: reply.to_vec(),
            hold_polls: polls,
        });
    }

    /// Fail reads with [`MockError::Closed`] once the queue is empty
    pub fn close_when_drained(&mut self) {
        self.close_when_drained = true;
    }

    /// Fail every subsequent write
    pub fn refuse_writes(&mut self) {
        self.refuse_writes = true;
    }

    /// Everything written so far
    pub fn written(&self) -> &[u8] {
        &self.tx
    }

    /// Written bytes split into `\r\n`-terminated lines (lossy UTF-8)
    pub fn written_lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.tx)
            .split("\r\n")
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect()
    }

    /// Bytes still waiting to be read
    pub fn pending_rx(&self) -> usize {
        self.rx.len()
    }

    fn trigger(&mut self, chunk: &[u8]) {
        let matched = self
            .responders
            .iter()
            .filter(|r| chunk.starts_with(r.trigger.as_bytes()))
            .max_by_key(|r| r.trigger.len())
            .cloned();
        if let Some(responder) = matched {
            self.rx.extend(responder.reply.iter().copied());
            self.hold_polls = responder.hold_polls;
        }
    }
}

impl ByteStream for MockSerial {
    type Error = MockError;

    fn read_byte(&mut self) -> nb::Result<u8, Self::Error> {
        if self.hold_polls > 0 {
            self.hold_polls -= 1;
            return Err(nb::Error::WouldBlock);
        }
        match self.rx.pop_front() {
            Some(byte) => Ok(byte),
            None if self.close_when_drained => Err(nb::Error::Other(MockError::Closed)),
            None => Err(nb::Error::WouldBlock),
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        if self.refuse_writes {
            return Err(MockError::WriteRefused);
        }
        self.tx.extend_from_slice(bytes);
        self.trigger(bytes);
        Ok(())
    }
}

/// Register map with fixed sample blocks
#[derive(Debug, Default)]
pub struct MockRegisterBus {
    blocks: Vec<(u8, [u8; SAMPLE_BLOCK_LEN])>,
    failing: Vec<u8>,
    reads: usize,
}

impl MockRegisterBus {
    /// Bus where every register reads zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents of the block starting at `register`
    pub fn set_block(&mut self, register: u8, block: [u8; SAMPLE_BLOCK_LEN]) {
        match self.blocks.iter_mut().find(|(r, _)| *r == register) {
            Some((_, existing)) => *existing = block,
            None => self.blocks.push((register, block)),
        }
    }

    /// Store a raw triplet big-endian at `register`
    pub fn set_triplet(&mut self, register: u8, raw: RawTriplet) {
        let mut block = [0u8; SAMPLE_BLOCK_LEN];
        for (chunk, v) in block.chunks_exact_mut(2).zip(raw) {
            chunk.copy_from_slice(&v.to_be_bytes());
        }
        self.set_block(register, block);
    }

    /// Reads starting at `register` fail from now on
    pub fn fail_register(&mut self, register: u8) {
        self.failing.push(register);
    }

    /// Reads starting at `register` succeed again
    pub fn heal_register(&mut self, register: u8) {
        self.failing.retain(|&r| r != register);
    }

    /// Successful and failed reads performed
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl RegisterBus for MockRegisterBus {
    type Error = MockError;

    fn read_registers(&mut self, register: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.reads += 1;
        if self.failing.contains(&register) {
            return Err(MockError::BusFault);
        }
        buf.fill(0);
        if let Some((_, block)) = self.blocks.iter().find(|(r, _)| *r == register) {
            let n = buf.len().min(block.len());
            buf[..n].copy_from_slice(&block[..n]);
        }
        Ok(())
    }
}

/// Source that always yields the same triplet
#[derive(Debug, Clone, Copy)]
pub struct ConstantSource {
    value: RawTriplet,
}

impl ConstantSource {
    /// Source of `value`
    pub const fn new(value: RawTriplet) -> Self {
        Self { value }
    }
}

impl SampleSource for ConstantSource {
    type Error = core::convert::Infallible;

    fn read_sample(&mut self) -> Result<RawTriplet, Self::Error> {
        Ok(self.value)
    }
}

/// Source cycling through a recorded sequence
#[derive(Debug, Clone)]
pub struct SequenceSource {
    samples: Vec<RawTriplet>,
    next: usize,
}

impl SequenceSource {
    /// Cycle through `samples`; an empty sequence yields zeros
    pub fn new(samples: &[RawTriplet]) -> Self {
        Self {
            samples: samples.to_vec(),
            next: 0,
        }
    }
}

impl SampleSource for SequenceSource {
    type Error = core::convert::Infallible;

    fn read_sample(&mut self) -> Result<RawTriplet, Self::Error> {
        if self.samples.is_empty() {
            return Ok([0; 3]);
        }
        let sample = self.samples[self.next % self.samples.len()];
        self.next += 1;
        Ok(sample)
    }
}
