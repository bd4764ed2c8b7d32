//! Builder test double that records every call

use super::{BuildResult, Builder};
use crate::error::BuildError;
use crate::sax::attributes::AttributeBuffer;
use std::io;

/// One recorded builder call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    StartDoc(Vec<u8>),
    StartElem(Vec<u8>, Vec<(Vec<u8>, Vec<u8>)>),
    EndElem(Vec<u8>),
    Text(Vec<u8>),
    Comment(Vec<u8>),
    Pi(Vec<u8>),
    StartNs(Vec<u8>, Vec<u8>),
    EndDoc,
}

impl Call {
    pub fn start_doc(name: &str) -> Self {
        Call::StartDoc(name.as_bytes().to_vec())
    }

    pub fn start_elem(name: &str, atts: &[(&str, &str)]) -> Self {
        Call::StartElem(
            name.as_bytes().to_vec(),
            atts.iter()
                .map(|(n, v)| (n.as_bytes().to_vec(), v.as_bytes().to_vec()))
                .collect(),
        )
    }

    pub fn end_elem(name: &str) -> Self {
        Call::EndElem(name.as_bytes().to_vec())
    }

    pub fn start_ns(prefix: &str, uri: &str) -> Self {
        Call::StartNs(prefix.as_bytes().to_vec(), uri.as_bytes().to_vec())
    }
}

/// Records calls; optionally fails the n-th call with an I/O error
#[derive(Debug, Default)]
pub struct RecordingBuilder {
    pub calls: Vec<Call>,
    fail_at: Option<usize>,
    seen: usize,
}

impl RecordingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the call with the given zero-based index
    pub fn failing_at(call: usize) -> Self {
        Self {
            fail_at: Some(call),
            ..Self::default()
        }
    }

    fn record(&mut self, call: Call) -> BuildResult {
        let index = self.seen;
        self.seen += 1;
        if self.fail_at == Some(index) {
            return Err(BuildError::Io(io::Error::new(
                io::ErrorKind::Other,
                "injected failure",
            )));
        }
        self.calls.push(call);
        Ok(())
    }

    /// Text content of all recorded text calls
    pub fn texts(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
                _ => None,
            })
            .collect()
    }
}

impl Builder for RecordingBuilder {
    fn start_doc(&mut self, name: &[u8]) -> BuildResult {
        self.record(Call::StartDoc(name.to_vec()))
    }

    fn end_doc(&mut self) -> BuildResult {
        self.record(Call::EndDoc)
    }

    fn start_elem(&mut self, name: &[u8], atts: &AttributeBuffer) -> BuildResult {
        self.record(Call::StartElem(name.to_vec(), atts.to_vec()))
    }

    fn end_elem(&mut self, name: &[u8]) -> BuildResult {
        self.record(Call::EndElem(name.to_vec()))
    }

    fn text(&mut self, content: &[u8], _raw: bool) -> BuildResult {
        self.record(Call::Text(content.to_vec()))
    }

    fn comment(&mut self, content: &[u8]) -> BuildResult {
        self.record(Call::Comment(content.to_vec()))
    }

    fn pi(&mut self, content: &[u8]) -> BuildResult {
        self.record(Call::Pi(content.to_vec()))
    }

    fn start_ns(&mut self, prefix: &[u8], uri: &[u8]) -> BuildResult {
        self.record(Call::StartNs(prefix.to_vec(), uri.to_vec()))
    }
}
