//! Dump loading
//!
//! SSMS "Generate Scripts" exports are written as UTF-16LE text. This module
//! decodes them either into a whole in-memory [`DumpDocument`] or into a
//! lazily decoded sequence of lines ([`DumpLines`]) for large dumps.
//!
//! Files in any other encoding are rejected with [`ExtractError::Encoding`]
//! instead of being decoded into garbage.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use encoding_rs::{CoderResult, Decoder, UTF_16LE};

use crate::error::{ExtractError, Result};

/// Size of each raw read performed by [`DumpLines`]
const CHUNK_SIZE: usize = 64 * 1024;

/// Check the leading bytes of a dump for a plausible UTF-16LE start.
///
/// Accepts a UTF-16LE BOM, or a first code unit whose high byte is zero
/// (a Latin-1 character such as `S`, `/`, `\r`). Empty input is accepted.
///
/// A BOM-less dump whose first character lies outside Latin-1 is rejected
/// even though it may be valid UTF-16LE. SSMS always writes a BOM, and
/// without one such a file cannot be told apart from UTF-8 text.
fn sniff_utf16le(head: &[u8]) -> std::result::Result<(), String> {
    match head {
        [] => Ok(()),
        [0xFF, 0xFE, ..] => Ok(()),
        [0xFE, 0xFF, ..] => Err("found a UTF-16BE byte order mark".to_string()),
        [0xEF, 0xBB, 0xBF, ..] => Err("found a UTF-8 byte order mark".to_string()),
        [lo, 0x00, ..] if *lo != 0 => Ok(()),
        [_] => Err("file is a single byte long".to_string()),
        _ => Err("leading bytes do not look like UTF-16LE text".to_string()),
    }
}

/// A fully decoded dump held in memory for the duration of a run
#[derive(Debug, Clone)]
pub struct DumpDocument {
    path: PathBuf,
    text: String,
}

impl DumpDocument {
    /// Wrap already decoded text, e.g. a dump assembled in tests
    pub fn from_text(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Decode raw UTF-16LE bytes
    pub fn decode(path: impl Into<PathBuf>, bytes: &[u8]) -> Result<Self> {
        let path = path.into();
        sniff_utf16le(bytes).map_err(|message| ExtractError::Encoding {
            path: path.clone(),
            message,
        })?;

        let (decoded, had_errors) = UTF_16LE.decode_with_bom_removal(bytes);
        if had_errors {
            return Err(ExtractError::Encoding {
                path,
                message: "invalid UTF-16LE sequence (odd byte count or unpaired surrogate)"
                    .to_string(),
            });
        }

        Ok(Self {
            path,
            text: decoded.into_owned(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Lines of the document, in the same item shape as [`DumpLines`]
    pub fn lines(&self) -> impl Iterator<Item = Result<String>> + '_ {
        text_lines(&self.text)
    }

    pub fn line_count(&self) -> usize {
        if self.text.is_empty() {
            return 0;
        }
        let newlines = self.text.matches('\n').count();
        if self.text.ends_with('\n') {
            newlines
        } else {
            newlines + 1
        }
    }
}

/// Load and decode a whole dump file
pub fn load_dump(path: &Path) -> Result<DumpDocument> {
    let bytes = std::fs::read(path).map_err(|e| ExtractError::from_io(path, e))?;
    DumpDocument::decode(path, &bytes)
}

/// Lazily decoded lines of a UTF-16LE dump.
///
/// Lines are split on `\n` only. The `\r` of a CRLF ending stays on the
/// line, so a string literal continuing onto the next line can be rejoined
/// byte for byte; consumers trim before matching.
///
/// Raw bytes are read in fixed-size chunks only when the consumer asks for a
/// line that is not buffered yet. The iterator yields `Err` at most once and
/// then ends. The underlying reader (and file handle) is released when the
/// iterator is dropped.
pub struct DumpLines<R> {
    reader: R,
    path: PathBuf,
    decoder: Decoder,
    chunk: Vec<u8>,
    pending: String,
    started: bool,
    eof: bool,
    done: bool,
    lines_read: usize,
}

impl DumpLines<BufReader<File>> {
    /// Open a dump file for streaming
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| ExtractError::from_io(path, e))?;
        Ok(Self::new(BufReader::new(file), path))
    }
}

impl<R: Read> DumpLines<R> {
    pub fn new(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            path: path.into(),
            decoder: UTF_16LE.new_decoder_with_bom_removal(),
            chunk: vec![0; CHUNK_SIZE],
            pending: String::new(),
            started: false,
            eof: false,
            done: false,
            lines_read: 0,
        }
    }

    /// Number of lines handed out so far
    pub fn lines_read(&self) -> usize {
        self.lines_read
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn encoding_error(&self, message: impl Into<String>) -> ExtractError {
        ExtractError::Encoding {
            path: self.path.clone(),
            message: message.into(),
        }
    }

    /// Read into `chunk[offset..]`, retrying on interruption.
    fn read_into(&mut self, offset: usize) -> Result<usize> {
        loop {
            match self.reader.read(&mut self.chunk[offset..]) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(ExtractError::ReadError {
                        path: self.path.clone(),
                        source: e,
                    })
                }
            }
        }
    }

    /// Read one chunk and decode it into `pending`.
    fn fill(&mut self) -> Result<()> {
        let mut n = self.read_into(0)?;

        if !self.started {
            // The first code unit needs two bytes; short reads are allowed.
            while n > 0 && n < 2 {
                let more = self.read_into(n)?;
                if more == 0 {
                    break;
                }
                n += more;
            }
            self.started = true;
            sniff_utf16le(&self.chunk[..n.min(4)]).map_err(|m| self.encoding_error(m))?;
        }

        let last = n == 0;
        if last {
            self.eof = true;
        }

        let mut consumed = 0;
        loop {
            let remaining = n - consumed;
            let needed = self
                .decoder
                .max_utf8_buffer_length(remaining)
                .unwrap_or(remaining * 3 + 4);
            self.pending.reserve(needed);
            let (result, read, replaced) =
                self.decoder
                    .decode_to_string(&self.chunk[consumed..n], &mut self.pending, last);
            consumed += read;
            if replaced {
                return Err(self.encoding_error(format!(
                    "invalid UTF-16LE sequence after line {}",
                    self.lines_read
                )));
            }
            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => continue,
            }
        }
        Ok(())
    }
}

impl<R: Read> Iterator for DumpLines<R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            if let Some(pos) = self.pending.find('\n') {
                let line = self.pending[..pos].to_string();
                self.pending.drain(..=pos);
                self.lines_read += 1;
                return Some(Ok(line));
            }

            if self.eof {
                self.done = true;
                if self.pending.is_empty() {
                    return None;
                }
                let line = std::mem::take(&mut self.pending);
                self.lines_read += 1;
                return Some(Ok(line));
            }

            if let Err(e) = self.fill() {
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}

/// Lines of in-memory text in the same item shape as [`DumpLines`]
///
/// Split on `\n` only, keeping any `\r`. A trailing newline does not
/// introduce an extra empty line.
pub fn text_lines(text: &str) -> impl Iterator<Item = Result<String>> + '_ {
    text.split_inclusive('\n')
        .map(|line| Ok(line.strip_suffix('\n').unwrap_or(line).to_string()))
}

/// Encode text as UTF-16LE with a leading BOM, the way SSMS writes scripts
pub fn encode_utf16le(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(2 + text.len() * 2);
    bytes.extend_from_slice(&[0xFF, 0xFE]);
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes
}
