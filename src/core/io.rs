//! Input layer for annotation and peak files
//!
//! Plain files go through [`PlainReader`], which picks buffered reading or
//! memory mapping by file size. Gzip and bzip2 inputs are detected by
//! extension or magic bytes and decoded on the fly.

use memmap2::Mmap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

/// Default buffer size for BufReader (128KB)
pub const DEFAULT_BUFFER_SIZE: usize = 128 * 1024;

/// Large buffer size for high-throughput I/O (1MB)
pub const LARGE_BUFFER_SIZE: usize = 1024 * 1024;

/// Threshold for using memory mapping (100MB)
pub const MMAP_THRESHOLD: u64 = 100 * 1024 * 1024;

/// How a plain file is read, chosen from its size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadMode {
    Buffered(usize),
    Mapped,
}

impl ReadMode {
    fn for_size(file_size: u64) -> Self {
        if file_size >= MMAP_THRESHOLD {
            ReadMode::Mapped
        } else if file_size > 10 * 1024 * 1024 {
            ReadMode::Buffered(LARGE_BUFFER_SIZE)
        } else {
            ReadMode::Buffered(DEFAULT_BUFFER_SIZE)
        }
    }
}

/// Uncompressed input: buffered below [`MMAP_THRESHOLD`], mapped above
pub enum PlainReader {
    Buffered(BufReader<File>),
    Mapped(MappedReader),
}

/// Sequential reader over a memory-mapped file
pub struct MappedReader {
    mmap: Mmap,
    position: usize,
}

impl MappedReader {
    pub fn new(file: &File) -> io::Result<Self> {
        // SAFETY: annotation files are not modified while an index is being built
        let mmap = unsafe { Mmap::map(file)? };
        Ok(Self { mmap, position: 0 })
    }
}

impl Read for MappedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = (&self.mmap[self.position..]).read(buf)?;
        self.position += n;
        Ok(n)
    }
}

impl BufRead for MappedReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        Ok(&self.mmap[self.position..])
    }

    fn consume(&mut self, amt: usize) {
        self.position = (self.position + amt).min(self.mmap.len());
    }
}

impl PlainReader {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path.as_ref())?;
        let reader = match ReadMode::for_size(file.metadata()?.len()) {
            ReadMode::Mapped => PlainReader::Mapped(MappedReader::new(&file)?),
            ReadMode::Buffered(capacity) => {
                PlainReader::Buffered(BufReader::with_capacity(capacity, file))
            }
        };
        Ok(reader)
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self, PlainReader::Mapped(_))
    }
}

impl Read for PlainReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            PlainReader::Buffered(reader) => reader.read(buf),
            PlainReader::Mapped(reader) => reader.read(buf),
        }
    }
}

impl BufRead for PlainReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            PlainReader::Buffered(reader) => reader.fill_buf(),
            PlainReader::Mapped(reader) => reader.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            PlainReader::Buffered(reader) => reader.consume(amt),
            PlainReader::Mapped(reader) => reader.consume(amt),
        }
    }
}

/// Compression format of an input file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    Plain,
    Gzip,
    Bzip2,
}

/// Detect compression from the file extension, then from magic bytes
///
/// - `.gz` or `1f 8b`
/// - `.bz2` or `BZh`
pub fn detect_compression(path: &Path) -> io::Result<CompressionFormat> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    if extension == "gz" {
        return Ok(CompressionFormat::Gzip);
    }
    if extension == "bz2" {
        return Ok(CompressionFormat::Bzip2);
    }

    let mut file = File::open(path)?;
    let mut magic = [0u8; 3];
    let bytes_read = file.read(&mut magic)?;

    if bytes_read >= 2 && magic[0] == 0x1f && magic[1] == 0x8b {
        return Ok(CompressionFormat::Gzip);
    }
    if bytes_read >= 3 && magic == *b"BZh" {
        return Ok(CompressionFormat::Bzip2);
    }
    Ok(CompressionFormat::Plain)
}

/// Open a text input, transparently decompressing gzip/bzip2
pub fn open_text<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    match detect_compression(path)? {
        CompressionFormat::Gzip => {
            let decoder = flate2::read::MultiGzDecoder::new(File::open(path)?);
            Ok(Box::new(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, decoder)))
        }
        CompressionFormat::Bzip2 => {
            let decoder = bzip2::read::BzDecoder::new(File::open(path)?);
            Ok(Box::new(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, decoder)))
        }
        CompressionFormat::Plain => Ok(Box::new(PlainReader::open(path)?)),
    }
}

/// Line iterator that reuses a buffer to avoid allocations
pub struct LineIterator<R: BufRead> {
    reader: R,
    buffer: String,
}

impl<R: BufRead> LineIterator<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: String::with_capacity(1024),
        }
    }

    /// Read the next line into the internal buffer
    /// Returns None at EOF, Some(Ok(&str)) on success, Some(Err) on error
    pub fn next_line(&mut self) -> Option<io::Result<&str>> {
        self.buffer.clear();
        match self.reader.read_line(&mut self.buffer) {
            Ok(0) => None,
            Ok(_) => {
                if self.buffer.ends_with('\n') {
                    self.buffer.pop();
                    if self.buffer.ends_with('\r') {
                        self.buffer.pop();
                    }
                }
                Some(Ok(&self.buffer))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
