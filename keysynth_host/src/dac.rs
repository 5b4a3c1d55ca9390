//! DAC sinks for running the engine on a host

use std::io::Write;

use keysynth::{Dac, DAC_MID};

/// Writes every DAC code to `W` as a little-endian `u16`.
///
/// [Dac::write] cannot fail, so the first I/O error is kept and every later
/// code is discarded; [WriterDac::finish] reports it.
pub struct WriterDac<W: Write> {
    writer: W,
    error: Option<std::io::Error>,
}

impl<W: Write> WriterDac<W> {
    /// Create a sink writing to `writer`.  Wrap files in a
    /// [BufWriter](std::io::BufWriter).
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            error: None,
        }
    }
    /// Flush the writer and return it, or the first error encountered
    pub fn finish(mut self) -> std::io::Result<W> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> Dac for WriterDac<W> {
    fn write(&mut self, code: u16) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.writer.write_all(&code.to_le_bytes()) {
            log::error!("DAC output failed: {}", e);
            self.error = Some(e);
        }
    }
}

/// Passes codes through to another [Dac], keeping simple statistics
#[derive(Clone, Debug)]
pub struct MeteredDac<D> {
    inner: D,
    count: u64,
    min: u16,
    max: u16,
    active: u64,
}

impl<D: Dac> MeteredDac<D> {
    /// Wrap `inner`
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            count: 0,
            min: u16::MAX,
            max: 0,
            active: 0,
        }
    }
    /// Number of codes written
    pub fn count(&self) -> u64 {
        self.count
    }
    /// Lowest and highest code written, or `None` if nothing was written
    pub fn range(&self) -> Option<(u16, u16)> {
        (self.count > 0).then_some((self.min, self.max))
    }
    /// Number of codes that were not mid-scale silence
    pub fn active(&self) -> u64 {
        self.active
    }
    /// The wrapped sink
    pub fn inner(&self) -> &D {
        &self.inner
    }
    /// Unwrap the sink
    pub fn into_inner(self) -> D {
        self.inner
    }
}

impl<D: Dac> Dac for MeteredDac<D> {
    fn write(&mut self, code: u16) {
        self.count += 1;
        self.min = self.min.min(code);
        self.max = self.max.max(code);
        if code != DAC_MID {
            self.active += 1;
        }
        self.inner.write(code);
    }
}

/// Discards every code
#[derive(Clone, Copy, Debug, Default)]
pub struct NullDac;

impl Dac for NullDac {
    fn write(&mut self, _code: u16) {}
}
