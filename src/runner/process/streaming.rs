//! Streaming helpers for subprocess output forwarding.

use std::io::{self, Read, Write};

/// Forwarding statistics for a child output stream.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub(super) struct ForwardStats {
    pub(super) bytes_read: usize,
    pub(super) bytes_written: usize,
    pub(super) write_failed: bool,
}

struct CountingReader<'a, R> {
    inner: &'a mut R,
    read: u64,
}

impl<R: Read> Read for CountingReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let count = self.inner.read(buf)?;
        self.read = self.read.saturating_add(count as u64);
        Ok(count)
    }
}

struct CountingWriter<'a, W> {
    inner: &'a mut W,
    written: u64,
}

impl<W: Write> Write for CountingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let count = self.inner.write(buf)?;
        self.written = self.written.saturating_add(count as u64);
        Ok(count)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn clamp_u64_to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

/// Copy `reader` into `writer` until EOF.
///
/// When the writer fails (typically a closed pipe) the rest of the child's
/// output is drained and discarded so the child never blocks on a full pipe.
pub(super) fn forward_child_output<R, W>(
    mut reader: R,
    mut writer: W,
    stream_name: &'static str,
) -> ForwardStats
where
    R: Read,
    W: Write,
{
    let mut stats = ForwardStats::default();
    let mut counting_reader = CountingReader {
        inner: &mut reader,
        read: 0,
    };
    let mut counting_writer = CountingWriter {
        inner: &mut writer,
        written: 0,
    };

    if let Err(err) = io::copy(&mut counting_reader, &mut counting_writer) {
        stats.write_failed = true;
        tracing::debug!(
            "failed to forward executor {stream_name}: {err}; discarding remaining output"
        );
        if let Err(drain_err) = io::copy(&mut counting_reader, &mut io::sink()) {
            tracing::debug!("failed to drain executor {stream_name}: {drain_err}");
        }
    }
    stats.bytes_read = clamp_u64_to_usize(counting_reader.read);
    stats.bytes_written = clamp_u64_to_usize(counting_writer.written);
    stats
}

#[cfg(test)]
mod tests {
    use super::forward_child_output;
    use std::{
        io::{BufReader, Cursor, Write},
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
    };

    #[derive(Clone)]
    struct FailingWriter {
        writes: Arc<AtomicUsize>,
    }

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "sink closed",
            ))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn forwards_every_byte() {
        let input = b"Compiling Core\nLinking App\n".to_vec();
        let mut sink = Vec::new();
        let stats = forward_child_output(BufReader::new(Cursor::new(input.clone())), &mut sink, "stdout");

        assert_eq!(sink, input);
        assert_eq!(stats.bytes_read, input.len());
        assert_eq!(stats.bytes_written, input.len());
        assert!(!stats.write_failed);
    }

    #[test]
    fn drains_child_after_writer_closes() {
        let input = b"one\ntwo\nthree\n".to_vec();
        let writes = Arc::new(AtomicUsize::new(0));
        let writer = FailingWriter {
            writes: Arc::clone(&writes),
        };
        let stats = forward_child_output(BufReader::new(Cursor::new(input.clone())), writer, "stderr");

        assert!(stats.write_failed);
        assert_eq!(stats.bytes_read, input.len());
        assert_eq!(stats.bytes_written, 0);
        assert_eq!(writes.load(Ordering::SeqCst), 1);
    }
}
