use std::io::Write;

/// Keeps track of the number of bytes written to the inner sink, which gives
/// each entry's local header offset without requiring [`std::io::Seek`].
#[derive(Debug)]
pub struct WriteWrapper<W: Write> {
    writer: W,
    written_bytes_count: u64,
}

impl<W: Write> WriteWrapper<W> {
    pub fn new(w: W) -> WriteWrapper<W> {
        Self {
            writer: w,
            written_bytes_count: 0,
        }
    }

    pub fn get_written_bytes_count(&self) -> u64 {
        self.written_bytes_count
    }

    pub fn retrieve_writer(self) -> W {
        self.writer
    }
}

impl<W: Write> Write for WriteWrapper<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let nb_byte_written = self.writer.write(buf)?;
        self.written_bytes_count += nb_byte_written as u64;
        Ok(nb_byte_written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}
