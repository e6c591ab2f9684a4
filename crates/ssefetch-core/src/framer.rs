//! Line framer: reassembles complete lines from arbitrarily chunked text.
//!
//! Lines may end in `\r\n`, `\n` or `\r`. A line ending in `\r` is
//! emitted as soon as the `\r` arrives. If that `\r` was the last byte of
//! the buffer, a `\n` opening the next chunk is swallowed, so a CRLF pair
//! split across two chunks is still one terminator and never yields an
//! empty phantom line.

/// Stateful accumulator that turns text fragments into complete lines.
#[derive(Debug, Default, Clone)]
pub struct LineFramer {
    buffer: String,
    /// The last terminator was a `\r` at the end of the buffer.
    skip_lf: bool,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` to the buffer and return the lines it completes.
    ///
    /// Lines are produced lazily. Lines the caller does not pull before
    /// dropping the iterator stay buffered and are returned by the next
    /// `feed`, so no line is ever yielded twice or lost.
    pub fn feed(&mut self, chunk: &str) -> Lines<'_> {
        self.buffer.push_str(chunk);
        Lines {
            framer: self,
            consumed: 0,
        }
    }

    /// The unterminated tail retained for the next `feed`.
    pub fn remainder(&self) -> &str {
        &self.buffer
    }

    /// Take the unterminated tail as a final line, leaving the framer empty.
    ///
    /// Returns `None` if the tail is empty.
    pub fn finish(&mut self) -> Option<String> {
        self.skip_lf = false;
        let rest = std::mem::take(&mut self.buffer);
        (!rest.is_empty()).then_some(rest)
    }
}

/// Lazy iterator over the lines completed by one [`LineFramer::feed`] call.
pub struct Lines<'a> {
    framer: &'a mut LineFramer,
    consumed: usize,
}

impl Iterator for Lines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.framer.skip_lf {
            match self.framer.buffer.as_bytes().get(self.consumed) {
                Some(b'\n') => {
                    self.consumed += 1;
                    self.framer.skip_lf = false;
                }
                Some(_) => self.framer.skip_lf = false,
                None => return None,
            }
        }

        let rest = &self.framer.buffer[self.consumed..];
        let pos = rest.find(|c| c == '\r' || c == '\n')?;

        let term_len = if rest.as_bytes()[pos] == b'\r' {
            match rest.as_bytes().get(pos + 1) {
                Some(b'\n') => 2,
                Some(_) => 1,
                // Possibly the first half of a CRLF; the next chunk decides.
                None => {
                    self.framer.skip_lf = true;
                    1
                }
            }
        } else {
            1
        };

        let line = rest[..pos].to_string();
        self.consumed += pos + term_len;
        Some(line)
    }
}

impl Drop for Lines<'_> {
    fn drop(&mut self) {
        self.framer.buffer.drain(..self.consumed);
    }
}
