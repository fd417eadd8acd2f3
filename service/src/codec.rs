//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Newline framing for session traffic

use crate::SessionError;
use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// A codec that frames a byte stream into `\n`-terminated lines.
///
/// Unlike `tokio_util::codec::LinesCodec`, decoded frames keep their
/// terminator and are not required to be UTF-8, so a reply can return
/// exactly the bytes that were read. Encoding writes frames verbatim.
///
/// # Example
/// ```
/// use bytes::BytesMut;
/// use smsd_service::LineCodec;
/// use tokio_util::codec::Decoder;
///
/// let mut codec = LineCodec::new(64);
/// let mut buf = BytesMut::from(&b"PING\nPO"[..]);
/// assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), &b"PING\n"[..]);
/// assert!(codec.decode(&mut buf).unwrap().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct LineCodec {
    max_length: usize,
    /// Bytes of the buffer already scanned for a terminator
    next_index: usize,
}

impl LineCodec {
    /// Creates a codec that rejects lines longer than `max_length` bytes,
    /// terminator included.
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
        }
    }

    /// Maximum accepted line length
    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

impl Decoder for LineCodec {
    type Item = Bytes;
    type Error = SessionError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>, SessionError> {
        let read_to = src.len().min(self.max_length);
        let start = self.next_index.min(read_to);

        match src[start..read_to].iter().position(|byte| *byte == b'\n') {
            Some(offset) => {
                self.next_index = 0;
                Ok(Some(src.split_to(start + offset + 1).freeze()))
            }
            None if src.len() >= self.max_length => Err(SessionError::LineTooLong {
                limit: self.max_length,
            }),
            None => {
                self.next_index = read_to;
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>, SessionError> {
        match self.decode(src)? {
            Some(line) => Ok(Some(line)),
            None if src.is_empty() => Ok(None),
            None => Err(SessionError::Truncated {
                buffered: src.len(),
            }),
        }
    }
}

impl Encoder<Bytes> for LineCodec {
    type Error = SessionError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), SessionError> {
        dst.extend_from_slice(&item);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_single_line_keeps_terminator() {
        let mut codec = LineCodec::new(16);
        let mut buf = BytesMut::from(&b"PING\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), &b"PING\n"[..]);
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_waits_for_terminator_across_reads() {
        let mut codec = LineCodec::new(16);
        let mut buf = BytesMut::from(&b"PI"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"NG\r\nnext");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), &b"PING\r\n"[..]);
        assert_eq!(&buf[..], b"next");
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn decode_accepts_non_utf8() {
        let mut codec = LineCodec::new(16);
        let mut buf = BytesMut::from(&[0xff, 0xfe, b'\n'][..]);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), &[0xff, 0xfe, b'\n'][..]);
    }

    #[test]
    fn decode_line_at_exact_limit() {
        let mut codec = LineCodec::new(5);
        let mut buf = BytesMut::from(&b"1234\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), &b"1234\n"[..]);
    }

    #[test]
    fn decode_rejects_overlong_line() {
        let mut codec = LineCodec::new(4);
        let mut buf = BytesMut::from(&b"12345\n"[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(SessionError::LineTooLong { limit: 4 })
        ));
    }

    #[test]
    fn decode_eof_distinguishes_empty_and_partial() {
        let mut codec = LineCodec::new(16);

        let mut empty = BytesMut::new();
        assert!(codec.decode_eof(&mut empty).unwrap().is_none());

        let mut partial = BytesMut::from(&b"PING"[..]);
        assert!(matches!(
            codec.decode_eof(&mut partial),
            Err(SessionError::Truncated { buffered: 4 })
        ));
    }

    #[test]
    fn decode_eof_returns_final_complete_line() {
        let mut codec = LineCodec::new(16);
        let mut buf = BytesMut::from(&b"LAST\n"[..]);
        assert_eq!(codec.decode_eof(&mut buf).unwrap().unwrap(), &b"LAST\n"[..]);
        assert!(codec.decode_eof(&mut buf).unwrap().is_none());
    }

    #[test]
    fn encode_writes_bytes_verbatim() {
        let mut codec = LineCodec::new(16);
        let mut dst = BytesMut::new();
        codec.encode(Bytes::from_static(b"PING\n"), &mut dst).unwrap();
        assert_eq!(&dst[..], b"PING\n");
    }
}
