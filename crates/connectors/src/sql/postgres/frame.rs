//! Buffer writer for the PostgreSQL binary COPY file format.
//!
//! Layout: an 11-byte signature, a 32-bit flags field and a 32-bit header
//! extension length, then one tuple per row (16-bit field count followed by
//! each field as a 32-bit length and its bytes, `-1` for NULL) and finally a
//! 16-bit `-1` trailer.

use crate::error::ChannelError;
use bytes::{BufMut, Bytes, BytesMut};
use tokio_postgres::types::{IsNull, ToSql, Type};

pub const SIGNATURE: &[u8; 11] = b"PGCOPY\n\xff\r\n\0";

#[derive(Debug)]
pub struct CopyFrame {
    buf: BytesMut,
    row_start: Option<usize>,
    field_count: i16,
}

impl Default for CopyFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl CopyFrame {
    /// Creates a frame whose buffer already holds the file header.
    pub fn new() -> Self {
        let mut buf = BytesMut::with_capacity(1024);
        buf.put_slice(SIGNATURE);
        buf.put_i32(0);
        buf.put_i32(0);
        Self {
            buf,
            row_start: None,
            field_count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn in_row(&self) -> bool {
        self.row_start.is_some()
    }

    /// Closes the current row, if any, and opens a new one.
    pub fn start_row(&mut self) {
        self.end_row();
        self.row_start = Some(self.buf.len());
        self.field_count = 0;
        self.buf.put_i16(0);
    }

    /// Patches the field count of the open row.
    pub fn end_row(&mut self) {
        if let Some(start) = self.row_start.take() {
            self.buf[start..start + 2].copy_from_slice(&self.field_count.to_be_bytes());
        }
    }

    pub fn write_value(&mut self, value: &(dyn ToSql + Sync), ty: &Type) -> Result<(), ChannelError> {
        self.next_field()?;
        let start = self.buf.len();
        self.buf.put_i32(0);

        match value.to_sql_checked(ty, &mut self.buf) {
            Ok(IsNull::Yes) => {
                self.buf.truncate(start);
                self.buf.put_i32(-1);
            }
            Ok(IsNull::No) => {
                let len = self.buf.len() - start - 4;
                let len = i32::try_from(len).map_err(|_| {
                    ChannelError::Encode(format!("Field of {len} bytes is too large").into())
                })?;
                self.buf[start..start + 4].copy_from_slice(&len.to_be_bytes());
            }
            Err(err) => {
                self.buf.truncate(start);
                self.field_count -= 1;
                return Err(ChannelError::Encode(err));
            }
        }
        Ok(())
    }

    pub fn write_null(&mut self) -> Result<(), ChannelError> {
        self.next_field()?;
        self.buf.put_i32(-1);
        Ok(())
    }

    /// Splits off everything written so far. Only valid between rows.
    pub fn take(&mut self) -> Result<Bytes, ChannelError> {
        if self.in_row() {
            return Err(ChannelError::State(
                "Cannot flush in the middle of a row".to_string(),
            ));
        }
        Ok(self.buf.split().freeze())
    }

    /// Closes the open row, appends the trailer and returns the remaining bytes.
    pub fn finish(&mut self) -> Bytes {
        self.end_row();
        self.buf.put_i16(-1);
        self.buf.split().freeze()
    }

    fn next_field(&mut self) -> Result<(), ChannelError> {
        if !self.in_row() {
            return Err(ChannelError::State(
                "A row must be started before writing fields".to_string(),
            ));
        }
        self.field_count = self.field_count.checked_add(1).ok_or_else(|| {
            ChannelError::State("Too many fields in a single row".to_string())
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER_LEN: usize = 19;

    #[test]
    fn test_header_and_trailer() {
        let mut frame = CopyFrame::new();
        assert_eq!(frame.len(), HEADER_LEN);

        let bytes = frame.finish();
        assert_eq!(&bytes[..11], SIGNATURE);
        assert_eq!(&bytes[11..19], &[0u8; 8]);
        assert_eq!(&bytes[19..], &(-1i16).to_be_bytes());
    }

    #[test]
    fn test_row_layout() {
        let mut frame = CopyFrame::new();
        frame.start_row();
        frame.write_value(&7i16, &Type::INT2).unwrap();
        frame.write_null().unwrap();
        frame.write_value(&"ab", &Type::TEXT).unwrap();
        let bytes = frame.finish();

        let row = &bytes[HEADER_LEN..];
        let expected: Vec<u8> = [
            &3i16.to_be_bytes()[..],
            &2i32.to_be_bytes(),
            &7i16.to_be_bytes(),
            &(-1i32).to_be_bytes(),
            &2i32.to_be_bytes(),
            b"ab",
            &(-1i16).to_be_bytes(),
        ]
        .concat();
        assert_eq!(row, expected.as_slice());
    }

    #[test]
    fn test_none_option_writes_null_marker() {
        let mut frame = CopyFrame::new();
        frame.start_row();
        frame.write_value(&None::<i32>, &Type::INT4).unwrap();
        let bytes = frame.finish();

        let row = &bytes[HEADER_LEN..];
        assert_eq!(&row[..2], &1i16.to_be_bytes());
        assert_eq!(&row[2..6], &(-1i32).to_be_bytes());
    }

    #[test]
    fn test_write_requires_open_row() {
        let mut frame = CopyFrame::new();
        assert!(matches!(
            frame.write_value(&1i32, &Type::INT4),
            Err(ChannelError::State(_))
        ));
        assert!(matches!(frame.write_null(), Err(ChannelError::State(_))));
    }

    #[test]
    fn test_failed_write_leaves_buffer_untouched() {
        let mut frame = CopyFrame::new();
        frame.start_row();
        let before = frame.len();
        let err = frame.write_value(&1i32, &Type::TEXT).unwrap_err();
        assert!(matches!(err, ChannelError::Encode(_)));
        assert_eq!(frame.len(), before);

        frame.write_value(&1i32, &Type::INT4).unwrap();
        let bytes = frame.finish();
        assert_eq!(&bytes[HEADER_LEN..HEADER_LEN + 2], &1i16.to_be_bytes());
    }

    #[test]
    fn test_take_only_between_rows() {
        let mut frame = CopyFrame::new();
        frame.start_row();
        frame.write_value(&1i32, &Type::INT4).unwrap();
        assert!(frame.take().is_err());

        frame.end_row();
        let flushed = frame.take().unwrap();
        assert_eq!(flushed.len(), HEADER_LEN + 2 + 4 + 4);
        assert!(frame.is_empty());
        assert_eq!(&frame.finish()[..], &(-1i16).to_be_bytes());
    }
}
