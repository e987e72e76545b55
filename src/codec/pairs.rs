/// Byte-pair expansion used by the third stage boot loader
///
/// The loader region stores its payload as a sequence of segments:
///
/// ```text
/// size: u16 BE (0 ends the stream) | packed pair table | size code bytes
/// ```
///
/// Each of the 256 codes either stands for itself or for a (left, right)
/// pair of codes, expanded recursively. Decoding only; nothing on the disk
/// needs to be re-encoded in this form.

use crate::error::{DemodiskError, Result};

const TABLE_SIZE: usize = 256;

/// Deepest expansion stack a well-formed table can produce
const MAX_STACK: usize = 2 * TABLE_SIZE + 2;

/// Largest expansion accepted; a boot loader is far smaller
const MAX_OUTPUT: usize = 16 * 1024 * 1024;

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn byte(&mut self) -> Result<u8> {
        let b = *self
            .data
            .get(self.pos)
            .ok_or_else(|| DemodiskError::corrupt(self.pos, "pair stream truncated"))?;
        self.pos += 1;
        Ok(b)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let slice = self
            .data
            .get(self.pos..self.pos + len)
            .ok_or_else(|| DemodiskError::corrupt(self.pos, "pair segment truncated"))?;
        self.pos += len;
        Ok(slice)
    }
}

/// Expand a pair-compressed stream
pub fn expand(data: &[u8]) -> Result<Vec<u8>> {
    let mut cursor = Cursor { data, pos: 0 };
    let mut out = Vec::new();

    loop {
        let size = u16::from_be_bytes([cursor.byte()?, cursor.byte()?]) as usize;
        if size == 0 {
            break;
        }

        let (left, right) = read_table(&mut cursor)?;
        let codes = cursor.take(size)?;
        expand_segment(codes, &left, &right, &mut out, cursor.pos - size)?;
    }

    log::debug!("pairs: expanded {} bytes into {}", cursor.pos, out.len());
    Ok(out)
}

/// Read a packed pair table
///
/// A control byte above 127 skips `ctl - 127` slots and then defines one
/// slot, unless the next byte equals the slot index (then the slot is left
/// literal). A control byte up to 127 defines `ctl + 1` consecutive slots.
fn read_table(cursor: &mut Cursor<'_>) -> Result<([u8; TABLE_SIZE], [u8; TABLE_SIZE])> {
    let mut left = [0u8; TABLE_SIZE];
    let mut right = [0u8; TABLE_SIZE];
    for (i, slot) in left.iter_mut().enumerate() {
        *slot = i as u8;
    }

    let start = cursor.pos;
    let mut index = 0usize;

    while index < TABLE_SIZE {
        let control = cursor.byte()?;

        if control > 127 {
            index += (control - 127) as usize;
            if index >= TABLE_SIZE {
                continue;
            }
            let first = cursor.byte()?;
            if first as usize == index {
                index += 1;
                continue;
            }
            left[index] = first;
            right[index] = cursor.byte()?;
        } else {
            left[index] = cursor.byte()?;
            right[index] = cursor.byte()?;

            let mut remaining = control as i32;
            while remaining > 0 {
                index += 1;
                remaining -= 1;
                let mut first = cursor.byte()?;
                if first as usize == index {
                    index += 1;
                    remaining -= 1;
                    first = cursor.byte()?;
                }
                if index >= TABLE_SIZE {
                    return Err(DemodiskError::corrupt(cursor.pos, "pair table run past slot 255"));
                }
                left[index] = first;
                right[index] = cursor.byte()?;
            }
        }
        index += 1;
    }

    if index != TABLE_SIZE {
        return Err(DemodiskError::corrupt(
            start,
            format!("pair table ends at slot {}", index),
        ));
    }

    Ok((left, right))
}

fn expand_segment(
    codes: &[u8],
    left: &[u8; TABLE_SIZE],
    right: &[u8; TABLE_SIZE],
    out: &mut Vec<u8>,
    offset: usize,
) -> Result<()> {
    let mut stack = Vec::with_capacity(32);

    for &code in codes {
        stack.push(code);
        while let Some(top) = stack.pop() {
            let t = top as usize;
            if left[t] == top {
                if out.len() == MAX_OUTPUT {
                    return Err(DemodiskError::corrupt(offset, "pair expansion exceeds 16 MiB"));
                }
                out.push(top);
            } else {
                stack.push(right[t]);
                stack.push(left[t]);
                if stack.len() > MAX_STACK {
                    return Err(DemodiskError::corrupt(offset, "pair table is cyclic"));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stream() {
        assert_eq!(expand(&[0, 0]).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_literal_only_segment() {
        // skip 128 slots, leave slot 128 literal, skip to 256
        let data = [0x00, 0x02, 0xFF, 0x80, 0xFE, b'A', b'B', 0x00, 0x00];
        assert_eq!(expand(&data).unwrap(), b"AB");
    }

    #[test]
    fn test_pair_expansion() {
        // slot 1 = ('A', 'B'), everything else literal
        let data = [
            0x00, 0x02, 0x80, b'A', b'B', 0xFF, 0x82, 0xFC, 0x01, b'C', 0x00, 0x00,
        ];
        assert_eq!(expand(&data).unwrap(), b"ABC");
    }

    #[test]
    fn test_nested_pairs() {
        // slot 1 = ('A', 'B'), slot 2 = (1, 1) -> "ABAB"
        let data = [
            0x00, 0x01, 0x80, b'A', b'B', 0x00, 0x01, 0x01, 0xFF, 0x83, 0xFB, 0x02, 0x00, 0x00,
        ];
        assert_eq!(expand(&data).unwrap(), b"ABAB");
    }

    #[test]
    fn test_truncated_stream() {
        assert!(matches!(expand(&[0x00]), Err(DemodiskError::CorruptFormat { .. })));
        assert!(matches!(
            expand(&[0x00, 0x05, 0xFF, 0x80, 0xFE, b'A']),
            Err(DemodiskError::CorruptFormat { .. })
        ));
    }

    #[test]
    fn test_table_overshoot() {
        // 128 + 129 slots skipped lands past 256
        let data = [0x00, 0x01, 0xFF, 0x80, 0xFF, b'A', 0x00, 0x00];
        assert!(matches!(expand(&data), Err(DemodiskError::CorruptFormat { .. })));
    }

    #[test]
    fn test_cyclic_table() {
        // slot 1 = (2, 2), slot 2 = (1, 1)
        let data = [
            0x00, 0x01, 0x80, 0x02, 0x02, 0x00, 0x01, 0x01, 0xFF, 0x83, 0xFB, 0x01, 0x00, 0x00,
        ];
        assert!(matches!(expand(&data), Err(DemodiskError::CorruptFormat { .. })));
    }
}
