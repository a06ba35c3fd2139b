use crate::ReadSeek;
use crate::utils::SeekGuard;

use std::cmp;
use std::fmt::Write;
use std::io::{self, Read};

/// Formats `data` as a canonical hexdump (`hexdump -C` style), with addresses starting at `offset`.
///
/// Each line shows the address, sixteen space-separated two column bytes, and the same sixteen
/// bytes as characters enclosed in `|`, with control characters replaced by dots.
pub fn format_hexdump(data: &[u8], offset: u64) -> String {
    let mut out = String::new();
    let mut address = 0;

    while address < data.len() {
        let end = cmp::min(address + 16, data.len());
        format_line(&mut out, &data[address..end], offset + address as u64);
        address += 16;
    }

    out
}

fn format_line(out: &mut String, line: &[u8], address: u64) {
    let _ = write!(out, "{:08x}:", address);

    for b in line {
        let _ = write!(out, " {:02x}", b);
    }

    // align the character column for short lines
    for _ in line.len()..16 {
        out.push_str("   ");
    }

    out.push_str("  |");
    for &c in line {
        let c = c as char;
        if c.is_ascii_graphic() || c == ' ' {
            out.push(c);
        } else {
            out.push('.');
        }
    }
    out.push_str("|\n");
}

/// Reads up to `len` bytes at `offset` and formats them, leaving the stream position untouched.
pub fn dump_stream<T: ReadSeek>(stream: &mut T, offset: u64, len: u64) -> io::Result<String> {
    let mut guard = SeekGuard::new(stream, offset)?;
    let mut data = Vec::with_capacity(len as usize);
    (&mut *guard).take(len).read_to_end(&mut data)?;

    Ok(format_hexdump(&data, offset))
}
