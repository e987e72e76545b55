/// Layout map visualization

use std::fmt::Write;

/// ANSI color codes for the layout map
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const DARK_WHITE: &str = "\x1b[2;37m";
    pub const PALETTE: [&str; 6] = [
        "\x1b[97m", // bright white
        "\x1b[93m", // bright yellow
        "\x1b[96m", // bright cyan
        "\x1b[92m", // bright green
        "\x1b[95m", // bright magenta
        "\x1b[94m", // bright blue
    ];
}

const BLOCK_FREE: &str = "\u{2591}"; // ░
const BLOCK_USED: &str = "\u{2593}"; // ▓

/// A named byte range to draw
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Label shown in the legend
    pub name: String,
    /// Start offset
    pub offset: usize,
    /// Length in bytes
    pub length: usize,
}

impl Segment {
    /// Create a segment
    pub fn new<S: Into<String>>(name: S, offset: usize, length: usize) -> Self {
        Self {
            name: name.into(),
            offset,
            length,
        }
    }
}

/// Render segments against a capacity as a coloured bar with a legend
///
/// Each of the `width` columns covers an equal slice of the capacity and takes
/// the colour of the segment at its first byte. Bytes past the capacity are
/// reported in the legend but not drawn.
pub fn render_map(title: &str, segments: &[Segment], capacity: usize, width: usize) -> String {
    let mut out = String::new();
    let width = width.max(1);
    let used: usize = segments.iter().map(|s| s.length).sum();

    let _ = writeln!(out, "=== {} ===", title);

    let mut row = String::new();
    for column in 0..width {
        let position = column * capacity / width;
        match segments
            .iter()
            .position(|s| position >= s.offset && position < s.offset + s.length)
        {
            Some(index) => {
                let color = colors::PALETTE[index % colors::PALETTE.len()];
                let _ = write!(row, "{}{}{}", color, BLOCK_USED, colors::RESET);
            }
            None => {
                let _ = write!(row, "{}{}{}", colors::DARK_WHITE, BLOCK_FREE, colors::RESET);
            }
        }
    }
    let _ = writeln!(out, "|{}|", row);

    for (index, segment) in segments.iter().enumerate() {
        let color = colors::PALETTE[index % colors::PALETTE.len()];
        let _ = writeln!(
            out,
            "{}{}{} {:<24} {:#08x} {:>9} bytes",
            color,
            BLOCK_USED,
            colors::RESET,
            segment.name,
            segment.offset,
            segment.length
        );
    }

    if used > capacity {
        let _ = writeln!(out, "Over capacity by {} bytes", used - capacity);
    } else {
        let _ = writeln!(
            out,
            "{}{}{} free                     {:>19} bytes",
            colors::DARK_WHITE,
            BLOCK_FREE,
            colors::RESET,
            capacity - used
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_lists_every_segment() {
        let segments = vec![Segment::new("boot", 0, 0xC00), Segment::new("loader", 0xC00, 0x2E000)];
        let map = render_map("Demodisk", &segments, 1_474_560, 64);
        assert!(map.starts_with("=== Demodisk ==="));
        assert!(map.contains("boot"));
        assert!(map.contains("loader"));
        assert!(map.contains(&format!("{}", 1_474_560 - 0xC00 - 0x2E000)));
    }

    #[test]
    fn test_map_bar_width() {
        let map = render_map("t", &[Segment::new("a", 0, 50)], 100, 10);
        let bar = map.lines().nth(1).unwrap();
        assert_eq!(bar.matches(BLOCK_USED).count(), 5);
        assert_eq!(bar.matches(BLOCK_FREE).count(), 5);
    }

    #[test]
    fn test_map_over_capacity() {
        let map = render_map("t", &[Segment::new("a", 0, 150)], 100, 10);
        assert!(map.contains("Over capacity by 50 bytes"));
    }
}
