//! Fixed-capacity command name buffer

use std::fmt;

/// Capacity of a command name, including the terminating NUL
pub const COMM_LEN: usize = 16;

/// A thread's command name stored inline as a NUL-terminated buffer.
///
/// Writes longer than `COMM_LEN - 1` bytes are truncated silently, on a
/// UTF-8 character boundary, and the byte after the last kept character is
/// always NUL.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Comm {
    buf: [u8; COMM_LEN],
}

impl Comm {
    pub fn new(name: &str) -> Self {
        let mut comm = Self::default();
        comm.set(name);
        comm
    }

    pub fn set(&mut self, name: &str) {
        let mut end = name.len().min(COMM_LEN - 1);
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        self.buf = [0; COMM_LEN];
        self.buf[..end].copy_from_slice(&name.as_bytes()[..end]);
    }

    /// Length in bytes, excluding the terminator
    pub fn len(&self) -> usize {
        self.buf.iter().position(|&b| b == 0).unwrap_or(COMM_LEN - 1)
    }

    pub fn is_empty(&self) -> bool {
        self.buf[0] == 0
    }

    pub fn as_str(&self) -> &str {
        // Only ever filled from a &str cut at a char boundary.
        std::str::from_utf8(&self.buf[..self.len()]).unwrap_or_default()
    }
}

impl From<&str> for Comm {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Comm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Comm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Comm({:?})", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_name_round_trips() {
        let comm = Comm::new("bash");
        assert_eq!(comm.as_str(), "bash");
        assert_eq!(comm.len(), 4);
        assert_eq!(comm.buf[4], 0);
    }

    #[test]
    fn test_long_name_truncated_to_capacity_minus_one() {
        let comm = Comm::new("a-very-long-command-name");
        assert_eq!(comm.as_str(), "a-very-long-com");
        assert_eq!(comm.len(), COMM_LEN - 1);
        assert_eq!(comm.buf[COMM_LEN - 1], 0);
    }

    #[test]
    fn test_exact_capacity_name_loses_last_byte() {
        let name = "0123456789abcdef";
        assert_eq!(name.len(), COMM_LEN);
        assert_eq!(Comm::new(name).as_str(), "0123456789abcde");
    }

    #[test]
    fn test_truncation_respects_char_boundary() {
        // 14 ASCII bytes then a 2-byte char straddling the limit
        let name = "abcdefghijklmné";
        let comm = Comm::new(name);
        assert_eq!(comm.as_str(), "abcdefghijklmn");
    }

    #[test]
    fn test_overwrite_clears_previous_tail() {
        let mut comm = Comm::new("longer-name");
        comm.set("ab");
        assert_eq!(comm.as_str(), "ab");
        assert!(comm.buf[2..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_empty() {
        let comm = Comm::default();
        assert!(comm.is_empty());
        assert_eq!(comm.as_str(), "");
        assert_eq!(format!("{:?}", Comm::new("sh")), "Comm(\"sh\")");
    }
}
