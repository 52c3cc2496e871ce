#![allow(dead_code)]

pub mod std;

use storezip::types::{DateTimeCS, FileDateTime};
use storezip::ZipEntry;

pub fn fixed_time() -> FileDateTime {
    FileDateTime::Custom(DateTimeCS::from_date_and_time(2024, 5, 17, 9, 41, 22).unwrap())
}

/// `a.png` (10 bytes of 0xFF), `b.png` (empty), `c.png` (100,000 bytes of a repeating pattern).
pub fn three_images() -> Vec<ZipEntry<'static>> {
    let pattern: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();

    vec![
        ZipEntry::new("a.png", vec![0xFFu8; 10]).modified_time(fixed_time()),
        ZipEntry::new("b.png", Vec::new()).modified_time(fixed_time()),
        ZipEntry::new("c.png", pattern).modified_time(fixed_time()),
    ]
}

pub fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

pub fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Count the occurrences of a 4 bytes signature.
pub fn count_signature(bytes: &[u8], signature: u32) -> usize {
    let signature = signature.to_le_bytes();
    bytes.windows(4).filter(|window| *window == signature).count()
}
