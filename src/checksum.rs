//! 16-bit block checksum used by the host engine to key entity lumps.
//!
//! CRC-16/CCITT: polynomial 0x1021, initial value 0xFFFF, no reflection and
//! no final xor.

const CRC_INIT_VALUE: u16 = 0xffff;
const CRC_POLY: u16 = 0x1021;

const CRC_TABLE: [u16; 256] = build_table();

const fn build_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ CRC_POLY
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Checksum of a whole entity lump, terminator byte included.
pub fn crc_block(data: &[u8]) -> u16 {
    data.iter().fold(CRC_INIT_VALUE, |crc, &byte| {
        (crc << 8) ^ CRC_TABLE[((crc >> 8) as u8 ^ byte) as usize]
    })
}
