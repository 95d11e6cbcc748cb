use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    CLS(),
    RET(),
    JP(u16),
    CALL(u16),
    SEVB(u8, u8),
    SNEVB(u8, u8),
    SEVV(u8, u8),
    LDVB(u8, u8),
    ADDVB(u8, u8),
    LDVV(u8, u8),
    ORVV(u8, u8),
    ANDVV(u8, u8),
    XORVV(u8, u8),
    ADDVV(u8, u8),
    SUBVV(u8, u8),
    SHRVV(u8, u8),
    SUBNVV(u8, u8),
    SHLVV(u8, u8),
    SNEVV(u8, u8),
    LDIA(u16),
    JPVA(u16),
    RNDVB(u8, u8),
    DRWVVN(u8, u8, u8),
    SKPV(u8),
    SKNPV(u8),
    LDVDT(u8),
    LDVK(u8),
    LDDTV(u8),
    LDSTV(u8),
    ADDIV(u8),
    LDFV(u8),
    LDBV(u8),
    LDIV(u8),
    LDVI(u8),
    /// Any word that does not match a known pattern, including 0nnn (SYS addr).
    Unknown(u16),
}

impl OpCode {
    pub fn from_bytes(bytes: u16) -> Self {
        use OpCode::*;

        match Self::split_bytes(bytes) {
            (0x0, 0x0, 0xE, 0x0) => CLS(),
            (0x0, 0x0, 0xE, 0xE) => RET(),
            (0x1, _, _, _) => JP(Self::get_addr(bytes)),
            (0x2, _, _, _) => CALL(Self::get_addr(bytes)),
            (0x3, x, _, _) => SEVB(x, Self::get_byte(bytes)),
            (0x4, x, _, _) => SNEVB(x, Self::get_byte(bytes)),
            (0x5, x, y, 0x0) => SEVV(x, y),
            (0x6, x, _, _) => LDVB(x, Self::get_byte(bytes)),
            (0x7, x, _, _) => ADDVB(x, Self::get_byte(bytes)),
            (0x8, x, y, 0x0) => LDVV(x, y),
            (0x8, x, y, 0x1) => ORVV(x, y),
            (0x8, x, y, 0x2) => ANDVV(x, y),
            (0x8, x, y, 0x3) => XORVV(x, y),
            (0x8, x, y, 0x4) => ADDVV(x, y),
            (0x8, x, y, 0x5) => SUBVV(x, y),
            (0x8, x, y, 0x6) => SHRVV(x, y),
            (0x8, x, y, 0x7) => SUBNVV(x, y),
            (0x8, x, y, 0xE) => SHLVV(x, y),
            (0x9, x, y, 0x0) => SNEVV(x, y),
            (0xA, _, _, _) => LDIA(Self::get_addr(bytes)),
            (0xB, _, _, _) => JPVA(Self::get_addr(bytes)),
            (0xC, x, _, _) => RNDVB(x, Self::get_byte(bytes)),
            (0xD, x, y, n) => DRWVVN(x, y, n),
            (0xE, x, 0x9, 0xE) => SKPV(x),
            (0xE, x, 0xA, 0x1) => SKNPV(x),
            (0xF, x, 0x0, 0x7) => LDVDT(x),
            (0xF, x, 0x0, 0xA) => LDVK(x),
            (0xF, x, 0x1, 0x5) => LDDTV(x),
            (0xF, x, 0x1, 0x8) => LDSTV(x),
            (0xF, x, 0x1, 0xE) => ADDIV(x),
            (0xF, x, 0x2, 0x9) => LDFV(x),
            (0xF, x, 0x3, 0x3) => LDBV(x),
            (0xF, x, 0x5, 0x5) => LDIV(x),
            (0xF, x, 0x6, 0x5) => LDVI(x),
            _ => Unknown(bytes),
        }
    }

    #[inline]
    fn split_bytes(bytes: u16) -> (u8, u8, u8, u8) {
        (
            ((bytes & 0xF000) >> 12) as u8,
            ((bytes & 0x0F00) >> 8) as u8,
            ((bytes & 0x00F0) >> 4) as u8,
            (bytes & 0x000F) as u8,
        )
    }

    /*
        As per (http://devernay.free.fr/hacks/chip8/C8TECH10.HTM):
        '''
            nnn or addr - A 12-bit value, the lowest 12 bits of the instruction
            n or nibble - A 4-bit value, the lowest 4 bits of the instruction
            x - A 4-bit value, the lower 4 bits of the high byte of the instruction
            y - A 4-bit value, the upper 4 bits of the low byte of the instruction
            kk or byte - An 8-bit value, the lowest 8 bits of the instruction
        '''

        This codebase refers to the last 12 bits of an opcode
        as "addr", and to the last 8 bits of an opcode as "byte"
    */

    #[inline]
    fn get_addr(bytes: u16) -> u16 {
        bytes & 0x0FFF
    }

    #[inline]
    fn get_byte(bytes: u16) -> u8 {
        (bytes & 0x00FF) as u8
    }
}

// Mnemonics follow Cowgod's reference, used for trace output
impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use OpCode::*;

        match *self {
            CLS() => write!(f, "CLS"),
            RET() => write!(f, "RET"),
            JP(addr) => write!(f, "JP {:#05x}", addr),
            CALL(addr) => write!(f, "CALL {:#05x}", addr),
            SEVB(x, byte) => write!(f, "SE V{:X}, {:#04x}", x, byte),
            SNEVB(x, byte) => write!(f, "SNE V{:X}, {:#04x}", x, byte),
            SEVV(x, y) => write!(f, "SE V{:X}, V{:X}", x, y),
            LDVB(x, byte) => write!(f, "LD V{:X}, {:#04x}", x, byte),
            ADDVB(x, byte) => write!(f, "ADD V{:X}, {:#04x}", x, byte),
            LDVV(x, y) => write!(f, "LD V{:X}, V{:X}", x, y),
            ORVV(x, y) => write!(f, "OR V{:X}, V{:X}", x, y),
            ANDVV(x, y) => write!(f, "AND V{:X}, V{:X}", x, y),
            XORVV(x, y) => write!(f, "XOR V{:X}, V{:X}", x, y),
            ADDVV(x, y) => write!(f, "ADD V{:X}, V{:X}", x, y),
            SUBVV(x, y) => write!(f, "SUB V{:X}, V{:X}", x, y),
            SHRVV(x, y) => write!(f, "SHR V{:X}, V{:X}", x, y),
            SUBNVV(x, y) => write!(f, "SUBN V{:X}, V{:X}", x, y),
            SHLVV(x, y) => write!(f, "SHL V{:X}, V{:X}", x, y),
            SNEVV(x, y) => write!(f, "SNE V{:X}, V{:X}", x, y),
            LDIA(addr) => write!(f, "LD I, {:#05x}", addr),
            JPVA(addr) => write!(f, "JP V0, {:#05x}", addr),
            RNDVB(x, byte) => write!(f, "RND V{:X}, {:#04x}", x, byte),
            DRWVVN(x, y, n) => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            SKPV(x) => write!(f, "SKP V{:X}", x),
            SKNPV(x) => write!(f, "SKNP V{:X}", x),
            LDVDT(x) => write!(f, "LD V{:X}, DT", x),
            LDVK(x) => write!(f, "LD V{:X}, K", x),
            LDDTV(x) => write!(f, "LD DT, V{:X}", x),
            LDSTV(x) => write!(f, "LD ST, V{:X}", x),
            ADDIV(x) => write!(f, "ADD I, V{:X}", x),
            LDFV(x) => write!(f, "LD F, V{:X}", x),
            LDBV(x) => write!(f, "LD B, V{:X}", x),
            LDIV(x) => write!(f, "LD [I], V{:X}", x),
            LDVI(x) => write!(f, "LD V{:X}, [I]", x),
            Unknown(bytes) => write!(f, "??? {:#06x}", bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::OpCode;

    #[test]
    fn decode_fields_test() {
        assert_eq!(OpCode::from_bytes(0x00E0), OpCode::CLS());
        assert_eq!(OpCode::from_bytes(0x00EE), OpCode::RET());
        assert_eq!(OpCode::from_bytes(0x1ABC), OpCode::JP(0xABC));
        assert_eq!(OpCode::from_bytes(0x2F00), OpCode::CALL(0xF00));
        assert_eq!(OpCode::from_bytes(0x3A7F), OpCode::SEVB(0xA, 0x7F));
        assert_eq!(OpCode::from_bytes(0x8124), OpCode::ADDVV(0x1, 0x2));
        assert_eq!(OpCode::from_bytes(0x8CDE), OpCode::SHLVV(0xC, 0xD));
        assert_eq!(OpCode::from_bytes(0xB123), OpCode::JPVA(0x123));
        assert_eq!(OpCode::from_bytes(0xD4A5), OpCode::DRWVVN(0x4, 0xA, 0x5));
        assert_eq!(OpCode::from_bytes(0xE39E), OpCode::SKPV(0x3));
        assert_eq!(OpCode::from_bytes(0xF70A), OpCode::LDVK(0x7));
        assert_eq!(OpCode::from_bytes(0xFF65), OpCode::LDVI(0xF));
    }

    #[test]
    fn unknown_test() {
        // SYS addr and the zero word are not executed
        for bytes in [0x0000, 0x0123, 0x00E1, 0x5121, 0x8128, 0x9121, 0xE1A2, 0xF1FF] {
            assert_eq!(OpCode::from_bytes(bytes), OpCode::Unknown(bytes));
        }
    }

    #[test]
    fn display_test() {
        assert_eq!(OpCode::from_bytes(0x6A0F).to_string(), "LD VA, 0x0f");
        assert_eq!(OpCode::from_bytes(0xA2F0).to_string(), "LD I, 0x2f0");
        assert_eq!(OpCode::from_bytes(0xD125).to_string(), "DRW V1, V2, 5");
        assert_eq!(OpCode::from_bytes(0x0123).to_string(), "??? 0x0123");
    }
}
