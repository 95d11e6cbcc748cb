use crate::error::{Result, VmError};

// Memory region sizes
pub const MEM_SIZE: usize = 4096;
const MEM_SIZE_FONT: usize = 0x50;
pub const MAX_ROM_SIZE: usize = MEM_SIZE - MEM_REGION_RAM as usize;

// Memory region starting addresses
const MEM_REGION_FONT: u16 = 0x000;
pub const MEM_REGION_RAM: u16 = 0x200;

const FONT_SPRITE_SIZE: u16 = 5;

// Stack
pub const STACK_SIZE: usize = 16;

// Fontset
pub const FONTSET: [u8; MEM_SIZE_FONT] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

pub struct Memory {
    memory: [u8; MEM_SIZE],
}

pub struct Stack {
    stack: [u16; STACK_SIZE],
    stack_pointer: usize,
}

impl Memory {
    pub fn new() -> Self {
        let mut memory = Self {
            memory: [0; MEM_SIZE],
        };
        memory.reset();
        memory
    }

    /// Zeroes everything and puts the font back at the bottom of memory.
    pub fn reset(&mut self) {
        self.memory = [0; MEM_SIZE];
        self.write_region(MEM_REGION_FONT as usize, &FONTSET);
    }

    /// Copies a program image to the start of RAM.
    ///
    /// Nothing is written unless the whole image fits.
    pub fn load_rom(&mut self, rom_data: &[u8]) -> Result<u16> {
        if rom_data.is_empty() || rom_data.len() > MAX_ROM_SIZE {
            return Err(VmError::InvalidRomSize {
                size: rom_data.len(),
            });
        }

        self.write_region(MEM_REGION_RAM as usize, rom_data);
        Ok(MEM_REGION_RAM)
    }

    pub fn get_font_sprite_location(&self, sprite_id: u8) -> u16 {
        MEM_REGION_FONT + FONT_SPRITE_SIZE * sprite_id as u16
    }

    pub fn set8(&mut self, address: usize, value: u8) -> Result<()> {
        *self
            .memory
            .get_mut(address)
            .ok_or(VmError::MemoryOutOfBounds { address })? = value;
        Ok(())
    }

    pub fn get8(&self, address: usize) -> Result<u8> {
        self.memory
            .get(address)
            .copied()
            .ok_or(VmError::MemoryOutOfBounds { address })
    }

    /// Reads a big-endian word, both bytes must be addressable.
    pub fn get16(&self, address: usize) -> Result<u16> {
        let bytes = self.range(address, 2)?;
        Ok((bytes[0] as u16) << 8 | bytes[1] as u16)
    }

    pub fn range(&self, address: usize, len: usize) -> Result<&[u8]> {
        let end = Self::checked_end(address, len)?;
        Ok(&self.memory[address..end])
    }

    pub fn range_mut(&mut self, address: usize, len: usize) -> Result<&mut [u8]> {
        let end = Self::checked_end(address, len)?;
        Ok(&mut self.memory[address..end])
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.memory
    }

    fn checked_end(address: usize, len: usize) -> Result<usize> {
        let end = address + len;
        if end > MEM_SIZE {
            // Report the first byte that falls outside of memory
            let address = address.max(MEM_SIZE);
            return Err(VmError::MemoryOutOfBounds { address });
        }
        Ok(end)
    }

    fn write_region(&mut self, start: usize, data: &[u8]) {
        self.memory[start..start + data.len()].copy_from_slice(data);
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Stack {
    pub fn new() -> Self {
        Self {
            stack: [0; STACK_SIZE],
            stack_pointer: 0,
        }
    }

    pub fn clear(&mut self) {
        self.stack_pointer = 0;
    }

    pub fn len(&self) -> usize {
        self.stack_pointer
    }

    pub fn is_empty(&self) -> bool {
        self.stack_pointer == 0
    }

    /// Returns `false` when the stack is already full.
    #[must_use]
    pub fn push(&mut self, value: u16) -> bool {
        if self.stack_pointer == STACK_SIZE {
            return false;
        }
        self.stack[self.stack_pointer] = value;
        self.stack_pointer += 1;
        true
    }

    pub fn pop(&mut self) -> Option<u16> {
        if self.stack_pointer == 0 {
            return None;
        }
        self.stack_pointer -= 1;
        Some(self.stack[self.stack_pointer])
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{Memory, Stack, FONTSET, MAX_ROM_SIZE, MEM_REGION_RAM, MEM_SIZE, STACK_SIZE};
    use crate::error::VmError;

    #[test]
    fn reset_test() {
        let mut memory = Memory::new();
        memory.set8(0x300, 0xAB).unwrap();
        memory.set8(0x10, 0x00).unwrap();

        memory.reset();
        assert_eq!(&memory.as_slice()[..FONTSET.len()], &FONTSET[..]);
        assert!(memory.as_slice()[FONTSET.len()..].iter().all(|b| *b == 0));
    }

    #[test]
    fn load_rom_test() {
        let mut memory = Memory::new();
        let start = memory.load_rom(&[0x12, 0x34]).unwrap();
        assert_eq!(start, MEM_REGION_RAM);
        assert_eq!(memory.get16(MEM_REGION_RAM as usize).unwrap(), 0x1234);

        let full = vec![0xEE; MAX_ROM_SIZE];
        assert!(memory.load_rom(&full).is_ok());
        assert_eq!(memory.get8(MEM_SIZE - 1).unwrap(), 0xEE);
    }

    #[test]
    fn load_rom_rejects_bad_sizes() {
        let mut memory = Memory::new();
        assert_eq!(
            memory.load_rom(&[]),
            Err(VmError::InvalidRomSize { size: 0 })
        );

        let too_big = vec![0xEE; MAX_ROM_SIZE + 1];
        assert_eq!(
            memory.load_rom(&too_big),
            Err(VmError::InvalidRomSize {
                size: MAX_ROM_SIZE + 1
            })
        );
        assert_eq!(memory.get8(MEM_REGION_RAM as usize).unwrap(), 0);
    }

    #[test]
    fn bounds_test() {
        let mut memory = Memory::new();
        assert_eq!(
            memory.get8(MEM_SIZE),
            Err(VmError::MemoryOutOfBounds { address: MEM_SIZE })
        );
        assert_eq!(
            memory.set8(MEM_SIZE, 1),
            Err(VmError::MemoryOutOfBounds { address: MEM_SIZE })
        );
        // The second byte of the word is missing
        assert_eq!(
            memory.get16(MEM_SIZE - 1),
            Err(VmError::MemoryOutOfBounds { address: MEM_SIZE })
        );
        assert!(memory.range(MEM_SIZE - 3, 3).is_ok());
        assert!(memory.range_mut(MEM_SIZE - 3, 4).is_err());
    }

    #[test]
    fn font_location_test() {
        let memory = Memory::new();
        assert_eq!(memory.get_font_sprite_location(0x0), 0x00);
        assert_eq!(memory.get_font_sprite_location(0xA), 50);
        assert_eq!(memory.get_font_sprite_location(0xF), 75);
    }

    #[test]
    fn stack_test() {
        let mut stack = Stack::new();
        assert_eq!(stack.pop(), None);

        for i in 0..STACK_SIZE {
            assert!(stack.push(i as u16));
        }
        assert!(!stack.push(0xFFF));
        assert_eq!(stack.len(), STACK_SIZE);

        assert_eq!(stack.pop(), Some(STACK_SIZE as u16 - 1));
        stack.clear();
        assert!(stack.is_empty());
    }
}
