use log::{debug, error, trace, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::display::{Framebuffer, GFX_HEIGHT, GFX_WIDTH};
use crate::error::{Result, VmError};
use crate::keypad::{KeypadState, KEYPAD_SIZE};
use crate::memory::{Memory, Stack, MEM_REGION_RAM, MEM_SIZE};
use crate::opcode::OpCode;

// Registers
pub const REGISTER_NUM: usize = 16;
const FLAG_REGISTER: usize = 0xF;

const INSTRUCTION_SIZE: u16 = 2;
const SPRITE_WIDTH: usize = 8;
const ADDRESS_MASK: u16 = (MEM_SIZE - 1) as u16;

/// Whether the vm is fetching instructions or parked on `Fx0A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecState {
    Running,
    /// Holds the register that receives the key.
    AwaitingKey(u8),
}

#[derive(Debug, PartialEq)]
enum InstructionResult {
    Next,
    Skip,
    Jump(u16),
    Wait,
}

impl InstructionResult {
    #[inline]
    fn skip_if(condition: bool) -> Self {
        if condition {
            InstructionResult::Skip
        } else {
            InstructionResult::Next
        }
    }
}

pub struct VM {
    memory: Memory,
    registers: [u8; REGISTER_NUM],
    index_register: u16,
    program_counter: u16,
    delay_timer: u8,
    sound_timer: u8,
    stack: Stack,
    display: Framebuffer,
    keypad: KeypadState,
    state: ExecState,
    draw_flag: bool,
    fault: Option<VmError>,
    last_unknown_opcode: Option<u16>,
    //
    rng: StdRng,
}

impl VM {
    // Pub

    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// A vm whose `Cxkk` results are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        VM {
            memory: Memory::new(),
            registers: [0; REGISTER_NUM],
            index_register: 0,
            program_counter: MEM_REGION_RAM,
            delay_timer: 0,
            sound_timer: 0,
            stack: Stack::new(),
            display: Framebuffer::new(),
            keypad: KeypadState::new(),
            state: ExecState::Running,
            draw_flag: false,
            fault: None,
            last_unknown_opcode: None,
            rng,
        }
    }

    pub fn reset(&mut self) {
        self.memory.reset();
        self.registers = [0; REGISTER_NUM];
        self.index_register = 0;
        self.program_counter = MEM_REGION_RAM;
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.stack.clear();
        self.display.clear();
        self.keypad = KeypadState::new();
        self.state = ExecState::Running;
        self.draw_flag = false;
        self.fault = None;
        self.last_unknown_opcode = None;
        debug!("vm reset");
    }

    /// Copies a program into RAM. A rejected rom leaves the vm untouched.
    pub fn load(&mut self, rom_data: &[u8]) -> Result<()> {
        match self.memory.load_rom(rom_data) {
            Ok(start) => {
                debug!("loaded {} byte rom at {:#05x}", rom_data.len(), start);
                Ok(())
            }
            Err(err) => {
                warn!("rejected rom: {}", err);
                Err(err)
            }
        }
    }

    /// Runs a single instruction and returns whether the screen changed.
    ///
    /// A fatal error halts the vm; every later call returns
    /// [`VmError::Halted`] until [`VM::reset`].
    pub fn step(&mut self) -> Result<bool> {
        if self.fault.is_some() {
            return Err(VmError::Halted);
        }

        self.draw_flag = false;

        let outcome = match self.state {
            ExecState::Running => self.fetch().and_then(|opcode| self.execute(opcode)),
            ExecState::AwaitingKey(vx_idx) => {
                let result = self.poll_key(vx_idx.into());
                self.advance(result);
                Ok(())
            }
        };

        if let Err(err) = outcome {
            error!("vm halted at {:#05x}: {}", self.program_counter, err);
            self.fault = Some(err);
            return Err(err);
        }

        Ok(self.draw_flag)
    }

    /// Counts both timers down by one, to be called at 60Hz.
    pub fn tick_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    pub fn set_keys(&mut self, keys: [bool; KEYPAD_SIZE]) {
        self.keypad = KeypadState::from(keys);
    }

    pub fn keypad_mut(&mut self) -> &mut KeypadState {
        &mut self.keypad
    }

    /// Returns 1 for a lit pixel, 0 otherwise (including off-screen coordinates).
    pub fn pixel(&self, col: usize, row: usize) -> u8 {
        if col >= GFX_WIDTH || row >= GFX_HEIGHT {
            return 0;
        }
        self.display.get(col, row) as u8
    }

    pub fn draw_flag(&self) -> bool {
        self.draw_flag
    }

    pub fn sound_active(&self) -> bool {
        self.sound_timer != 0
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.display
    }

    pub fn memory(&self) -> &[u8] {
        self.memory.as_slice()
    }

    pub fn pc(&self) -> u16 {
        self.program_counter
    }

    pub fn index(&self) -> u16 {
        self.index_register
    }

    pub fn register(&self, idx: usize) -> u8 {
        self.registers[idx & 0xF]
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    pub fn exec_state(&self) -> ExecState {
        self.state
    }

    pub fn is_waiting_for_key(&self) -> bool {
        matches!(self.state, ExecState::AwaitingKey(_))
    }

    /// The error that halted the vm, if any.
    pub fn fault(&self) -> Option<VmError> {
        self.fault
    }

    pub fn last_unknown_opcode(&self) -> Option<u16> {
        self.last_unknown_opcode
    }

    // Priv

    fn fetch(&self) -> Result<OpCode> {
        let bytes = self.memory.get16(self.program_counter.into())?;
        let opcode = OpCode::from_bytes(bytes);
        trace!("{:#05x}: {:04x}  {}", self.program_counter, bytes, opcode);
        Ok(opcode)
    }

    #[inline]
    fn advance(&mut self, result: InstructionResult) {
        match result {
            InstructionResult::Next => self.program_counter += INSTRUCTION_SIZE,
            InstructionResult::Skip => self.program_counter += INSTRUCTION_SIZE * 2,
            InstructionResult::Jump(addr) => self.program_counter = addr,
            InstructionResult::Wait => (),
        }
    }

    fn execute(&mut self, opcode: OpCode) -> Result<()> {
        use OpCode::*;
        let result = match opcode {
            CLS() => {
                self.display.clear();
                self.draw_flag = true;
                InstructionResult::Next
            }
            RET() => self.ret()?,
            JP(addr) => InstructionResult::Jump(addr),
            CALL(addr) => self.call(addr)?,
            JPVA(addr) => InstructionResult::Jump(addr + self.registers[0x0] as u16),

            // Conditional skips
            SEVB(x, byte) => InstructionResult::skip_if(self.registers[x as usize] == byte),
            SNEVB(x, byte) => InstructionResult::skip_if(self.registers[x as usize] != byte),
            SEVV(x, y) => InstructionResult::skip_if(
                self.registers[x as usize] == self.registers[y as usize],
            ),
            SNEVV(x, y) => InstructionResult::skip_if(
                self.registers[x as usize] != self.registers[y as usize],
            ),
            SKPV(x) => {
                InstructionResult::skip_if(self.keypad.is_pressed(self.registers[x as usize]))
            }
            SKNPV(x) => {
                InstructionResult::skip_if(!self.keypad.is_pressed(self.registers[x as usize]))
            }

            // Register loads and arithmetic
            LDVB(x, byte) => self.write_register(x, byte),
            ADDVB(x, byte) => self.write_register(x, self.registers[x as usize].wrapping_add(byte)),
            LDVV(x, y) => self.alu(x, y, |_, vy| (vy, None)),
            ORVV(x, y) => self.alu(x, y, |vx, vy| (vx | vy, None)),
            ANDVV(x, y) => self.alu(x, y, |vx, vy| (vx & vy, None)),
            XORVV(x, y) => self.alu(x, y, |vx, vy| (vx ^ vy, None)),
            ADDVV(x, y) => self.alu(x, y, |vx, vy| {
                let (sum, carry) = vx.overflowing_add(vy);
                (sum, Some(carry as u8))
            }),
            SUBVV(x, y) => self.alu(x, y, |vx, vy| (vx.wrapping_sub(vy), Some((vx >= vy) as u8))),
            SHRVV(x, y) => self.alu(x, y, |vx, _| (vx >> 1, Some(vx & 0x1))),
            SUBNVV(x, y) => self.alu(x, y, |vx, vy| (vy.wrapping_sub(vx), Some((vy >= vx) as u8))),
            SHLVV(x, y) => self.alu(x, y, |vx, _| (vx << 1, Some((vx >> 7) & 0x1))),
            RNDVB(x, byte) => {
                let num: u8 = self.rng.gen();
                self.write_register(x, num & byte)
            }

            // Index register
            LDIA(addr) => {
                self.index_register = addr;
                InstructionResult::Next
            }
            ADDIV(x) => {
                self.index_register =
                    (self.index_register + self.registers[x as usize] as u16) & ADDRESS_MASK;
                InstructionResult::Next
            }
            LDFV(x) => {
                self.index_register = self
                    .memory
                    .get_font_sprite_location(self.registers[x as usize]);
                InstructionResult::Next
            }

            // Timers and input
            LDVDT(x) => self.write_register(x, self.delay_timer),
            LDDTV(x) => {
                self.delay_timer = self.registers[x as usize];
                InstructionResult::Next
            }
            LDSTV(x) => {
                self.sound_timer = self.registers[x as usize];
                InstructionResult::Next
            }
            LDVK(x) => self.poll_key(x.into()),

            // Memory transfers
            DRWVVN(x, y, nibble) => self.draw(x.into(), y.into(), nibble)?,
            LDBV(x) => self.store_bcd(x.into())?,
            LDIV(x) => self.store_registers(x.into())?,
            LDVI(x) => self.load_registers(x.into())?,

            Unknown(bytes) => {
                warn!(
                    "unknown opcode {:#06x} at {:#05x}, ignoring",
                    bytes, self.program_counter
                );
                self.last_unknown_opcode = Some(bytes);
                InstructionResult::Next
            }
        };

        self.advance(result);
        Ok(())
    }

    #[inline]
    fn write_register(&mut self, x: u8, value: u8) -> InstructionResult {
        self.registers[x as usize] = value;
        InstructionResult::Next
    }

    /// 8xy_ group. The flag is written after the result so VF ends up
    /// holding the flag when it is also the destination.
    #[inline]
    fn alu<F>(&mut self, x: u8, y: u8, op: F) -> InstructionResult
    where
        F: FnOnce(u8, u8) -> (u8, Option<u8>),
    {
        let (result, flag) = op(self.registers[x as usize], self.registers[y as usize]);
        self.registers[x as usize] = result;
        if let Some(flag) = flag {
            self.registers[FLAG_REGISTER] = flag;
        }
        InstructionResult::Next
    }

    fn call(&mut self, addr: u16) -> Result<InstructionResult> {
        // 2nnn - CALL addr
        // The return address is the instruction after the call.
        let return_addr = self.program_counter + INSTRUCTION_SIZE;
        if !self.stack.push(return_addr) {
            return Err(VmError::StackOverflow {
                pc: self.program_counter,
            });
        }
        Ok(InstructionResult::Jump(addr))
    }

    fn ret(&mut self) -> Result<InstructionResult> {
        // 00EE - RET
        match self.stack.pop() {
            Some(addr) => Ok(InstructionResult::Jump(addr)),
            None => Err(VmError::StackUnderflow {
                pc: self.program_counter,
            }),
        }
    }

    fn poll_key(&mut self, vx_idx: usize) -> InstructionResult {
        // Fx0A - LD Vx, K
        // Parks the vm until any key is down, then stores the lowest one.
        match self.keypad.first_pressed() {
            Some(key) => {
                self.registers[vx_idx] = key;
                self.state = ExecState::Running;
                InstructionResult::Next
            }
            None => {
                self.state = ExecState::AwaitingKey(vx_idx as u8);
                InstructionResult::Wait
            }
        }
    }

    fn draw(&mut self, vx_idx: usize, vy_idx: usize, nibble: u8) -> Result<InstructionResult> {
        // Dxyn - DRW Vx, Vy, nibble
        // XOR an n-byte sprite from [I] onto the screen, VF = collision.
        let origin_x = self.registers[vx_idx] as usize;
        let origin_y = self.registers[vy_idx] as usize;
        let sprite = self
            .memory
            .range(self.index_register.into(), nibble.into())?;

        self.registers[FLAG_REGISTER] = 0;
        let mut collision = false;
        for (row, byte) in sprite.iter().enumerate() {
            for col in 0..SPRITE_WIDTH {
                if (byte & (0x80 >> col)) != 0 {
                    collision |= self.display.toggle(origin_x + col, origin_y + row);
                }
            }
        }

        self.registers[FLAG_REGISTER] = collision as u8;
        self.draw_flag = true;
        Ok(InstructionResult::Next)
    }

    fn store_bcd(&mut self, vx_idx: usize) -> Result<InstructionResult> {
        // Fx33 - LD B, Vx
        let value = self.registers[vx_idx];
        let digits = self.memory.range_mut(self.index_register.into(), 3)?;
        digits[0] = value / 100;
        digits[1] = (value / 10) % 10;
        digits[2] = value % 10;
        Ok(InstructionResult::Next)
    }

    fn store_registers(&mut self, vx_idx: usize) -> Result<InstructionResult> {
        // Fx55 - LD [I], Vx
        // V0..=Vx go to memory, I is left as is.
        let target = self
            .memory
            .range_mut(self.index_register.into(), vx_idx + 1)?;
        target.copy_from_slice(&self.registers[..=vx_idx]);
        Ok(InstructionResult::Next)
    }

    fn load_registers(&mut self, vx_idx: usize) -> Result<InstructionResult> {
        // Fx65 - LD Vx, [I]
        let source = self.memory.range(self.index_register.into(), vx_idx + 1)?;
        self.registers[..=vx_idx].copy_from_slice(source);
        Ok(InstructionResult::Next)
    }
}

impl Default for VM {
    fn default() -> Self {
        Self::new()
    }
}
