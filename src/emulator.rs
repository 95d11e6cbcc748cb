use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

use crate::{config::Config, error::VmError, keypad::KeypadState, timing::Timing, vm::VM};

#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to read rom {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Vm(#[from] VmError),
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub fault: Option<VmError>,
}

/// Headless host: feeds key state, paces `step` and `tick_timers`,
/// and reports sound and screen changes.
pub struct Emulator {
    vm: VM,
    keypad: KeypadState,
    timing: Timing,
    frame: u64,
    beeping: bool,
}

impl Emulator {
    pub fn new(vm: VM, timing: Timing) -> Self {
        Self {
            vm,
            keypad: KeypadState::new(),
            timing,
            frame: 0,
            beeping: false,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, HostError> {
        let rom = read_rom(&config.rom_path)?;
        let mut vm = match config.seed {
            Some(seed) => VM::with_seed(seed),
            None => VM::new(),
        };
        vm.load(&rom)?;

        let mut emulator = Self::new(vm, Timing::new(config.tick_rate, config.timer_rate));
        emulator.keypad = config.held_keys;
        Ok(emulator)
    }

    pub fn vm(&self) -> &VM {
        &self.vm
    }

    pub fn keypad_mut(&mut self) -> &mut KeypadState {
        &mut self.keypad
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Runs one frame worth of instructions followed by a single timer tick.
    /// Returns whether anything was drawn during the frame.
    pub fn run_frame(&mut self) -> Result<bool, VmError> {
        let mut drew = false;
        for _ in 0..self.timing.steps_in_frame(self.frame) {
            self.vm.set_keys(self.keypad.state);
            drew |= self.vm.step()?;
        }

        self.vm.tick_timers();
        self.update_beeper();
        self.frame += 1;
        Ok(drew)
    }

    /// Runs until the vm faults or `frames` frames have passed.
    /// `on_draw` sees the vm after every frame that changed the screen.
    pub fn run<F>(&mut self, frames: Option<u64>, throttled: bool, mut on_draw: F) -> RunSummary
    where
        F: FnMut(&VM),
    {
        let start = self.frame;
        let mut fault = None;

        while frames.map_or(true, |limit| self.frame - start < limit) {
            match self.run_frame() {
                Ok(true) => on_draw(&self.vm),
                Ok(false) => (),
                Err(err) => {
                    fault = Some(err);
                    break;
                }
            }
            if throttled {
                self.timing.wait_for_frame();
            }
        }

        debug!("stopped after {} frames", self.frame - start);
        RunSummary {
            frames: self.frame - start,
            fault,
        }
    }

    fn update_beeper(&mut self) {
        let active = self.vm.sound_active();
        if self.beeping != active {
            self.beeping = active;
            info!("beeper {}", if active { "on" } else { "off" });
        }
    }
}

pub fn read_rom(path: &Path) -> Result<Vec<u8>, HostError> {
    std::fs::read(path).map_err(|source| HostError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::{Emulator, HostError};
    use crate::{config::Config, error::VmError, timing::Timing, vm::VM};

    fn emulator_with_rom(rom: &[u8], tickrate: u64) -> Emulator {
        let mut vm = VM::with_seed(1);
        vm.load(rom).unwrap();
        Emulator::new(vm, Timing::new(tickrate, 60))
    }

    #[test]
    fn run_frame_test() {
        // LD V0, 0x3C ; LD DT, V0 ; JP 0x204
        let mut emulator = emulator_with_rom(&[0x60, 0x3C, 0xF0, 0x15, 0x12, 0x04], 600);
        assert_eq!(emulator.run_frame(), Ok(false));
        assert_eq!(emulator.vm().delay_timer(), 59);

        let summary = emulator.run(Some(10), false, |_| ());
        assert_eq!(summary.frames, 10);
        assert_eq!(summary.fault, None);
        assert_eq!(emulator.vm().delay_timer(), 49);
    }

    #[test]
    fn run_stops_on_fault_test() {
        // LD V1, 0x01 ; RET
        let mut emulator = emulator_with_rom(&[0x61, 0x01, 0x00, 0xEE], 600);
        let summary = emulator.run(None, false, |_| ());
        assert_eq!(summary.frames, 0);
        assert_eq!(summary.fault, Some(VmError::StackUnderflow { pc: 0x202 }));
        assert_eq!(emulator.vm().fault(), summary.fault);
    }

    #[test]
    fn held_keys_reach_vm_test() {
        // LD V2, K ; LD I, 0 ; DRW V0, V0, 5 ; JP 0x206
        let rom = [0xF2, 0x0A, 0xA0, 0x00, 0xD0, 0x05, 0x12, 0x06];
        let mut emulator = emulator_with_rom(&rom, 600);
        emulator.run(Some(3), false, |_| ());
        assert!(emulator.vm().is_waiting_for_key());

        emulator.keypad_mut().set(0x7, true);
        let mut draws = 0;
        emulator.run(Some(1), false, |vm| {
            draws += 1;
            assert_eq!(vm.pixel(0, 0), 1);
        });
        assert_eq!(draws, 1);
        assert_eq!(emulator.vm().register(0x2), 0x7);
    }

    #[test]
    fn missing_rom_test() {
        let config = Config::with_rom("/nonexistent/rom.ch8");
        assert!(matches!(
            Emulator::from_config(&config),
            Err(HostError::Io { .. })
        ));
    }
}
