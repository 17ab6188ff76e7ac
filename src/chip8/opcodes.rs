use crate::{
    definitions::{cpu, display},
    opcode::{
        Address, Arithmetic, ArithmeticOpcode, ChipOpcodes, KeyOpcode, Keypad, Operation,
        ProgramCounterStep, RegisterConst, RegisterPair, Special, SpecialOpcode, Sprite,
        SystemOpcode,
    },
    ProcessError,
};

use super::ChipSet;

/// The width of a single sprite row
const BYTE: usize = 8;

impl ChipOpcodes for ChipSet {
    fn system(
        &mut self,
        opcode: &SystemOpcode,
    ) -> Result<(ProgramCounterStep, Operation), ProcessError> {
        match opcode {
            SystemOpcode::Clear => {
                self.clear_display();
                self.redraw = true;
                Ok((ProgramCounterStep::Next, Operation::Draw))
            }
            SystemOpcode::Return => {
                // Return from sub routine => pop from stack
                let pc = self.pop_stack()?;
                Ok((ProgramCounterStep::Jump(pc), Operation::None))
            }
        }
    }

    fn jump(&self, opcode: &Address) -> Result<ProgramCounterStep, ProcessError> {
        Ok(ProgramCounterStep::Jump(opcode.nnn))
    }

    fn call(&mut self, opcode: &Address) -> Result<ProgramCounterStep, ProcessError> {
        // the program counter already points to the opcode after the call
        self.push_stack(self.program_counter)?;
        Ok(ProgramCounterStep::Jump(opcode.nnn))
    }

    fn skip_equal_const(&self, opcode: &RegisterConst) -> Result<ProgramCounterStep, ProcessError> {
        Ok(ProgramCounterStep::cond(self.registers[opcode.x] == opcode.nn))
    }

    fn skip_not_equal_const(
        &self,
        opcode: &RegisterConst,
    ) -> Result<ProgramCounterStep, ProcessError> {
        Ok(ProgramCounterStep::cond(self.registers[opcode.x] != opcode.nn))
    }

    fn skip_equal_register(
        &self,
        opcode: &RegisterPair,
    ) -> Result<ProgramCounterStep, ProcessError> {
        Ok(ProgramCounterStep::cond(
            self.registers[opcode.x] == self.registers[opcode.y],
        ))
    }

    fn set_const(&mut self, opcode: &RegisterConst) -> Result<ProgramCounterStep, ProcessError> {
        self.registers[opcode.x] = opcode.nn;
        Ok(ProgramCounterStep::Next)
    }

    fn add_const(&mut self, opcode: &RegisterConst) -> Result<ProgramCounterStep, ProcessError> {
        // let VX overflow, but ignore carry
        self.registers[opcode.x] = self.registers[opcode.x].wrapping_add(opcode.nn);
        Ok(ProgramCounterStep::Next)
    }

    fn arithmetic(&mut self, opcode: &Arithmetic) -> Result<ProgramCounterStep, ProcessError> {
        let Arithmetic { ops, x, y } = *opcode;
        let vx = self.registers[x];
        let vy = self.registers[y];

        // the flag is always written after the result, so that it wins if X is VF
        let (res, flag) = match ops {
            ArithmeticOpcode::Assign => (vy, None),
            ArithmeticOpcode::Or => (vx | vy, None),
            ArithmeticOpcode::And => (vx & vy, None),
            ArithmeticOpcode::Xor => (vx ^ vy, None),
            ArithmeticOpcode::Add => {
                let (res, carry) = vx.overflowing_add(vy);
                (res, Some(carry as u8))
            }
            ArithmeticOpcode::Sub => (vx.wrapping_sub(vy), Some((vx >= vy) as u8)),
            ArithmeticOpcode::ShiftRight => (vx >> 1, Some(vx & 0x01)),
            ArithmeticOpcode::SubReverse => (vy.wrapping_sub(vx), Some((vy >= vx) as u8)),
            ArithmeticOpcode::ShiftLeft => (vx << 1, Some(vx >> 7)),
        };

        self.registers[x] = res;
        if let Some(flag) = flag {
            self.registers[cpu::register::LAST] = flag;
        }
        Ok(ProgramCounterStep::Next)
    }

    fn skip_not_equal_register(
        &self,
        opcode: &RegisterPair,
    ) -> Result<ProgramCounterStep, ProcessError> {
        Ok(ProgramCounterStep::cond(
            self.registers[opcode.x] != self.registers[opcode.y],
        ))
    }

    fn set_index(&mut self, opcode: &Address) -> Result<ProgramCounterStep, ProcessError> {
        self.index_register = opcode.nnn as u16;
        Ok(ProgramCounterStep::Next)
    }

    fn jump_offset(&self, opcode: &Address) -> Result<ProgramCounterStep, ProcessError> {
        let v0 = usize::from(self.registers[0]);
        Ok(ProgramCounterStep::Jump(opcode.nnn + v0))
    }

    fn random(&mut self, opcode: &RegisterConst) -> Result<ProgramCounterStep, ProcessError> {
        // using a fill bytes call here, as the trait RngCore does not
        // support random u8.
        let mut rand: [u8; 1] = [0];
        self.rng.fill_bytes(&mut rand);
        self.registers[opcode.x] = opcode.nn & rand[0];
        Ok(ProgramCounterStep::Next)
    }

    fn draw(&mut self, opcode: &Sprite) -> Result<(ProgramCounterStep, Operation), ProcessError> {
        // see https://tobiasvl.github.io/blog/write-a-chip-8-emulator/
        let index = usize::from(self.index_register);

        // only the origin wraps around, the rest of the sprite is clipped at the edges
        let coorx = usize::from(self.registers[opcode.x]) % display::WIDTH;
        let coory = usize::from(self.registers[opcode.y]) % display::HEIGHT;

        self.registers[cpu::register::LAST] = 0;
        let mut changed = false;

        for i in 0..opcode.n {
            let y = coory + i;
            if y >= display::HEIGHT {
                break;
            }

            let row = self.read_memory(index + i);

            for j in 0..BYTE {
                let x = coorx + j;
                if x >= display::WIDTH {
                    break;
                }

                // the most significant bit is the left most pixel
                if row & (0x80 >> j) == 0 {
                    continue;
                }

                let spixel = self.display[y][x];
                self.display[y][x] = !spixel;
                changed = true;

                if spixel {
                    self.registers[cpu::register::LAST] = 1;
                }
            }
        }

        if changed {
            self.redraw = true;
            Ok((ProgramCounterStep::Next, Operation::Draw))
        } else {
            Ok((ProgramCounterStep::Next, Operation::None))
        }
    }

    fn key(&self, opcode: &Keypad) -> Result<ProgramCounterStep, ProcessError> {
        let pressed = self.keyboard.is_pressed(self.registers[opcode.x]);
        let step = match opcode.ops {
            KeyOpcode::Pressed => ProgramCounterStep::cond(pressed),
            KeyOpcode::NotPressed => ProgramCounterStep::cond(!pressed),
        };
        Ok(step)
    }

    fn special(
        &mut self,
        opcode: &Special,
    ) -> Result<(ProgramCounterStep, Operation), ProcessError> {
        let x = opcode.x;
        let index = usize::from(self.index_register);

        match opcode.ops {
            SpecialOpcode::GetDelayTimer => {
                self.registers[x] = self.delay_timer.get_value();
            }
            SpecialOpcode::AwaitKeyPress => {
                if let Some(key) = self.keyboard.take_key() {
                    self.registers[x] = key as u8;
                } else {
                    // don't move on until the key press arrives
                    self.key_wait = Some(x);
                    return Ok((ProgramCounterStep::Hold, Operation::Wait));
                }
            }
            SpecialOpcode::SetDelayTimer => {
                self.delay_timer.set_value(self.registers[x]);
            }
            SpecialOpcode::SetSoundTimer => {
                self.sound_timer.set_value(self.registers[x]);
            }
            SpecialOpcode::AddVxToI => {
                self.index_register = self
                    .index_register
                    .wrapping_add(u16::from(self.registers[x]));
            }
            SpecialOpcode::SetIToSprite => {
                let character = usize::from(self.registers[x] & 0xF);
                self.index_register = (display::fontset::LOCATION
                    + display::fontset::CHARACTER_SIZE * character)
                    as u16;
            }
            SpecialOpcode::StoreBCD => {
                let r = self.registers[x];
                self.write_memory(index, r / 100); // 246u8 / 100 => 2
                self.write_memory(index + 1, r / 10 % 10); // 246u8 / 10 => 24 % 10 => 4
                self.write_memory(index + 2, r % 10); // 246u8 % 10 => 6
            }
            SpecialOpcode::StoreV0ToVx => {
                for i in 0..=x {
                    self.write_memory(index + i, self.registers[i]);
                }
            }
            SpecialOpcode::FillV0ToVx => {
                for i in 0..=x {
                    self.registers[i] = self.read_memory(index + i);
                }
            }
        }
        Ok((ProgramCounterStep::Next, Operation::None))
    }
}
