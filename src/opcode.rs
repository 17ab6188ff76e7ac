//! Opcode abstractions, decoding and the execution contract of the chip.
use std::convert::TryFrom;

use crate::{definitions::memory, OpcodeError, ProcessError};

/// the mask for the type nibble
pub(crate) const OPCODE_MASK_F000: u16 = 0xF000;

/// the mask for the address part
pub(crate) const OPCODE_MASK_0FFF: u16 = 0x0FFF;

/// the mask for the `X` nibble
pub(crate) const OPCODE_MASK_0F00: u16 = 0x0F00;

/// the mask for the `Y` nibble
pub(crate) const OPCODE_MASK_00F0: u16 = 0x00F0;

/// the mask for the last eight bits
pub(crate) const OPCODE_MASK_00FF: u16 = 0x00FF;

/// the mask for the last four bits
pub(crate) const OPCODE_MASK_000F: u16 = 0x000F;

/// the size of a nibble
const NIBBLE_SIZE: u16 = 0x4;

/// a wrapper type for u16 to make it clear what is meant to be used
pub type Opcode = u16;

/// will build an opcode from data and the given point
/// # Arguments
///
/// - `data` - A slice of u8 data entries used to generate the opcodes
/// - `pointer` - Where in the data the opcode shall be extracted, so `pointer` and `pointer + 1` make
/// the opcode up
///
/// # Example
/// ```rust
/// # use chip::opcode::*;
/// # use chip::OpcodeError;
///  const OPCODES: [Opcode; 2] = [0x00EE, 0x1EDA];
///  const SPLIT_OPCODE: [u8; 4] = [0x00, 0xEE, 0x1E, 0xDA];
///  for (i, val) in OPCODES.iter().enumerate() {
///      let opcode = build_opcode(&SPLIT_OPCODE, i * 2).expect("This will work.");
///      assert_eq!(opcode, *val);
///  }
/// # let pointer = 3;
/// # let err = OpcodeError::MemoryInvalid {pointer, len: SPLIT_OPCODE.len() };
/// # assert_eq!(Err(err), build_opcode(&SPLIT_OPCODE, pointer));
/// ```
pub fn build_opcode(data: &[u8], pointer: usize) -> Result<Opcode, OpcodeError> {
    match (data.get(pointer), data.get(pointer + 1)) {
        (Some(high), Some(low)) => Ok(Opcode::from_be_bytes([*high, *low])),
        _ => Err(OpcodeError::MemoryInvalid {
            pointer,
            len: data.len(),
        }),
    }
}

/// These are special traits used to filter out information
/// from opcodes
pub trait OpcodeTrait {
    /// the opcode type `T` of `TXYN`, already shifted down
    ///
    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    /// const BASE_OPCODE: Opcode = 0x1EDA;
    /// assert_eq!(BASE_OPCODE.t(), 0x1);
    /// ```
    fn t(&self) -> usize;

    /// the address `NNN` of `TNNN`
    ///
    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    /// const BASE_OPCODE: Opcode = 0x1EDA;
    /// assert_eq!(BASE_OPCODE.nnn(), 0xEDA);
    /// ```
    fn nnn(&self) -> usize;

    /// the register index `X` and the constant `NN` of `TXNN`
    ///
    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    /// const BASE_OPCODE: Opcode = 0x1EDA;
    /// assert_eq!(BASE_OPCODE.xnn(), (0xE, 0xDA));
    /// ```
    fn xnn(&self) -> (usize, u8);

    /// the register indexes `X`, `Y` and the last nibble `N` of `TXYN`
    ///
    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    /// const BASE_OPCODE: Opcode = 0x1EDA;
    /// assert_eq!(BASE_OPCODE.xyn(), (0xE, 0xD, 0xA));
    /// ```
    fn xyn(&self) -> (usize, usize, usize);

    /// the register index `X` of `TXNN`
    fn x(&self) -> usize;

    /// the register index `Y` of `TXYN`
    fn y(&self) -> usize;
}

impl OpcodeTrait for Opcode {
    fn t(&self) -> usize {
        ((self & OPCODE_MASK_F000) >> (3 * NIBBLE_SIZE)) as usize
    }

    fn nnn(&self) -> usize {
        (self & OPCODE_MASK_0FFF) as usize
    }

    fn xnn(&self) -> (usize, u8) {
        (self.x(), (self & OPCODE_MASK_00FF) as u8)
    }

    fn xyn(&self) -> (usize, usize, usize) {
        (self.x(), self.y(), (self & OPCODE_MASK_000F) as usize)
    }

    fn x(&self) -> usize {
        ((self & OPCODE_MASK_0F00) >> (2 * NIBBLE_SIZE)) as usize
    }

    fn y(&self) -> usize {
        ((self & OPCODE_MASK_00F0) >> NIBBLE_SIZE) as usize
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
/// Represents how the program counter moves after an opcode ran.
///
/// The program counter has already been moved past the current
/// opcode, before the opcode is executed.
pub enum ProgramCounterStep {
    /// Will continue with the next opcode
    Next,
    /// Will skip the next opcode
    Skip,
    /// Will stay on the current opcode, so that it is executed again
    Hold,
    /// Will simply move the program counter to the given location,
    /// wrapped into the memory.
    Jump(usize),
}

impl ProgramCounterStep {
    /// Will return a Skip if the condition is true.
    ///
    /// # Example
    /// ```rust
    /// # use chip::opcode::ProgramCounterStep;
    /// assert_eq!(ProgramCounterStep::Next, ProgramCounterStep::cond(false));
    /// assert_eq!(ProgramCounterStep::Skip, ProgramCounterStep::cond(true));
    /// ```
    #[inline]
    pub fn cond(cond: bool) -> Self {
        if cond {
            ProgramCounterStep::Skip
        } else {
            ProgramCounterStep::Next
        }
    }

    /// Applies the step to an already advanced program counter.
    ///
    /// # Example
    /// ```rust
    /// # use chip::opcode::ProgramCounterStep;
    /// assert_eq!(0x202, ProgramCounterStep::Next.apply(0x202));
    /// assert_eq!(0x204, ProgramCounterStep::Skip.apply(0x202));
    /// assert_eq!(0x200, ProgramCounterStep::Hold.apply(0x202));
    /// assert_eq!(0x002, ProgramCounterStep::Jump(0x1002).apply(0x202));
    /// ```
    #[inline]
    pub fn apply(&self, program_counter: usize) -> usize {
        let next = match *self {
            ProgramCounterStep::Next => program_counter,
            ProgramCounterStep::Skip => program_counter + memory::opcodes::SIZE,
            ProgramCounterStep::Hold => {
                program_counter.wrapping_sub(memory::opcodes::SIZE)
            }
            ProgramCounterStep::Jump(pointer) => pointer,
        };
        next & memory::ADDRESS_MASK
    }
}

#[inline]
fn err<T>(value: Opcode) -> Result<T, OpcodeError> {
    Err(OpcodeError::InvalidOpcode(value))
}

/// Generates the conversion from the opcode sub type nibble or byte
/// into the given sub opcode enum.
macro_rules! implTryFromSubOpcode {
    ($type_name:ty : $type_from:ty : $( $key:literal => $val:expr ),+ $(,)? ) => {
        impl $type_name {
            fn decode(sub: $type_from, value: Opcode) -> Result<Self, OpcodeError> {
                match sub {
                    $(
                        $key => Ok($val),
                    )+
                    _ => err(value),
                }
            }
        }
    };
}

/// Operands of the opcode type `TNNN`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address {
    pub nnn: usize,
}

impl From<Opcode> for Address {
    fn from(value: Opcode) -> Self {
        Self { nnn: value.nnn() }
    }
}

/// Operands of the opcode type `TXNN`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterConst {
    pub x: usize,
    pub nn: u8,
}

impl From<Opcode> for RegisterConst {
    fn from(value: Opcode) -> Self {
        let (x, nn) = value.xnn();
        Self { x, nn }
    }
}

/// Operands of the opcode type `TXY0`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterPair {
    pub x: usize,
    pub y: usize,
}

impl TryFrom<Opcode> for RegisterPair {
    type Error = OpcodeError;

    fn try_from(value: Opcode) -> Result<Self, Self::Error> {
        match value.xyn() {
            (x, y, 0) => Ok(Self { x, y }),
            _ => err(value),
        }
    }
}

/// Operands of the draw opcode `DXYN`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sprite {
    pub x: usize,
    pub y: usize,
    pub n: usize,
}

impl From<Opcode> for Sprite {
    fn from(value: Opcode) -> Self {
        let (x, y, n) = value.xyn();
        Self { x, y, n }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemOpcode {
    /// `00E0`
    Clear,
    /// `00EE`
    Return,
}

implTryFromSubOpcode!(SystemOpcode : Opcode :
    0x00E0 => SystemOpcode::Clear,
    0x00EE => SystemOpcode::Return,
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOpcode {
    Assign,
    Or,
    And,
    Xor,
    Add,
    Sub,
    ShiftRight,
    SubReverse,
    ShiftLeft,
}

implTryFromSubOpcode!(ArithmeticOpcode : usize :
    0x0 => ArithmeticOpcode::Assign,
    0x1 => ArithmeticOpcode::Or,
    0x2 => ArithmeticOpcode::And,
    0x3 => ArithmeticOpcode::Xor,
    0x4 => ArithmeticOpcode::Add,
    0x5 => ArithmeticOpcode::Sub,
    0x6 => ArithmeticOpcode::ShiftRight,
    0x7 => ArithmeticOpcode::SubReverse,
    0xE => ArithmeticOpcode::ShiftLeft,
);

/// Operands of the opcode type `8XYT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arithmetic {
    pub ops: ArithmeticOpcode,
    pub x: usize,
    pub y: usize,
}

impl TryFrom<Opcode> for Arithmetic {
    type Error = OpcodeError;

    fn try_from(value: Opcode) -> Result<Self, Self::Error> {
        let (x, y, n) = value.xyn();
        let ops = ArithmeticOpcode::decode(n, value)?;
        Ok(Self { ops, x, y })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOpcode {
    Pressed,
    NotPressed,
}

implTryFromSubOpcode!(KeyOpcode : u8 :
    0x9E => KeyOpcode::Pressed,
    0xA1 => KeyOpcode::NotPressed,
);

/// Operands of the opcode type `EXTT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keypad {
    pub ops: KeyOpcode,
    pub x: usize,
}

impl TryFrom<Opcode> for Keypad {
    type Error = OpcodeError;

    fn try_from(value: Opcode) -> Result<Self, Self::Error> {
        let (x, nn) = value.xnn();
        let ops = KeyOpcode::decode(nn, value)?;
        Ok(Self { ops, x })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialOpcode {
    GetDelayTimer,
    AwaitKeyPress,
    SetDelayTimer,
    SetSoundTimer,
    AddVxToI,
    SetIToSprite,
    StoreBCD,
    StoreV0ToVx,
    FillV0ToVx,
}

implTryFromSubOpcode!(SpecialOpcode : u8 :
    0x07 => SpecialOpcode::GetDelayTimer,
    0x0A => SpecialOpcode::AwaitKeyPress,
    0x15 => SpecialOpcode::SetDelayTimer,
    0x18 => SpecialOpcode::SetSoundTimer,
    0x1E => SpecialOpcode::AddVxToI,
    0x29 => SpecialOpcode::SetIToSprite,
    0x33 => SpecialOpcode::StoreBCD,
    0x55 => SpecialOpcode::StoreV0ToVx,
    0x65 => SpecialOpcode::FillV0ToVx,
);

/// Operands of the opcode type `FXTT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Special {
    pub ops: SpecialOpcode,
    pub x: usize,
}

impl TryFrom<Opcode> for Special {
    type Error = OpcodeError;

    fn try_from(value: Opcode) -> Result<Self, Self::Error> {
        let (x, nn) = value.xnn();
        let ops = SpecialOpcode::decode(nn, value)?;
        Ok(Self { ops, x })
    }
}

/// A fully decoded opcode, with all operands extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcodes {
    /// `00E0`, `00EE`
    System(SystemOpcode),
    /// `1NNN`
    Jump(Address),
    /// `2NNN`
    Call(Address),
    /// `3XNN`
    SkipEqualConst(RegisterConst),
    /// `4XNN`
    SkipNotEqualConst(RegisterConst),
    /// `5XY0`
    SkipEqualRegister(RegisterPair),
    /// `6XNN`
    SetConst(RegisterConst),
    /// `7XNN`
    AddConst(RegisterConst),
    /// `8XYT`
    Arithmetic(Arithmetic),
    /// `9XY0`
    SkipNotEqualRegister(RegisterPair),
    /// `ANNN`
    SetIndex(Address),
    /// `BNNN`
    JumpOffset(Address),
    /// `CXNN`
    Random(RegisterConst),
    /// `DXYN`
    Draw(Sprite),
    /// `EXTT`
    Key(Keypad),
    /// `FXTT`
    Special(Special),
}

impl TryFrom<Opcode> for Opcodes {
    type Error = OpcodeError;

    fn try_from(value: Opcode) -> Result<Self, Self::Error> {
        let res = match value.t() {
            0x0 => Opcodes::System(SystemOpcode::decode(value, value)?),
            0x1 => Opcodes::Jump(value.into()),
            0x2 => Opcodes::Call(value.into()),
            0x3 => Opcodes::SkipEqualConst(value.into()),
            0x4 => Opcodes::SkipNotEqualConst(value.into()),
            0x5 => Opcodes::SkipEqualRegister(RegisterPair::try_from(value)?),
            0x6 => Opcodes::SetConst(value.into()),
            0x7 => Opcodes::AddConst(value.into()),
            0x8 => Opcodes::Arithmetic(Arithmetic::try_from(value)?),
            0x9 => Opcodes::SkipNotEqualRegister(RegisterPair::try_from(value)?),
            0xA => Opcodes::SetIndex(value.into()),
            0xB => Opcodes::JumpOffset(value.into()),
            0xC => Opcodes::Random(value.into()),
            0xD => Opcodes::Draw(value.into()),
            0xE => Opcodes::Key(Keypad::try_from(value)?),
            0xF => Opcodes::Special(Special::try_from(value)?),
            _ => return err(value),
        };
        Ok(res)
    }
}

/// Represents a step of the program counter
/// this requires the enum ProgramCounterStep
/// to work.
pub trait ProgramCounter {
    /// will move the program counter by a step.
    fn advance(&mut self, step: ProgramCounterStep);
}

#[derive(Debug, PartialEq, Clone, Copy)]
/// Represents a command from the interpreter up to the host.
pub enum Operation {
    /// If no action has to be taken.
    None,
    /// If the host shall, wait
    /// for the next key press
    Wait,
    /// The display changed and should be redrawn
    Draw,
}

/// These are the traits that have to be fulfilled for a working opcode
/// table.
///
/// This trait requires the implementation of the [`ProgramCounter`](ProgramCounter) trait, as
/// every opcode reports how the program counter has to move on.
pub trait ChipOpcodes: ProgramCounter {
    /// will execute a single decoded opcode
    fn calc(&mut self, opcode: &Opcodes) -> Result<Operation, ProcessError> {
        let mut operation = Operation::None;
        let step_op = |(step, op): (ProgramCounterStep, Operation)| {
            operation = op;
            step
        };

        let step = match opcode {
            Opcodes::System(opcode) => self.system(opcode).map(step_op),
            Opcodes::Jump(opcode) => self.jump(opcode),
            Opcodes::Call(opcode) => self.call(opcode),
            Opcodes::SkipEqualConst(opcode) => self.skip_equal_const(opcode),
            Opcodes::SkipNotEqualConst(opcode) => self.skip_not_equal_const(opcode),
            Opcodes::SkipEqualRegister(opcode) => self.skip_equal_register(opcode),
            Opcodes::SetConst(opcode) => self.set_const(opcode),
            Opcodes::AddConst(opcode) => self.add_const(opcode),
            Opcodes::Arithmetic(opcode) => self.arithmetic(opcode),
            Opcodes::SkipNotEqualRegister(opcode) => self.skip_not_equal_register(opcode),
            Opcodes::SetIndex(opcode) => self.set_index(opcode),
            Opcodes::JumpOffset(opcode) => self.jump_offset(opcode),
            Opcodes::Random(opcode) => self.random(opcode),
            Opcodes::Draw(opcode) => self.draw(opcode).map(step_op),
            Opcodes::Key(opcode) => self.key(opcode),
            Opcodes::Special(opcode) => self.special(opcode).map(step_op),
        }?;

        self.advance(step);
        Ok(operation)
    }

    /// - `00E0` - Display  - `disp_clear()`        - Clears the screen.
    /// - `00EE` - Flow     - `return;`             - Returns from a subroutine.
    fn system(
        &mut self,
        opcode: &SystemOpcode,
    ) -> Result<(ProgramCounterStep, Operation), ProcessError>;

    /// - `1NNN` - Flow     - `goto NNN;`           - Jumps to address `NNN`.
    fn jump(&self, opcode: &Address) -> Result<ProgramCounterStep, ProcessError>;

    /// - `2NNN` - Flow     - `*(0xNNN)()`          - Calls subroutine at `NNN`.
    fn call(&mut self, opcode: &Address) -> Result<ProgramCounterStep, ProcessError>;

    /// - `3XNN` - Cond     - `if(Vx==NN)`          - Skips the next instruction if `VX` equals `NN`.
    fn skip_equal_const(&self, opcode: &RegisterConst) -> Result<ProgramCounterStep, ProcessError>;

    /// - `4XNN` - Cond     - `if(Vx!=NN)`          - Skips the next instruction if `VX` doesn't equal `NN`.
    fn skip_not_equal_const(
        &self,
        opcode: &RegisterConst,
    ) -> Result<ProgramCounterStep, ProcessError>;

    /// - `5XY0` - Cond     - `if(Vx==Vy)`          - Skips the next instruction if `VX` equals `VY`.
    fn skip_equal_register(&self, opcode: &RegisterPair)
        -> Result<ProgramCounterStep, ProcessError>;

    /// - `6XNN` - Const    - `Vx = NN`             - Sets `VX` to `NN`.
    fn set_const(&mut self, opcode: &RegisterConst) -> Result<ProgramCounterStep, ProcessError>;

    /// - `7XNN` - Const    - `Vx += NN`            - Adds `NN` to `VX`. (Carry flag is not changed)
    fn add_const(&mut self, opcode: &RegisterConst) -> Result<ProgramCounterStep, ProcessError>;

    /// A multiuse opcode base for type `8XYT` (T is a sub opcode)
    ///
    /// - `8XY0` - Assign   - `Vx=Vy`               - Sets `VX` to the value of `VY`.
    /// - `8XY1` - BitOp    - `Vx=Vx|Vy`            - Sets `VX` to `VX` or `VY`.
    /// - `8XY2` - BitOp    - `Vx=Vx&Vy`            - Sets `VX` to `VX` and `VY`.
    /// - `8XY3` - BitOp    - `Vx=Vx^Vy`            - Sets `VX` to `VX` xor `VY`.
    /// - `8XY4` - Math     - `Vx += Vy`            - Adds `VY` to `VX`. `VF` is set to `1` when there's a carry, and to `0` when there isn't.
    /// - `8XY5` - Math     - `Vx -= Vy`            - `VY` is subtracted from `VX`. `VF` is set to `0` when there's a borrow, and `1` when there isn't.
    /// - `8XY6` - BitOp    - `Vx>>=1`              - Stores the least significant bit of `VX` in `VF` and then shifts `VX` to the right by `1`.
    /// - `8XY7` - Math     - `Vx=Vy-Vx`            - Sets `VX` to `VY` minus `VX`. `VF` is set to `0` when there's a borrow, and `1` when there isn't.
    /// - `8XYE` - BitOp    - `Vx<<=1`              - Stores the most significant bit of `VX` in `VF` and then shifts `VX` to the left by `1`.
    fn arithmetic(&mut self, opcode: &Arithmetic) -> Result<ProgramCounterStep, ProcessError>;

    /// - `9XY0` - Cond     - `if(Vx!=Vy)`          - Skips the next instruction if `VX` doesn't equal `VY`.
    fn skip_not_equal_register(
        &self,
        opcode: &RegisterPair,
    ) -> Result<ProgramCounterStep, ProcessError>;

    /// - `ANNN` - MEM      - `I = NNN`             - Sets `I` to the address `NNN`.
    fn set_index(&mut self, opcode: &Address) -> Result<ProgramCounterStep, ProcessError>;

    /// - `BNNN` - Flow     - `PC=V0+NNN`           - Jumps to the address `NNN` plus `V0`.
    fn jump_offset(&self, opcode: &Address) -> Result<ProgramCounterStep, ProcessError>;

    /// - `CXNN` - Rand     - `Vx=rand()&NN`        - Sets `VX` to a random byte and `NN`.
    fn random(&mut self, opcode: &RegisterConst) -> Result<ProgramCounterStep, ProcessError>;

    /// - `DXYN` - Disp     - `draw(Vx,Vy,N)`       - Draws a sprite at coordinate `(VX, VY)` that has a width of `8` pixels and a height of `N` pixels. Each row of `8` pixels is read as bit-coded starting from memory location `I`; `I` value doesn’t change after the execution of this instruction. `VF` is set to `1` if any screen pixels are flipped from set to unset when the sprite is drawn, and to `0` if that doesn’t happen.
    fn draw(&mut self, opcode: &Sprite) -> Result<(ProgramCounterStep, Operation), ProcessError>;

    /// - `EX9E` - KeyOp    - `if(key()==Vx)`       - Skips the next instruction if the key stored in `VX` is pressed.
    /// - `EXA1` - KeyOp    - `if(key()!=Vx)`       - Skips the next instruction if the key stored in `VX` isn't pressed.
    fn key(&self, opcode: &Keypad) -> Result<ProgramCounterStep, ProcessError>;

    /// A multiuse opcode base for type `FXTT` (T is a sub opcode)
    ///
    /// - `FX07` - Timer    - `Vx = get_delay()`    - Sets `VX` to the value of the delay timer.
    /// - `FX0A` - KeyOp    - `Vx = get_key()`      - A key press is awaited, and then stored in `VX`.
    /// - `FX15` - Timer    - `delay_timer(Vx)`     - Sets the delay timer to `VX`.
    /// - `FX18` - Sound    - `sound_timer(Vx)`     - Sets the sound timer to `VX`.
    /// - `FX1E` - MEM      - `I +=Vx`              - Adds `VX` to `I`. `VF` is not affected.
    /// - `FX29` - MEM      - `I=sprite_addr[Vx]`   - Sets `I` to the location of the sprite for the character in `VX`.
    /// - `FX33` - BCD      - `set_BCD(Vx)`         - Stores the hundreds, tens and ones digit of `VX` at `I`, `I+1` and `I+2`.
    /// - `FX55` - MEM      - `reg_dump(Vx,&I)`     - Stores `V0` to `VX` (including `VX`) in memory starting at address `I`. `I` itself is left unmodified.
    /// - `FX65` - MEM      - `reg_load(Vx,&I)`     - Fills `V0` to `VX` (including `VX`) with values from memory starting at address `I`. `I` itself is left unmodified.
    fn special(&mut self, opcode: &Special)
        -> Result<(ProgramCounterStep, Operation), ProcessError>;
}
