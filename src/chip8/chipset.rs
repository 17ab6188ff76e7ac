use std::convert::TryFrom;

use {
    crate::{
        definitions::{cpu, display, keyboard, memory},
        devices::{DisplayCommands, Keyboard, KeyboardCommands},
        opcode::{ChipOpcodes, Opcode, Opcodes, Operation, ProgramCounter, ProgramCounterStep},
        timer::Timer,
        KeyError, LoadError, ProcessError, StackError,
    },
    rand::RngCore,
    tinyvec::ArrayVec,
};

/// The ChipSet struct represents the current state
/// of the system, it contains all the structures
/// needed for emulating an instance of the
/// Chip8 CPU.
pub struct ChipSet {
    /// all two bytes long and stored big-endian
    pub(super) opcode: Opcode,
    /// - `0x000-0x1FF` - Chip 8 interpreter (contains font set in emu)
    /// - `0x000-0x050` - Used for the built in `4x5` pixel font set (`0-F`)
    /// - `0x200-0xFFF` - Program ROM and work RAM
    pub(super) memory: Vec<u8>,
    /// `8-bit` data registers named `V0` to `VF`. The `VF` register doubles as a flag for some
    /// instructions; thus, it should be avoided. In an addition operation, `VF` is the carry flag,
    /// while in subtraction, it is the "no borrow" flag. In the draw instruction `VF` is set upon
    /// pixel collision.
    pub(super) registers: [u8; cpu::register::SIZE],
    /// The index for the register, this is a special register entry
    /// called index `I`
    pub(super) index_register: u16,
    /// The program counter is a CPU register in the computer processor which has the address of the
    /// next instruction to be executed from memory.
    pub(super) program_counter: usize,
    /// The stack is only used to store return addresses when subroutines are called. The original
    /// [RCA 1802](https://de.wikipedia.org/wiki/RCA1802) version allocated `48` bytes for up to
    /// `12` levels of nesting; modern implementations usually have more.
    /// (here we are using `16`)
    pub(super) stack: ArrayVec<[u16; cpu::stack::SIZE]>,
    /// Delay timer: This timer is intended to be used for timing the events of games. Its value
    /// can be set and read.
    pub(super) delay_timer: Timer,
    /// Sound timer: This timer is used for sound effects. When its value is nonzero, a beeping
    /// sound is made.
    pub(super) sound_timer: Timer,
    /// The graphics of the Chip 8 are black and white and the screen has a total of `2048` pixels
    /// `(64 x 32)`, stored row by row.
    pub(super) display: Vec<Vec<bool>>,
    /// Is set whenever the display changed, the host is responsible to reset it.
    pub(super) redraw: bool,
    pub(super) keyboard: Keyboard,
    /// The register that waits for the next key press (`FX0A`).
    pub(super) key_wait: Option<usize>,
    /// This stores the random number generator, used by the chipset.
    /// It is stored into the chipset, so as to enable simple mocking
    /// of the given type.
    pub(super) rng: Box<dyn RngCore + Send>,
}

impl Default for ChipSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ChipSet {
    /// will create a new chipset object, that has already been reset
    pub fn new() -> Self {
        Self::with_rng(Box::new(rand::rngs::OsRng))
    }

    /// will create a new chipset object using the given random number generator
    pub fn with_rng(rng: Box<dyn RngCore + Send>) -> Self {
        let mut chip = Self {
            opcode: 0,
            memory: vec![0; memory::SIZE],
            registers: [0; cpu::register::SIZE],
            index_register: 0,
            program_counter: cpu::PROGRAM_COUNTER,
            stack: ArrayVec::new(),
            delay_timer: Timer::default(),
            sound_timer: Timer::default(),
            display: vec![vec![false; display::WIDTH]; display::HEIGHT],
            redraw: false,
            keyboard: Keyboard::new(),
            key_wait: None,
            rng,
        };
        chip.reset();
        chip
    }

    /// Will bring the chip back into its initial state, only the fontset
    /// will be left in memory.
    pub fn reset(&mut self) {
        // initialize all the memory with 0
        self.memory.fill(0);

        // load fonts
        let fontset = display::fontset::LOCATION
            ..(display::fontset::LOCATION + display::fontset::FONTSET.len());
        self.memory[fontset].copy_from_slice(&display::fontset::FONTSET);

        self.opcode = 0;
        self.registers = [0; cpu::register::SIZE];
        self.index_register = 0;
        self.program_counter = cpu::PROGRAM_COUNTER;
        self.stack.clear();
        self.delay_timer.set_value(0);
        self.sound_timer.set_value(0);
        self.clear_display();
        self.redraw = false;
        self.keyboard.reset();
        self.key_wait = None;

        log::info!("chip has been reset");
    }

    /// Will write the program into memory, starting at the
    /// [`PROGRAM_COUNTER`](cpu::PROGRAM_COUNTER).
    ///
    /// Nothing is written if the program does not fit into memory.
    pub fn load(&mut self, rom: &[u8]) -> Result<(), LoadError> {
        if rom.len() > cpu::MAX_PROGRAM_SIZE {
            return Err(LoadError::RomTooLarge {
                size: rom.len(),
                max: cpu::MAX_PROGRAM_SIZE,
            });
        }

        // write the rom data into memory
        self.memory[cpu::PROGRAM_COUNTER..(cpu::PROGRAM_COUNTER + rom.len())]
            .copy_from_slice(rom);

        log::info!("loaded a program of {} bytes", rom.len());
        Ok(())
    }

    /// will get the next opcode from memory
    pub(super) fn set_opcode(&mut self) {
        let high = self.memory[self.program_counter];
        let low = self.memory[(self.program_counter + 1) & memory::ADDRESS_MASK];
        self.opcode = Opcode::from_be_bytes([high, low]);
    }

    /// will advance the program by a single step
    ///
    /// An unsupported opcode is reported as an error, but the program
    /// counter has already moved past it, so the program can simply
    /// be continued with the next step.
    pub fn step(&mut self) -> Result<Operation, ProcessError> {
        if let Some(x) = self.key_wait {
            return Ok(self.resume_key_wait(x));
        }

        // get next opcode
        self.set_opcode();
        self.increment_program_counter();

        let opcode = Opcodes::try_from(self.opcode).map_err(|err| {
            log::warn!("{}", err);
            err
        })?;
        log::debug!("opcode {:#06X} => {:?}", self.opcode, opcode);

        // run the opcode
        self.calc(&opcode)
    }

    /// Checks the keyboard for the waiting `FX0A` opcode.
    fn resume_key_wait(&mut self, x: usize) -> Operation {
        match self.keyboard.take_key() {
            Some(key) => {
                log::debug!("key {:#X} released the wait of V{:X}", key, x);
                self.registers[x] = key as u8;
                self.key_wait = None;
                self.increment_program_counter();
                Operation::None
            }
            None => Operation::Wait,
        }
    }

    /// Will move the program counter to the next opcode
    fn increment_program_counter(&mut self) {
        self.program_counter = (self.program_counter + memory::opcodes::SIZE) & memory::ADDRESS_MASK;
    }

    /// Will count down both timers by one, has to be called at
    /// [`HERTZ`](crate::definitions::timer::HERTZ) by the host.
    pub fn tick_timers(&mut self) {
        self.delay_timer.tick();
        self.sound_timer.tick();
    }

    /// Will write keyboard data into the internal keyboard representation.
    pub fn set_keyboard(&mut self, keys: &[bool]) {
        self.keyboard.set_mult(keys);
    }

    /// Will set the value of the given key
    pub fn set_key(&mut self, key: usize, to: bool) -> Result<(), KeyError> {
        self.keyboard.set_key(key, to)
    }

    /// Will toggle the given key
    pub fn toggle_key(&mut self, key: usize) -> Result<(), KeyError> {
        self.keyboard.toggle_key(key)
    }

    /// Will get the current state of the keyboard
    pub fn get_keyboard(&self) -> &[bool] {
        self.keyboard.get_keys()
    }

    /// Will copy the current keyboard state of the host into the chip.
    pub fn poll_keyboard<K: KeyboardCommands>(&mut self, keyboard: &K) {
        let keys = keyboard.get_keyboard();
        if keys.len() != keyboard::SIZE {
            log::warn!(
                "the host reported {} keys instead of {}",
                keys.len(),
                keyboard::SIZE
            );
        }
        self.set_keyboard(&keys);
    }

    /// Will hand the display to the host if it changed since the last time,
    /// returns if something was presented.
    pub fn present<D: DisplayCommands>(&mut self, display: &mut D) -> bool {
        if !self.redraw {
            return false;
        }

        if self.display.iter().flatten().any(|pixel| *pixel) {
            display.display(&self.display);
        } else {
            display.clear_display();
        }
        self.redraw = false;
        true
    }

    /// will return the sound timer
    pub fn get_sound_timer(&self) -> u8 {
        self.sound_timer.get_value()
    }

    /// Checks if a tone should currently be audible
    pub fn is_sound_active(&self) -> bool {
        self.sound_timer.is_active()
    }

    /// will return the delay timer
    pub fn get_delay_timer(&self) -> u8 {
        self.delay_timer.get_value()
    }

    /// Will return an immutable slice of the current display configuration
    pub fn get_display(&self) -> &[Vec<bool>] {
        &self.display[..]
    }

    /// Checks if the display changed since the host cleared the flag
    pub fn needs_redraw(&self) -> bool {
        self.redraw
    }

    /// Has to be called by the host, after it consumed the display
    pub fn clear_redraw(&mut self) {
        self.redraw = false;
    }

    pub fn get_registers(&self) -> &[u8] {
        &self.registers
    }

    pub fn get_index_register(&self) -> u16 {
        self.index_register
    }

    pub fn get_program_counter(&self) -> usize {
        self.program_counter
    }

    /// The last opcode that has been fetched
    pub fn get_opcode(&self) -> Opcode {
        self.opcode
    }

    /// All the return addresses currently on the stack, the last one is the top
    pub fn get_stack(&self) -> &[u16] {
        &self.stack
    }

    pub fn get_memory(&self) -> &[u8] {
        &self.memory
    }

    /// Checks if the chip is halted by a `FX0A` opcode
    pub fn is_waiting_for_key(&self) -> bool {
        self.key_wait.is_some()
    }

    /// Will turn off all the pixels
    pub(super) fn clear_display(&mut self) {
        for row in self.display.iter_mut() {
            row.fill(false);
        }
    }

    /// Reads the memory at the address, the address is wrapped into the memory
    pub(super) fn read_memory(&self, address: usize) -> u8 {
        self.memory[address & memory::ADDRESS_MASK]
    }

    /// Writes the memory at the address, the address is wrapped into the memory
    pub(super) fn write_memory(&mut self, address: usize, value: u8) {
        self.memory[address & memory::ADDRESS_MASK] = value;
    }

    /// Will push the pointer to the stack
    pub(super) fn push_stack(&mut self, pointer: usize) -> Result<(), StackError> {
        if self.stack.len() == self.stack.capacity() {
            log::error!("stack overflow while calling from {:#06X}", pointer);
            return Err(StackError::Full);
        }
        self.stack.push(pointer as u16);
        Ok(())
    }

    /// Will pop from the stack
    pub(super) fn pop_stack(&mut self) -> Result<usize, StackError> {
        match self.stack.pop() {
            Some(pointer) => Ok(usize::from(pointer)),
            None => {
                log::error!("stack underflow at {:#06X}", self.program_counter);
                Err(StackError::Empty)
            }
        }
    }
}

impl ProgramCounter for ChipSet {
    fn advance(&mut self, step: ProgramCounterStep) {
        self.program_counter = step.apply(self.program_counter);
        if let ProgramCounterStep::Jump(_) = step {
            log::debug!("pc {:#06X}", self.program_counter);
        }
    }
}

