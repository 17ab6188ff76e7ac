//! The pretty print implementation of the [`chipset`](super::ChipSet), a dump of the
//! whole machine state used for debugging.

use super::ChipSet;
use crate::definitions::cpu;
use once_cell::sync::Lazy;
use std::fmt;

/// The amount of entries printed per line
const HEX_PRINT_STEP: usize = 8;

const END_OF_LINE: char = '\n';
const INDENT_FILLAMENT: char = '\t';
const INDENT_SIZE: usize = 2;

/// Will add an indent post processing
fn indent_helper(text: &mut String, indent: usize) {
    for _ in 0..indent {
        text.push(INDENT_FILLAMENT);
    }
}

macro_rules! intformat {
    () => {
        // The formatted string will be 2 symbols for the prefix (0x)
        // and 4 for the rest long.
        "{:#06X}"
    };
}

/// The length of a single formatted integer
static INTEGER_LEN: Lazy<usize> = Lazy::new(|| {
    let mut string = String::new();
    // if something went wrong here panicking is correct.
    integer_print::formatter(&mut string, 0u8).unwrap();
    string.len()
});

/// The length of a formatted pointer range
static POINTER_LEN: Lazy<usize> = Lazy::new(|| {
    let mut line = String::with_capacity(20);
    pointer_print::formatter(&mut line, 0, 0).unwrap();
    line.len()
});

/// A line length (This is a bit bigger then the actual line will be)
static LENLINE: Lazy<usize> =
    Lazy::new(|| INDENT_SIZE + HEX_PRINT_STEP * (*INTEGER_LEN + 1) + 1 + *POINTER_LEN);

/// Handles all the printing of the pointer values.
mod pointer_print {
    use std::fmt::Write;

    /// will format the pointers according to definition
    pub(super) fn formatter(line: &mut String, from: usize, to: usize) -> std::fmt::Result {
        write!(line, concat!(intformat!(), " - ", intformat!(), " :"), from, to)
    }
}

/// handles printing of any and all integers.
mod integer_print {
    use super::{pointer_print, END_OF_LINE, HEX_PRINT_STEP};
    use num_traits::Unsigned;
    use std::fmt::{self, Write};

    /// will format all integer types
    pub(super) fn formatter<T>(line: &mut String, data: T) -> fmt::Result
    where
        T: fmt::UpperHex + Unsigned + Copy,
    {
        write!(line, intformat!(), data)
    }

    /// will pretty print all the integer data given
    pub(super) fn printer<T>(data: &[T], indent: usize) -> Result<String, fmt::Error>
    where
        T: fmt::UpperHex + Unsigned + Copy,
    {
        let mut res = String::with_capacity(*super::LENLINE * (data.len() / HEX_PRINT_STEP + 1));
        for (row, chunk) in data.chunks(HEX_PRINT_STEP).enumerate() {
            let from = row * HEX_PRINT_STEP;
            super::indent_helper(&mut res, indent);
            pointer_print::formatter(&mut res, from, from + chunk.len() - 1)?;

            for entry in chunk {
                res.push(' ');
                formatter(&mut res, *entry)?;
            }
            res.push(END_OF_LINE);
        }

        // Remove unneeded new line
        if res.ends_with(END_OF_LINE) {
            res.pop();
        }
        Ok(res)
    }
}

/// Handles the memory print, where rows of only zeros are folded together
mod memory_print {
    use super::{integer_print, pointer_print, END_OF_LINE, HEX_PRINT_STEP};
    use crate::{
        definitions::memory,
        opcode::{self, Opcode},
    };
    use once_cell::sync::Lazy;
    use std::fmt;

    /// The bytes that are shown in a single row
    const POINTER_INCREMENT: usize = HEX_PRINT_STEP * memory::opcodes::SIZE;
    /// The values that are used when there are at least two rows of zeros.
    const FILLER_BASE: &str = "...";

    /// Prepares the line that will be used, for rows of only zeros.
    static ZERO_FILLER: Lazy<String> = Lazy::new(|| {
        let mut formatted = String::new();
        // if there is an error here panicking is correct
        integer_print::formatter(&mut formatted, 0u16).unwrap();
        let length = formatted.len() * (HEX_PRINT_STEP - 2) + (HEX_PRINT_STEP - 1)
            - FILLER_BASE.len();
        let filler = " ".repeat(length / 2);
        format!("{0}{1}{2}{1}{0}", formatted, filler, FILLER_BASE)
    });

    /// a single row of opcodes (only in this context)
    struct Row {
        from: usize,
        to: usize,
        data: [Opcode; HEX_PRINT_STEP],
        only_null: bool,
    }

    impl Row {
        fn write(&self, res: &mut String) -> fmt::Result {
            pointer_print::formatter(res, self.from, self.to)?;
            res.push(' ');
            if self.only_null {
                res.push_str(&ZERO_FILLER);
                return Ok(());
            }
            for (i, entry) in self.data.iter().enumerate() {
                if i > 0 {
                    res.push(' ');
                }
                integer_print::formatter(res, *entry)?;
            }
            Ok(())
        }
    }

    /// will pretty print the content of the raw memory, the offset
    /// is calculated from the beginning of the memory block
    pub(super) fn printer(memory: &[u8], indent: usize) -> Result<String, fmt::Error> {
        let mut rows: Vec<Row> = Vec::with_capacity(memory.len() / POINTER_INCREMENT);

        for (index, chunk) in memory.chunks(POINTER_INCREMENT).enumerate() {
            let from = index * POINTER_INCREMENT;
            let mut row = Row {
                from,
                to: from + chunk.len() - 1,
                data: [0; HEX_PRINT_STEP],
                only_null: true,
            };

            for (i, entry) in row.data.iter_mut().enumerate() {
                // a short last row is padded with zeros
                *entry = opcode::build_opcode(chunk, i * memory::opcodes::SIZE).unwrap_or(0);
            }
            row.only_null = row.data.iter().all(|entry| *entry == 0);

            // merge with the previous row if both are empty
            if let Some(last) = rows.last_mut() {
                if row.only_null && last.only_null {
                    last.to = row.to;
                    continue;
                }
            }
            rows.push(row);
        }

        let mut res = String::with_capacity((*super::LENLINE + 1) * rows.len());
        for row in rows {
            super::indent_helper(&mut res, indent);
            row.write(&mut res)?;
            res.push(END_OF_LINE);
        }
        if res.ends_with(END_OF_LINE) {
            res.pop();
        }
        Ok(res)
    }
}

/// Handles all the boolean data types.
mod bool_print {
    use super::{pointer_print, END_OF_LINE, HEX_PRINT_STEP};

    /// a function to keep the correct format length
    fn formatter(message: &str) -> String {
        format!("{:<width$}", message, width = *super::INTEGER_LEN)
    }

    /// will pretty print all the boolean data given
    pub(super) fn printer(data: &[bool], indent: usize) -> Result<String, std::fmt::Error> {
        let mut res = String::with_capacity(*super::LENLINE * (data.len() / HEX_PRINT_STEP + 1));

        for (row, chunk) in data.chunks(HEX_PRINT_STEP).enumerate() {
            let from = row * HEX_PRINT_STEP;
            super::indent_helper(&mut res, indent);
            pointer_print::formatter(&mut res, from, from + chunk.len() - 1)?;

            let mut line = String::new();
            for value in chunk {
                line.push(' ');
                line.push_str(&formatter(if *value { "true" } else { "false" }));
            }
            res.push_str(line.trim_end());
            res.push(END_OF_LINE);
        }
        if res.ends_with(END_OF_LINE) {
            res.pop();
        }

        Ok(res)
    }
}

/// Formats a single integer value on its own indented line
fn single<T>(data: T) -> Result<String, fmt::Error>
where
    T: fmt::UpperHex + num_traits::Unsigned + Copy,
{
    let mut res = String::with_capacity(INDENT_SIZE + *INTEGER_LEN);
    indent_helper(&mut res, INDENT_SIZE);
    integer_print::formatter(&mut res, data)?;
    Ok(res)
}

impl fmt::Display for ChipSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let opc = single(self.opcode)?;
        let prc = single(self.program_counter)?;
        let idx = single(self.index_register)?;
        let dtm = single(self.delay_timer.get_value())?;
        let stm = single(self.sound_timer.get_value())?;

        let mem = memory_print::printer(&self.memory, INDENT_SIZE)?;
        let key = bool_print::printer(self.keyboard.get_keys(), INDENT_SIZE)?;

        // the stack is filled up, so that it always has the same size
        let mut stack = [0u16; cpu::stack::SIZE];
        stack[..self.stack.len()].copy_from_slice(&self.stack);
        let sta = integer_print::printer(&stack, INDENT_SIZE)?;

        let reg = integer_print::printer(&self.registers, INDENT_SIZE)?;

        write!(
            f,
            "Chipset {{\n\
                \tOpcode :\n{}\n\
                \tProgram Counter :\n{}\n\
                \tIndex Register :\n{}\n\
                \tDelay Timer :\n{}\n\
                \tSound Timer :\n{}\n\
                \tMemory :\n{}\n\
                \tKeyboard :\n{}\n\
                \tStack :\n{}\n\
                \tRegister :\n{}\n\
                }}",
            opc, prc, idx, dtm, stm, mem, key, sta, reg
        )
    }
}
