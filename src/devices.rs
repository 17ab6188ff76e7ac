use crate::{definitions::keyboard, KeyError};

#[cfg_attr(test, mockall::automock)]
/// The traits responsible for the display based code
pub trait DisplayCommands {
    /// Will clear the display
    fn clear_display(&mut self);
    /// Will display all from the pixels, given as rows of
    /// [`WIDTH`](crate::definitions::display::WIDTH) entries
    fn display(&mut self, pixels: &[Vec<bool>]);
}

#[cfg_attr(test, mockall::automock)]
/// The trait responsible for reading the keyboard data from the host
pub trait KeyboardCommands {
    fn get_keyboard(&self) -> Vec<bool>;
}

/// Will represent the last set key with the previous
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key {
    index: usize,
    last: bool,
    current: bool,
}

impl Key {
    fn new(index: usize, last: bool, current: bool) -> Self {
        Self {
            index,
            last,
            current,
        }
    }

    pub fn get_index(&self) -> usize {
        self.index
    }

    pub fn get_last(&self) -> bool {
        self.last
    }

    pub fn get_current(&self) -> bool {
        self.current
    }

    /// Checks if the key went down with this change
    pub fn is_press(&self) -> bool {
        !self.last && self.current
    }
}

/// Will store the last change to the given keyboard
/// and represent the internal keyboard as well
///
/// Input is done with a hex keyboard that has 16 keys ranging `0-F`. The `8`, `4`, `6`, and
/// `2` keys are typically used for directional input. Three opcodes are used to detect input.
/// One skips an instruction if a specific key is pressed, while another does the same if a
/// specific key is not pressed. The third waits for a key press, and then stores it in one of
/// the data registers.
#[derive(Default, Debug, Clone)]
pub struct Keyboard {
    keys: [bool; keyboard::SIZE],
    last: Option<Key>,
    /// Keys that already answered a key wait, they can't answer another one until released.
    consumed: [bool; keyboard::SIZE],
}

impl Keyboard {
    pub fn new() -> Self {
        Keyboard::default()
    }

    /// Releases all keys and forgets the last change.
    pub fn reset(&mut self) {
        self.keys = [false; keyboard::SIZE];
        self.last = None;
        self.consumed = [false; keyboard::SIZE];
    }

    pub fn toggle_key(&mut self, key: usize) -> Result<(), KeyError> {
        let to = !*self.keys.get(key).ok_or(KeyError::InvalidKey(key))?;
        self.set_key(key, to)
    }

    /// Overwrites the state of a single key, all the other keys keep their state.
    pub fn set_key(&mut self, key: usize, to: bool) -> Result<(), KeyError> {
        let entry = self.keys.get_mut(key).ok_or(KeyError::InvalidKey(key))?;

        // setup last
        self.last = Some(Key::new(key, *entry, to));

        // write back solution
        *entry = to;
        self.release_consumed();
        Ok(())
    }

    /// Overwrites the whole keyboard, entries past the
    /// [`SIZE`](crate::definitions::keyboard::SIZE) are ignored.
    pub fn set_mult(&mut self, keys: &[bool]) {
        for (key, to) in self.keys.iter_mut().zip(keys) {
            *key = *to;
        }
        self.last = None;
        self.release_consumed();
    }

    /// Forgets the consumed keys once they are no longer held down.
    fn release_consumed(&mut self) {
        for (consumed, pressed) in self.consumed.iter_mut().zip(self.keys.iter()) {
            *consumed &= *pressed;
        }
    }

    pub fn get_keys(&self) -> &[bool] {
        &self.keys
    }

    pub fn get_last(&self) -> Option<Key> {
        self.last
    }

    /// Checks the key with the given hex value, only the lowest nibble is used.
    pub fn is_pressed(&self, key: u8) -> bool {
        self.keys[usize::from(key & 0xF)]
    }

    /// Returns the key that should answer a key wait, without consuming it.
    ///
    /// A freshly pressed key wins if it is still held down, otherwise the lowest pressed one.
    /// Consumed keys are skipped until they were released.
    pub fn pressed_key(&self) -> Option<usize> {
        let available = |key: usize| self.keys[key] && !self.consumed[key];
        match self.last {
            Some(key) if key.is_press() && available(key.get_index()) => Some(key.get_index()),
            _ => (0..keyboard::SIZE).find(|key| available(*key)),
        }
    }

    /// Answers a key wait, the returned key has to be released before it can answer
    /// the next one.
    pub fn take_key(&mut self) -> Option<usize> {
        let key = self.pressed_key()?;
        self.consumed[key] = true;
        Some(key)
    }
}
