// The eight gameboy buttons/direction keys are arranged in form of a 2x4 matrix. Select either button or direction
// keys by writing to this register, then read-out bit 0-3.
//
// FF00 - P1/JOYP - Joypad (R/W)
//
// Bit 7 - Not used
// Bit 6 - Not used
// Bit 5 - P15 Select Button Keys      (0=Select)
// Bit 4 - P14 Select Direction Keys   (0=Select)
// Bit 3 - P13 Input Down  or Start    (0=Pressed) (Read Only)
// Bit 2 - P12 Input Up    or Select   (0=Pressed) (Read Only)
// Bit 1 - P11 Input Left  or Button B (0=Pressed) (Read Only)
// Bit 0 - P10 Input Right or Button A (0=Pressed) (Read Only)
use super::intf::{Flag, Intf};
use super::memory::Memory;
use std::cell::RefCell;
use std::rc::Rc;

#[rustfmt::skip]
#[derive(Clone, Copy, Eq, PartialEq)]
pub enum JoypadKey {
    Right  = 0b0000_0001,
    Left   = 0b0000_0010,
    Up     = 0b0000_0100,
    Down   = 0b0000_1000,
    A      = 0b0001_0000,
    B      = 0b0010_0000,
    Select = 0b0100_0000,
    Start  = 0b1000_0000,
}

pub struct Joypad {
    intf: Rc<RefCell<Intf>>,
    // Low nibble holds the direction keys, high nibble the buttons. 1 means released.
    matrix: u8,
    select: u8,
}

impl Joypad {
    pub fn power_up(intf: Rc<RefCell<Intf>>) -> Self {
        Self { intf, matrix: 0xff, select: 0x30 }
    }
}

impl Joypad {
    pub fn keydown(&mut self, key: JoypadKey) {
        let mask = key as u8;
        let edge = self.matrix & mask != 0x00;
        self.matrix &= !mask;
        // The joypad interrupt fires on a high-to-low transition of a line whose group is selected.
        let selected = if mask & 0x0f != 0x00 { self.select & 0x10 == 0x00 } else { self.select & 0x20 == 0x00 };
        if edge && selected {
            self.intf.borrow_mut().hi(Flag::Joypad);
        }
    }

    pub fn keyup(&mut self, key: JoypadKey) {
        self.matrix |= key as u8;
    }
}

impl Memory for Joypad {
    fn get(&self, a: u16) -> u8 {
        assert_eq!(a, 0xff00);
        if self.select & 0x10 == 0x00 {
            return self.select | (self.matrix & 0x0f);
        }
        if self.select & 0x20 == 0x00 {
            return self.select | (self.matrix >> 4);
        }
        self.select | 0x0f
    }

    fn set(&mut self, a: u16, v: u8) {
        assert_eq!(a, 0xff00);
        // Only the two select bits are writable.
        self.select = v & 0x30;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joypad() -> Joypad {
        Joypad::power_up(Rc::new(RefCell::new(Intf::power_up())))
    }

    #[test]
    fn nothing_selected_reads_all_ones() {
        let mut j = joypad();
        j.set(0xff00, 0x30);
        j.keydown(JoypadKey::A);
        j.keydown(JoypadKey::Left);
        assert_eq!(j.get(0xff00) & 0x0f, 0x0f);
    }

    #[test]
    fn direction_nibble_reads_pressed_low() {
        let mut j = joypad();
        j.set(0xff00, 0x20); // bit 4 low: directions selected
        j.keydown(JoypadKey::Right);
        j.keydown(JoypadKey::Down);
        assert_eq!(j.get(0xff00) & 0x0f, 0b0110);
        j.keyup(JoypadKey::Right);
        assert_eq!(j.get(0xff00) & 0x0f, 0b0111);
    }

    #[test]
    fn button_nibble_reads_pressed_low() {
        let mut j = joypad();
        j.set(0xff00, 0x10); // bit 5 low: buttons selected
        j.keydown(JoypadKey::Start);
        assert_eq!(j.get(0xff00) & 0x0f, 0b0111);
    }

    #[test]
    fn select_bits_are_the_only_writable_bits() {
        let mut j = joypad();
        j.set(0xff00, 0xff);
        assert_eq!(j.get(0xff00), 0x30 | 0x0f);
    }

    #[test]
    fn press_on_selected_group_raises_interrupt() {
        let mut j = joypad();
        j.set(0xff00, 0x10);
        j.keydown(JoypadKey::B);
        assert_eq!(j.intf.borrow().data & 0x10, 0x10);
    }

    #[test]
    fn press_on_unselected_group_stays_silent() {
        let mut j = joypad();
        j.set(0xff00, 0x10);
        j.keydown(JoypadKey::Up);
        assert_eq!(j.intf.borrow().data, 0x00);
    }

    #[test]
    fn held_key_does_not_retrigger() {
        let mut j = joypad();
        j.set(0xff00, 0x20);
        j.keydown(JoypadKey::Up);
        j.intf.borrow_mut().data = 0x00;
        j.keydown(JoypadKey::Up);
        assert_eq!(j.intf.borrow().data, 0x00);
    }
}
