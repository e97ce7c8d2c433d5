// The timer in the GameBoy has a selectable frequency of 4096, 16384, 65536, or 262144 Hertz. This frequency
// increments the Timer Counter (TIMA). When it overflows, it generates an interrupt and is loaded with the contents
// of Timer Modulo (TMA). Independently of that, the Divider Register (DIV) always counts at 16384 Hz.
//
// See: http://gbdev.gg8.se/wiki/articles/Timer_and_Divider_Registers
use super::clock::Clock;
use super::intf::{Flag, Intf};
use super::memory::Memory;
use std::cell::RefCell;
use std::rc::Rc;

pub struct Timer {
    intf: Rc<RefCell<Intf>>,
    // This register is incremented at a rate of 16384Hz, one tick per 256 cycles. Writing any value to this register
    // resets it to 00h.
    div: u8,
    // This timer is incremented by a clock frequency specified by the TAC register (FF07). When the value overflows
    // it is reset to the value specified in TMA (FF06) and an interrupt is requested.
    tima: u8,
    tma: u8,
    // Bit  2   - Timer Enable
    // Bits 1-0 - Input Clock Select
    //            00: CPU Clock / 1024 (  4096 Hz)
    //            01: CPU Clock / 16   (262144 Hz)
    //            10: CPU Clock / 64   ( 65536 Hz)
    //            11: CPU Clock / 256  ( 16384 Hz)
    tac: u8,
    div_clock: Clock,
    tima_clock: Clock,
}

impl Timer {
    pub fn power_up(intf: Rc<RefCell<Intf>>) -> Self {
        Self {
            intf,
            div: 0x00,
            tima: 0x00,
            tma: 0x00,
            tac: 0x00,
            div_clock: Clock::power_up(256),
            tima_clock: Clock::power_up(1024),
        }
    }

    pub fn next(&mut self, cycles: u32) {
        // DIV runs whether or not the timer is enabled.
        self.div = self.div.wrapping_add(self.div_clock.next(cycles) as u8);

        if self.tac & 0x04 != 0x00 {
            for _ in 0..self.tima_clock.next(cycles) {
                self.tima = self.tima.wrapping_add(1);
                if self.tima == 0x00 {
                    self.tima = self.tma;
                    self.intf.borrow_mut().hi(Flag::Timer);
                }
            }
        }
    }

    fn period(tac: u8) -> u32 {
        match tac & 0x03 {
            0x00 => 1024,
            0x01 => 16,
            0x02 => 64,
            _ => 256,
        }
    }
}

impl Memory for Timer {
    fn get(&self, a: u16) -> u8 {
        match a {
            0xff04 => self.div,
            0xff05 => self.tima,
            0xff06 => self.tma,
            0xff07 => self.tac,
            _ => panic!("Unsupported timer address 0x{:04x}", a),
        }
    }

    fn set(&mut self, a: u16, v: u8) {
        match a {
            // Any write clears DIV together with its prescaler.
            0xff04 => {
                self.div = 0x00;
                self.div_clock.reset();
            }
            0xff05 => self.tima = v,
            0xff06 => self.tma = v,
            0xff07 => {
                let period = Self::period(v);
                if self.tima_clock.period != period {
                    self.tima_clock.period = period;
                    self.tima_clock.reset();
                }
                self.tac = v;
            }
            _ => panic!("Unsupported timer address 0x{:04x}", a),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer() -> Timer {
        Timer::power_up(Rc::new(RefCell::new(Intf::power_up())))
    }

    #[test]
    fn div_increments_every_256_cycles() {
        let mut t = timer();
        t.next(255);
        assert_eq!(t.get(0xff04), 0);
        t.next(1);
        assert_eq!(t.get(0xff04), 1);
        t.next(256 * 3);
        assert_eq!(t.get(0xff04), 4);
    }

    #[test]
    fn div_write_resets_count_and_prescaler() {
        let mut t = timer();
        t.next(500);
        assert_eq!(t.get(0xff04), 1);
        t.set(0xff04, 0xab);
        assert_eq!(t.get(0xff04), 0);
        // The partial 244 cycles accumulated before the write are gone.
        t.next(255);
        assert_eq!(t.get(0xff04), 0);
        t.next(1);
        assert_eq!(t.get(0xff04), 1);
    }

    #[test]
    fn tima_counts_only_when_enabled() {
        let mut t = timer();
        t.next(100_000);
        assert_eq!(t.get(0xff05), 0);
        t.set(0xff07, 0x05); // enable, 262144 Hz
        t.next(16 * 10);
        assert_eq!(t.get(0xff05), 10);
    }

    #[test]
    fn tima_overflow_reloads_tma_and_requests_interrupt() {
        let mut t = timer();
        t.set(0xff06, 0x42);
        t.set(0xff05, 0xff);
        t.set(0xff07, 0x05);
        t.next(16);
        assert_eq!(t.get(0xff05), 0x42);
        assert_eq!(t.intf.borrow().data & 0x04, 0x04);
    }

    #[test]
    fn tac_frequency_change_resets_prescaler() {
        let mut t = timer();
        t.set(0xff07, 0x04); // enable, 4096 Hz
        t.next(1000);
        // Switching the input clock drops the 1000 accumulated cycles.
        t.set(0xff07, 0x06); // enable, 65536 Hz
        t.next(63);
        assert_eq!(t.get(0xff05), 0);
        t.next(1);
        assert_eq!(t.get(0xff05), 1);
    }

    #[test]
    fn tac_rewrite_with_same_frequency_keeps_prescaler() {
        let mut t = timer();
        t.set(0xff07, 0x04);
        t.next(1000);
        t.set(0xff07, 0x04);
        t.next(24);
        assert_eq!(t.get(0xff05), 1);
    }
}
