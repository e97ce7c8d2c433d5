// The memory management unit has all memory references passed through itself, routing each address to the component
// that owns it and applying the write side effects of the I/O registers.
use super::cartridge::{self, Cartridge};
use super::gpu::Gpu;
use super::intf::Intf;
use super::joypad::Joypad;
use super::memory::Memory;
use super::serial::Serial;
use super::timer::Timer;
use std::cell::RefCell;
use std::rc::Rc;

pub struct Mmunit {
    pub cartridge: Cartridge,
    pub gpu: Gpu,
    pub joypad: Joypad,
    pub serial: Serial,
    pub timer: Timer,
    inte: u8,
    intf: Rc<RefCell<Intf>>,
    hram: [u8; 0x7f],
    wram: [u8; 0x2000],
}

impl Mmunit {
    pub fn power_up(rom: Vec<u8>) -> Result<Self, cartridge::Error> {
        let cart = Cartridge::power_up(rom)?;
        let intf = Rc::new(RefCell::new(Intf::power_up()));
        let mut r = Self {
            cartridge: cart,
            gpu: Gpu::power_up(intf.clone()),
            joypad: Joypad::power_up(intf.clone()),
            serial: Serial::power_up(intf.clone()),
            timer: Timer::power_up(intf.clone()),
            inte: 0x00,
            intf,
            hram: [0x00; 0x7f],
            wram: [0x00; 0x2000],
        };
        // Hardware registers hold these values once the boot rom has handed over control, so roms that skip the boot
        // sequence still start from a sane state.
        r.set(0xff05, 0x00);
        r.set(0xff06, 0x00);
        r.set(0xff07, 0x00);
        r.set(0xff0f, 0xe1);
        r.set(0xff40, 0x91);
        r.set(0xff42, 0x00);
        r.set(0xff43, 0x00);
        r.set(0xff45, 0x00);
        r.set(0xff47, 0xfc);
        r.set(0xff48, 0xff);
        r.set(0xff49, 0xff);
        r.set(0xff4a, 0x00);
        r.set(0xff4b, 0x00);
        Ok(r)
    }

    // Advance the peripherals by the cycles the last instruction took.
    pub fn next(&mut self, cycles: u32) {
        self.timer.next(cycles);
        self.gpu.next(cycles);
    }
}

impl Memory for Mmunit {
    fn get(&self, a: u16) -> u8 {
        match a {
            0x0000..=0x7fff => self.cartridge.get(a),
            0x8000..=0x9fff => self.gpu.get(a),
            0xa000..=0xbfff => self.cartridge.get(a),
            0xc000..=0xdfff => self.wram[a as usize - 0xc000],
            0xe000..=0xfdff => 0xff,
            0xfe00..=0xfe9f => self.gpu.get(a),
            0xfea0..=0xfeff => 0xff,
            0xff00 => self.joypad.get(a),
            0xff01..=0xff02 => self.serial.get(a),
            0xff04..=0xff07 => self.timer.get(a),
            0xff0f => self.intf.borrow().data,
            0xff40..=0xff45 | 0xff47..=0xff4b => self.gpu.get(a),
            0xff80..=0xfffe => self.hram[a as usize - 0xff80],
            0xffff => self.inte,
            _ => 0xff,
        }
    }

    fn set(&mut self, a: u16, v: u8) {
        match a {
            0x0000..=0x7fff => self.cartridge.set(a, v),
            0x8000..=0x9fff => self.gpu.set(a, v),
            0xa000..=0xbfff => self.cartridge.set(a, v),
            0xc000..=0xdfff => self.wram[a as usize - 0xc000] = v,
            0xe000..=0xfdff => {}
            0xfe00..=0xfe9f => self.gpu.set(a, v),
            0xfea0..=0xfeff => {}
            0xff00 => self.joypad.set(a, v),
            0xff01..=0xff02 => self.serial.set(a, v),
            0xff04..=0xff07 => self.timer.set(a, v),
            0xff0f => self.intf.borrow_mut().data = v,
            0xff46 => {
                // Writing to this register launches a DMA transfer from ROM or RAM to OAM memory (sprite attribute
                // table). The copy happens in one go.
                // See: http://gbdev.gg8.se/wiki/articles/Video_Display#FF46_-_DMA_-_DMA_Transfer_and_Start_Address_.28R.2FW.29
                let base = u16::from(v) << 8;
                for i in 0..0xa0 {
                    let b = self.get(base + i);
                    self.set(0xfe00 + i, b);
                }
            }
            0xff40..=0xff45 | 0xff47..=0xff4b => self.gpu.set(a, v),
            0xff80..=0xfffe => self.hram[a as usize - 0xff80] = v,
            0xffff => self.inte = v,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rom() -> Vec<u8> {
        let mut rom = vec![0x00; 0x8000];
        rom[0x0147] = 0x00;
        rom
    }

    fn mmu() -> Mmunit {
        Mmunit::power_up(rom()).unwrap()
    }

    #[test]
    fn power_up_preloads_io_registers() {
        let m = mmu();
        assert_eq!(m.get(0xff40), 0x91);
        assert_eq!(m.get(0xff47), 0xfc);
        assert_eq!(m.get(0xff0f), 0xe1);
        assert_eq!(m.get(0xffff), 0x00);
    }

    #[test]
    fn wram_and_hram_are_writable() {
        let mut m = mmu();
        m.set(0xc000, 0x12);
        m.set(0xdfff, 0x34);
        m.set(0xff80, 0x56);
        m.set(0xfffe, 0x78);
        assert_eq!(m.get(0xc000), 0x12);
        assert_eq!(m.get(0xdfff), 0x34);
        assert_eq!(m.get(0xff80), 0x56);
        assert_eq!(m.get(0xfffe), 0x78);
    }

    #[test]
    fn echo_and_unusable_regions_read_ff() {
        let mut m = mmu();
        m.set(0xe000, 0x42);
        m.set(0xfea0, 0x42);
        assert_eq!(m.get(0xe000), 0xff);
        assert_eq!(m.get(0xfdff), 0xff);
        assert_eq!(m.get(0xfea0), 0xff);
        assert_eq!(m.get(0xfeff), 0xff);
    }

    #[test]
    fn rom_writes_reach_the_controller_not_the_rom() {
        let mut m = mmu();
        m.set(0x0000, 0x0a);
        assert_eq!(m.get(0x0000), 0x00);
    }

    #[test]
    fn div_write_resets_counter() {
        let mut m = mmu();
        m.next(256 * 7);
        assert_eq!(m.get(0xff04), 7);
        m.set(0xff04, 0x55);
        assert_eq!(m.get(0xff04), 0);
        m.next(256);
        assert_eq!(m.get(0xff04), 1);
    }

    #[test]
    fn dma_copies_160_bytes_into_oam() {
        let mut m = mmu();
        for i in 0..0xa0u16 {
            m.set(0xc000 + i, i as u8);
        }
        m.set(0xff46, 0xc0);
        assert_eq!(m.get(0xfe00), 0x00);
        assert_eq!(m.get(0xfe42), 0x42);
        assert_eq!(m.get(0xfe9f), 0x9f);
    }

    #[test]
    fn interrupt_enable_and_flag_round_trip() {
        let mut m = mmu();
        m.set(0xffff, 0x1f);
        m.set(0xff0f, 0x04);
        assert_eq!(m.get(0xffff), 0x1f);
        assert_eq!(m.get(0xff0f), 0x04);
    }

    #[test]
    fn unmapped_io_reads_ff() {
        let mut m = mmu();
        m.set(0xff7f, 0x12);
        assert_eq!(m.get(0xff7f), 0xff);
        assert_eq!(m.get(0xff4d), 0xff);
    }

    #[test]
    fn word_helpers_are_little_endian() {
        let mut m = mmu();
        m.set_word(0xc100, 0xbeef);
        assert_eq!(m.get(0xc100), 0xef);
        assert_eq!(m.get(0xc101), 0xbe);
        assert_eq!(m.get_word(0xc100), 0xbeef);
    }
}
