// As the gameboys 16 bit address bus offers only limited space for ROM and RAM addressing, many games are using
// Memory Bank Controllers (MBCs) to expand the available address space by bank switching. These MBC chips are located
// in the game cartridge (ie. not in the gameboy itself).
//
// The required (or preferred) MBC type is specified in the byte at 0147h of the ROM, as described in the cartridge
// header.
//
// Reference:
//   - http://gbdev.gg8.se/wiki/articles/The_Cartridge_Header
//   - http://gbdev.gg8.se/wiki/articles/Memory_Bank_Controllers
use super::memory::Memory;
use thiserror::Error;

const ROM_BANK_SIZE: usize = 0x4000;
const RAM_BANK_SIZE: usize = 0x2000;

#[derive(Debug, Error)]
pub enum Error {
    #[error("missing required information area which located at 0100-014f")]
    TruncatedHeader,
    #[error("unsupported cartridge type: 0x{code:02x}")]
    UnsupportedCartridgeType { code: u8 },
}

// The three supported controllers. They share the bank registers held in Cartridge; only the decoding of writes into
// the rom area differs between them.
enum Mbc {
    // A 32KB rom which occupies 0000-7FFF. No banking, no ram.
    RomOnly,
    // 0000-1FFF ram enable, 2000-3FFF rom bank (5 bits, 00h->01h and 20h/40h/60h translated up by one),
    // 4000-5FFF ram bank. The rom/ram mode select at 6000-7FFF is not modelled, the 2 bits always pick the ram bank.
    Mbc1,
    // Same register layout as MBC1 but the rom bank register takes a full 7 bit value with only 00h translated.
    // The RTC that real MBC3 carts carry is not modelled.
    Mbc3,
}

pub struct Cartridge {
    rom: Vec<u8>,
    ram: Vec<u8>,
    mbc: Mbc,
    rom_bank: usize,
    ram_bank: usize,
    ram_enable: bool,
}

impl Cartridge {
    pub fn power_up(rom: Vec<u8>) -> Result<Self, Error> {
        if rom.len() < 0x0150 {
            return Err(Error::TruncatedHeader);
        }
        let mbc = match rom[0x0147] {
            0x00 => Mbc::RomOnly,
            0x01..=0x03 => Mbc::Mbc1,
            0x0f..=0x13 => Mbc::Mbc3,
            code => return Err(Error::UnsupportedCartridgeType { code }),
        };
        let ram = match mbc {
            Mbc::RomOnly => Vec::new(),
            // Four 8KB banks cover every ram size the supported controllers can address.
            _ => vec![0x00; 4 * RAM_BANK_SIZE],
        };
        let cart = Self { rom, ram, mbc, rom_bank: 1, ram_bank: 0, ram_enable: false };
        rog::debugln!("Cartridge name is {}", cart.title());
        rog::debugln!("Cartridge type is {}", mbc_info(cart.rom[0x0147]));
        Ok(cart)
    }

    // Title of the game in UPPER CASE ASCII, located at 0134-0143. Shorter titles are padded with 00's.
    pub fn title(&self) -> String {
        self.rom[0x0134..=0x0143]
            .iter()
            .take_while(|b| **b != 0x00)
            .map(|b| *b as char)
            .collect()
    }

    fn write_rom(&mut self, a: u16, v: u8) {
        match self.mbc {
            Mbc::RomOnly => {}
            Mbc::Mbc1 => match a {
                0x0000..=0x1fff => self.ram_enable = v & 0x0f == 0x0a,
                0x2000..=0x3fff => self.rom_bank = translate_bank(v & 0x1f),
                0x4000..=0x5fff => self.ram_bank = (v & 0x03) as usize,
                _ => {}
            },
            Mbc::Mbc3 => match a {
                0x0000..=0x1fff => self.ram_enable = v & 0x0f == 0x0a,
                // The full 7 bits are taken as is; only 00h is translated here.
                0x2000..=0x3fff => {
                    self.rom_bank = match v & 0x7f {
                        0x00 => 0x01,
                        n => n as usize,
                    }
                }
                0x4000..=0x5fff => self.ram_bank = (v & 0x03) as usize,
                _ => {}
            },
        }
    }
}

// Bank numbers 00h, 20h, 40h and 60h can not be selected; the controller uses the following bank instead.
fn translate_bank(b: u8) -> usize {
    match b {
        0x00 | 0x20 | 0x40 | 0x60 => b as usize + 1,
        _ => b as usize,
    }
}

impl Memory for Cartridge {
    fn get(&self, a: u16) -> u8 {
        match a {
            0x0000..=0x3fff => self.rom[a as usize],
            0x4000..=0x7fff => self.rom[self.rom_bank * ROM_BANK_SIZE + a as usize - 0x4000],
            0xa000..=0xbfff => {
                if self.ram_enable && !self.ram.is_empty() {
                    self.ram[self.ram_bank * RAM_BANK_SIZE + a as usize - 0xa000]
                } else {
                    0xff
                }
            }
            _ => 0xff,
        }
    }

    fn set(&mut self, a: u16, v: u8) {
        match a {
            // The rom area is read only; writes drive the controller registers.
            0x0000..=0x7fff => self.write_rom(a, v),
            0xa000..=0xbfff => {
                if self.ram_enable && !self.ram.is_empty() {
                    self.ram[self.ram_bank * RAM_BANK_SIZE + a as usize - 0xa000] = v;
                }
            }
            _ => {}
        }
    }
}

// Readable form of the controller byte, for load time logging.
fn mbc_info(b: u8) -> &'static str {
    match b {
        0x00 => "ROM ONLY",
        0x01 => "MBC1",
        0x02 => "MBC1+RAM",
        0x03 => "MBC1+RAM+BATTERY",
        0x0f => "MBC3+TIMER+BATTERY",
        0x10 => "MBC3+TIMER+RAM+BATTERY",
        0x11 => "MBC3",
        0x12 => "MBC3+RAM",
        0x13 => "MBC3+RAM+BATTERY",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rom_with_type(code: u8, banks: usize) -> Vec<u8> {
        let mut rom = vec![0x00; banks * ROM_BANK_SIZE];
        rom[0x0147] = code;
        for (i, b) in b"POKEMON RED".iter().enumerate() {
            rom[0x0134 + i] = *b;
        }
        // Tag every bank so reads reveal which one is mapped.
        for bank in 0..banks {
            rom[bank * ROM_BANK_SIZE + 0x1000] = bank as u8;
        }
        rom
    }

    #[test]
    fn rejects_truncated_rom() {
        assert!(matches!(Cartridge::power_up(vec![0x00; 0x014f]), Err(Error::TruncatedHeader)));
    }

    #[test]
    fn rejects_unsupported_controller() {
        let rom = rom_with_type(0x05, 2);
        match Cartridge::power_up(rom) {
            Err(Error::UnsupportedCartridgeType { code }) => assert_eq!(code, 0x05),
            _ => panic!("expected unsupported cartridge type"),
        }
    }

    #[test]
    fn title_is_nul_trimmed() {
        let cart = Cartridge::power_up(rom_with_type(0x00, 2)).unwrap();
        assert_eq!(cart.title(), "POKEMON RED");
    }

    #[test]
    fn rom_only_ignores_writes() {
        let mut cart = Cartridge::power_up(rom_with_type(0x00, 2)).unwrap();
        cart.set(0x2000, 0x02);
        cart.set(0xa000, 0x55);
        assert_eq!(cart.get(0x5000), 0x01);
        assert_eq!(cart.get(0xa000), 0xff);
    }

    #[test]
    fn mbc1_switches_rom_banks() {
        let mut cart = Cartridge::power_up(rom_with_type(0x01, 4)).unwrap();
        assert_eq!(cart.get(0x5000), 0x01);
        cart.set(0x2000, 0x03);
        assert_eq!(cart.get(0x5000), 0x03);
        assert_eq!(cart.get(0x1000), 0x00);
    }

    #[test]
    fn mbc1_translates_bank_zero_to_one() {
        let mut cart = Cartridge::power_up(rom_with_type(0x01, 4)).unwrap();
        cart.set(0x2000, 0x00);
        assert_eq!(cart.get(0x5000), 0x01);
    }

    #[test]
    fn mbc1_ram_requires_enable() {
        let mut cart = Cartridge::power_up(rom_with_type(0x03, 2)).unwrap();
        cart.set(0xa010, 0x99);
        assert_eq!(cart.get(0xa010), 0xff);
        cart.set(0x0000, 0x0a);
        cart.set(0xa010, 0x99);
        assert_eq!(cart.get(0xa010), 0x99);
        cart.set(0x0000, 0x00);
        assert_eq!(cart.get(0xa010), 0xff);
    }

    #[test]
    fn mbc1_banks_ram() {
        let mut cart = Cartridge::power_up(rom_with_type(0x03, 2)).unwrap();
        cart.set(0x0000, 0x1a); // any value with low nibble Ah enables
        cart.set(0x4000, 0x00);
        cart.set(0xa000, 0x11);
        cart.set(0x4000, 0x02);
        cart.set(0xa000, 0x22);
        assert_eq!(cart.get(0xa000), 0x22);
        cart.set(0x4000, 0x00);
        assert_eq!(cart.get(0xa000), 0x11);
    }

    #[test]
    fn mbc3_takes_seven_bit_banks() {
        let mut cart = Cartridge::power_up(rom_with_type(0x11, 0x22)).unwrap();
        cart.set(0x2000, 0x21);
        assert_eq!(cart.get(0x5000), 0x21);
        // Unlike MBC1, bank 20h is directly addressable; only 00h is remapped.
        cart.set(0x2000, 0x20);
        assert_eq!(cart.get(0x5000), 0x20);
        cart.set(0x2000, 0x00);
        assert_eq!(cart.get(0x5000), 0x01);
    }
}
