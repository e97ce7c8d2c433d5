// The five interrupt sources, as their bit masks in IE (FFFF) and IF (FF0F). A source is dispatched once its bit is
// set in both registers while the master enable is on; the IF bit is how a peripheral signals the cpu.
#[rustfmt::skip]
#[derive(Clone, Copy)]
pub enum Flag {
    VBlank  = 0b0000_0001, // INT 40h
    LCDStat = 0b0000_0010, // INT 48h
    Timer   = 0b0000_0100, // INT 50h
    Serial  = 0b0000_1000, // INT 58h
    Joypad  = 0b0001_0000, // INT 60h
}

// The pending-request latch behind FF0F. Every peripheral that can interrupt holds a handle to this one value and
// raises bits into it; the bus exposes it as a plain byte. Bits are only ever cleared through the bus (a rom write
// or the cpu acknowledging a dispatch), never from here.
pub struct Intf {
    pub data: u8,
}

impl Intf {
    pub fn power_up() -> Self {
        Self { data: 0x00 }
    }

    pub fn hi(&mut self, flag: Flag) {
        self.data |= flag as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raising_requests_accumulates_bits() {
        let mut i = Intf::power_up();
        i.hi(Flag::VBlank);
        i.hi(Flag::Timer);
        assert_eq!(i.data, 0b0000_0101);
        i.hi(Flag::Timer);
        assert_eq!(i.data, 0b0000_0101);
    }

    #[test]
    fn masks_line_up_with_the_dispatch_vectors() {
        // The cpu turns a pending bit into its handler address as 0040h + 8 * bit index.
        let table = [
            (Flag::VBlank, 0x0040u16),
            (Flag::LCDStat, 0x0048),
            (Flag::Timer, 0x0050),
            (Flag::Serial, 0x0058),
            (Flag::Joypad, 0x0060),
        ];
        for (flag, vector) in table.iter() {
            let index = (*flag as u8).trailing_zeros() as u16;
            assert_eq!(0x0040 + 8 * index, *vector);
        }
    }
}
