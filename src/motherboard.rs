use super::cartridge;
use super::cpu::Cpu;
use super::gpu::{SCREEN_H, SCREEN_W};
use super::joypad::JoypadKey;
use super::mmunit::Mmunit;

// An entire frame is 154 scanlines of 456 dots each at 4.194304 MHz.
pub const CYCLES_PER_FRAME: u32 = 70224;

pub struct MotherBoard {
    pub mmu: Mmunit,
    pub cpu: Cpu,
}

impl MotherBoard {
    // Build a machine around a rom image. The cartridge header decides which bank controller is fitted; an unknown
    // controller byte or a rom too short to carry a header is refused.
    pub fn power_up(rom: Vec<u8>) -> Result<Self, cartridge::Error> {
        Ok(Self {
            mmu: Mmunit::power_up(rom)?,
            cpu: Cpu::power_up(),
        })
    }

    // Emulate a single frame: run the cpu and let the peripherals consume each instruction's cycles until one frame
    // worth of time has passed. Input events must not be applied while this runs.
    pub fn update(&mut self) {
        let mut cycles = 0;
        while cycles < CYCLES_PER_FRAME {
            cycles += self.next();
        }
    }

    // One instruction (or interrupt dispatch), in clock cycles.
    fn next(&mut self) -> u32 {
        let cycles = self.cpu.next(&mut self.mmu) * 4;
        self.mmu.next(cycles);
        cycles
    }

    // The current frame as RGBA8888, row major, alpha fully opaque.
    pub fn frame(&self) -> Vec<u8> {
        let mut d = Vec::with_capacity(SCREEN_W * SCREEN_H * 4);
        for l in self.mmu.gpu.data.iter() {
            for w in l.iter() {
                d.extend_from_slice(w);
                d.push(0xff);
            }
        }
        d
    }

    // Apply button edges between frames. Releases go first so a key seen in both lists ends up pressed.
    pub fn set_buttons(&mut self, pressed: &[JoypadKey], released: &[JoypadKey]) {
        for k in released {
            self.mmu.joypad.keyup(*k);
        }
        for k in pressed {
            self.mmu.joypad.keydown(*k);
        }
    }

    pub fn title(&self) -> String {
        self.mmu.cartridge.title()
    }

    // Bytes written out the serial port since power up. Test roms report their verdict here.
    pub fn serial_output(&self) -> &[u8] {
        self.mmu.serial.output()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Memory;

    fn rom_with_program(program: &[u8]) -> Vec<u8> {
        let mut rom = vec![0x00; 0x8000];
        rom[0x0147] = 0x00;
        for (i, b) in b"FRAME TEST".iter().enumerate() {
            rom[0x0134 + i] = *b;
        }
        rom[0x0100..0x0100 + program.len()].copy_from_slice(program);
        rom
    }

    #[test]
    fn title_comes_from_the_header() {
        let mb = MotherBoard::power_up(rom_with_program(&[])).unwrap();
        assert_eq!(mb.title(), "FRAME TEST");
    }

    #[test]
    fn frame_is_rgba_with_opaque_alpha() {
        let mb = MotherBoard::power_up(rom_with_program(&[])).unwrap();
        let frame = mb.frame();
        assert_eq!(frame.len(), 160 * 144 * 4);
        assert!(frame.chunks(4).all(|p| p[3] == 0xff));
    }

    #[test]
    fn nop_loop_frame_ends_inside_the_jump() {
        // A nop sled into JR -2. One frame later the cpu must sit in the loop with no interrupt taken.
        let mut program = vec![0x00; 0x10];
        program[0x0e] = 0x18; // JR -2 at 0x010e
        program[0x0f] = 0xfe;
        let mut mb = MotherBoard::power_up(rom_with_program(&program)).unwrap();
        mb.update();
        assert_eq!(mb.cpu.reg.pc, 0x010e);
        assert!(mb.cpu.ime);
        // IE was never set so nothing may have been dispatched; the vblank request is simply pending.
        assert_eq!(mb.mmu.get(0xffff), 0x00);
    }

    #[test]
    fn frame_advances_exactly_one_vblank() {
        let program = vec![0x18, 0xfe]; // JR -2
        let mut mb = MotherBoard::power_up(rom_with_program(&program)).unwrap();
        mb.update();
        // After 70224 cycles the ppu is back near the top of the frame.
        let ly = mb.mmu.get(0xff44);
        assert!(ly < 3, "ly = {}", ly);
    }

    #[test]
    fn stack_round_trip_program() {
        // LD BC,1234h; PUSH BC; LD BC,0000h; POP BC; JR -2
        let program = vec![0x01, 0x34, 0x12, 0xc5, 0x01, 0x00, 0x00, 0xc1, 0x18, 0xfe];
        let mut mb = MotherBoard::power_up(rom_with_program(&program)).unwrap();
        mb.update();
        assert_eq!(mb.cpu.reg.get_bc(), 0x1234);
        assert_eq!(mb.cpu.reg.sp, 0xfffe);
    }

    #[test]
    fn vblank_interrupt_vectors_with_return_address_on_stack() {
        // LD A,01h; LD (FFFFh),A; EI; JR -2. The vblank at line 144 must dispatch to 0040h, clear the request bit and
        // leave the interrupted pc on the stack.
        let program = vec![0x3e, 0x01, 0xea, 0xff, 0xff, 0xfb, 0x18, 0xfe];
        let mut mb = MotherBoard::power_up(rom_with_program(&program)).unwrap();
        // Clear the power up request bits so the first dispatch is the fresh vblank.
        mb.mmu.set(0xff0f, 0x00);
        mb.update();
        assert_eq!(mb.cpu.reg.sp, 0xfffc);
        // The loop sits at 0x0106; its address was pushed high byte first.
        assert_eq!(mb.mmu.get(0xfffd), 0x01);
        assert_eq!(mb.mmu.get(0xfffc), 0x06);
        assert_eq!(mb.mmu.get(0xff0f) & 0x01, 0x00);
    }

    #[test]
    fn buttons_apply_between_frames() {
        let program = vec![0x18, 0xfe];
        let mut mb = MotherBoard::power_up(rom_with_program(&program)).unwrap();
        mb.mmu.set(0xff00, 0x20); // select directions
        mb.set_buttons(&[JoypadKey::Left], &[]);
        assert_eq!(mb.mmu.get(0xff00) & 0x0f, 0b1101);
        mb.set_buttons(&[], &[JoypadKey::Left]);
        assert_eq!(mb.mmu.get(0xff00) & 0x0f, 0b1111);
    }

    #[test]
    fn serial_output_is_captured() {
        // LD A,'O'; LD (FF01h),A; LD A,81h; LD (FF02h),A; JR -2
        let program = vec![0x3e, b'O', 0xea, 0x01, 0xff, 0x3e, 0x81, 0xea, 0x02, 0xff, 0x18, 0xfe];
        let mut mb = MotherBoard::power_up(rom_with_program(&program)).unwrap();
        mb.update();
        assert_eq!(mb.serial_output(), b"O");
    }
}
