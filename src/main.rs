#[cfg(feature = "gui")]
fn main() {
    use dmg::gpu::{SCREEN_H, SCREEN_W};
    use dmg::joypad::JoypadKey;
    use dmg::motherboard::MotherBoard;

    rog::reg("dmg");
    rog::reg("dmg::cartridge");

    let mut rom = String::from("");
    let mut c_scale = 2;
    {
        let mut ap = argparse::ArgumentParser::new();
        ap.set_description("DMG emulator");
        ap.refer(&mut c_scale).add_option(
            &["-x", "--scale-factor"],
            argparse::Store,
            "Scale the video by a factor of 1, 2, 4, or 8",
        );
        ap.refer(&mut rom).add_argument("rom", argparse::Store, "Rom name");
        ap.parse_args_or_exit();
    }

    let rom = std::fs::read(&rom).unwrap();
    let mut mbrd = match MotherBoard::power_up(rom) {
        Ok(mbrd) => mbrd,
        Err(e) => {
            rog::println!("{}", e);
            std::process::exit(1);
        }
    };

    let mut option = minifb::WindowOptions::default();
    option.resize = true;
    option.scale = match c_scale {
        1 => minifb::Scale::X1,
        2 => minifb::Scale::X2,
        4 => minifb::Scale::X4,
        8 => minifb::Scale::X8,
        _ => panic!("Supported scale: 1, 2, 4 or 8"),
    };
    let rom_name = mbrd.title();
    let mut window = minifb::Window::new(format!("DMG - {}", rom_name).as_str(), SCREEN_W, SCREEN_H, option).unwrap();
    let mut window_buffer = vec![0x00; SCREEN_W * SCREEN_H];
    window.update_with_buffer(window_buffer.as_slice()).unwrap();

    let keys = [
        (minifb::Key::Right, JoypadKey::Right),
        (minifb::Key::Up, JoypadKey::Up),
        (minifb::Key::Left, JoypadKey::Left),
        (minifb::Key::Down, JoypadKey::Down),
        (minifb::Key::Z, JoypadKey::A),
        (minifb::Key::X, JoypadKey::B),
        (minifb::Key::Space, JoypadKey::Select),
        (minifb::Key::Enter, JoypadKey::Start),
    ];

    loop {
        if !window.is_open() || window.is_key_down(minifb::Key::Escape) {
            break;
        }

        // Collect key edges, then run exactly one frame.
        let mut pressed = Vec::new();
        let mut released = Vec::new();
        for (rk, vk) in keys.iter() {
            if window.is_key_down(*rk) {
                pressed.push(*vk);
            } else {
                released.push(*vk);
            }
        }
        mbrd.set_buttons(&pressed, &released);
        mbrd.update();

        let frame = mbrd.frame();
        for (i, w) in frame.chunks(4).enumerate() {
            let r = u32::from(w[0]) << 16;
            let g = u32::from(w[1]) << 8;
            let b = u32::from(w[2]);
            window_buffer[i] = 0xff00_0000 | r | g | b;
        }
        window.update_with_buffer(window_buffer.as_slice()).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(16));
    }
}

#[cfg(not(feature = "gui"))]
fn main() {}
