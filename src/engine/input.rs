use sdl2::event::Event;
use sdl2::keyboard::Scancode;
use sdl2::EventPump;

/// Window events drained once per frame. Only close requests matter here.
pub struct InputState {
    pub quit: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self { quit: false }
    }

    pub fn update(&mut self, event_pump: &mut EventPump) {
        for event in event_pump.poll_iter() {
            self.handle(&event);
        }
    }

    fn handle(&mut self, event: &Event) {
        match event {
            Event::Quit { .. }
            | Event::KeyDown {
                scancode: Some(Scancode::Escape),
                ..
            } => self.quit = true,
            _ => {}
        }
    }
}
