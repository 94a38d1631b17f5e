//! WS2812 LED ring driver.
//!
//! Renders an indicator [`Directive`] into a per-pixel buffer and pushes
//! it to the ring with global brightness scaling.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: streams the buffer over an RMT channel.
//! On host/test: keeps the buffer in memory only.

use heapless::Vec;
use smart_leds::{RGB8, brightness};

#[cfg(target_os = "espidf")]
use smart_leds::SmartLedsWrite;
#[cfg(target_os = "espidf")]
use ws2812_esp32_rmt_driver::Ws2812Esp32Rmt;

use crate::indicator::{Directive, Rgb};

/// Largest ring the pixel buffer can hold.
pub const MAX_LEDS: usize = 64;

pub struct LedRing {
    pixels: Vec<RGB8, MAX_LEDS>,
    brightness: u8,
    shown: Option<Directive>,
    #[cfg(target_os = "espidf")]
    driver: Ws2812Esp32Rmt<'static>,
}

impl LedRing {
    #[cfg(target_os = "espidf")]
    pub fn new(count: u8, brightness: u8, driver: Ws2812Esp32Rmt<'static>) -> Self {
        Self {
            pixels: Self::dark(count),
            brightness,
            shown: None,
            driver,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(count: u8, brightness: u8) -> Self {
        Self {
            pixels: Self::dark(count),
            brightness,
            shown: None,
        }
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Render and flush `directive`.  Repeating the directive already on
    /// the ring is a no-op.
    pub fn show(&mut self, directive: Directive) {
        if self.shown == Some(directive) {
            return;
        }
        self.render(directive);
        self.flush();
        self.shown = Some(directive);
    }

    /// Brightness-scaled colours as they go out on the wire.
    pub fn output(&self) -> impl Iterator<Item = RGB8> + '_ {
        brightness(self.pixels.iter().copied(), self.brightness)
    }

    fn render(&mut self, directive: Directive) {
        let n = self.pixels.len();
        match directive {
            Directive::Fill(colour) => self.pixels.fill(rgb8(colour)),
            Directive::Off => self.pixels.fill(RGB8::default()),
            Directive::Progress { colour, done, total } => {
                let lit = if total == 0 {
                    0
                } else {
                    (u64::from(done) * n as u64 / u64::from(total)).min(n as u64) as usize
                };
                for (i, px) in self.pixels.iter_mut().enumerate() {
                    *px = if i < lit { rgb8(colour) } else { RGB8::default() };
                }
            }
        }
    }

    #[cfg(target_os = "espidf")]
    fn flush(&mut self) {
        let frame = brightness(self.pixels.iter().copied(), self.brightness);
        if let Err(e) = self.driver.write(frame) {
            log::error!("LED | ring write failed: {:?}", e);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn flush(&mut self) {}

    fn dark(count: u8) -> Vec<RGB8, MAX_LEDS> {
        let mut pixels = Vec::new();
        let n = usize::from(count).min(MAX_LEDS);
        // Cannot fail: `n` is capped at the capacity.
        let _ = pixels.resize(n, RGB8::default());
        pixels
    }
}

fn rgb8((r, g, b): Rgb) -> RGB8 {
    RGB8::new(r, g, b)
}
