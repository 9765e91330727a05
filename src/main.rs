//! # Iso Keys
//!
//! A windowed isomorphic keyboard MIDI controller.
//!
//! ## Functionality
//! * **Interaction**: Click or touch hexagonal (Wicki-Hayden) or rectangular
//!     (chromatic fourths) keys; drag past a short threshold to scroll the grid.
//! * **Sound**: Acts as a virtual MIDI device named "Iso Keys Output" where the
//!     platform supports it, otherwise connects to the first hardware port.
//!     Connect it to any DAW or synthesizer to produce sound.
//! * **Controls**: The moon button at the top-right opens a fan of handles
//!     (skin, settings, scroll lock, exit). Keyboard: Tab switches skin, `l`
//!     locks scrolling, `n` cycles labels, `g` shows the debug overlay, `s`
//!     opens settings, Escape closes things.

use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    iso_keys::desktop_frontend::run()
}
