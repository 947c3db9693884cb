// SPDX-FileCopyrightText: 2023 Rivos Inc.
//
// SPDX-License-Identifier: Apache-2.0

use spin::Once;

pub use crate::{print, println};

/// Interface for a console output device.
pub trait ConsoleDriver: Sync {
    /// Writes `bytes` to the console.
    fn write_bytes(&self, bytes: &[u8]);
}

static CONSOLE: Once<&'static dyn ConsoleDriver> = Once::new();

/// The system console used by the `print!` and `println!` macros. Output is best effort: writes
/// made before a driver is installed are dropped.
pub struct Console;

impl Console {
    /// Installs the console output device. Only the first installation takes effect.
    pub fn set_driver(driver: &'static dyn ConsoleDriver) {
        CONSOLE.call_once(|| driver);
    }

    /// Writes `bytes` to the installed console device, if there is one.
    pub fn write_bytes(bytes: &[u8]) {
        if let Some(driver) = CONSOLE.get() {
            driver.write_bytes(bytes);
        }
    }
}

impl core::fmt::Write for Console {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        Console::write_bytes(s.as_bytes());
        Ok(())
    }
}

/// `print` macro writing to the system console.
#[macro_export]
macro_rules! print {
    ($($args:tt)*) => {
        {
            use core::fmt::Write;
            let _ = write!($crate::print::Console, $($args)*);
        }
    };
}

/// `println` macro writing to the system console.
#[macro_export]
macro_rules! println {
    ($($args:tt)*) => {
        {
            use core::fmt::Write;
            let _ = writeln!($crate::print::Console, $($args)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use spin::Mutex;
    use std::{string::String, vec::Vec};

    struct Sink {
        buf: Mutex<Vec<u8>>,
    }

    impl ConsoleDriver for Sink {
        fn write_bytes(&self, bytes: &[u8]) {
            self.buf.lock().extend_from_slice(bytes);
        }
    }

    static SINK: Sink = Sink {
        buf: Mutex::new(Vec::new()),
    };

    #[test]
    fn console_output() {
        // With no driver installed output is dropped, not fatal.
        println!("dropped {}", 0);

        Console::set_driver(&SINK);
        print!("mcu at 0x{:02x}", 0x17);
        println!(" responded");

        let captured = String::from_utf8(SINK.buf.lock().clone()).unwrap();
        assert!(captured.contains("mcu at 0x17 responded\n"));
        assert!(!captured.contains("dropped"));
    }
}
