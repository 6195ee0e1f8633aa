//! # Status page
//! The one HTML document the controller serves, rebuilt for every request.
use core::fmt::Write;

use heapless::String;

/// Room for the rendered page. The fixed markup is about 250 bytes.
pub const PAGE_CAPACITY: usize = 512;

/// Text shown for the alarm state
#[must_use]
pub const fn state_label(enabled: bool) -> &'static str {
    if enabled { "ON" } else { "OFF" }
}

/// A rendered status page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPage {
    /// The HTML document
    body: String<PAGE_CAPACITY>,
}

impl StatusPage {
    /// Render the page for the given alarm state and temperature.
    ///
    /// # Errors
    /// `core::fmt::Error` if the document would not fit into `PAGE_CAPACITY` bytes.
    pub fn render(enabled: bool, celsius: f32) -> Result<Self, core::fmt::Error> {
        let mut body = String::new();
        write!(
            body,
            "<!DOCTYPE html><html><head><title>Alarm</title></head><body>\
             <form action=\"/alarmon\"><input type=\"submit\" value=\"Alarm on\"></form>\
             <form action=\"/alarmoff\"><input type=\"submit\" value=\"Alarm off\"></form>\
             <p>Alarm is {}</p>\
             <p>Temperature is {:.2}</p>\
             </body></html>",
            state_label(enabled),
            celsius
        )?;
        Ok(Self { body })
    }

    /// The document
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.body.as_str()
    }

    /// Length of the document in bytes, which is what `Content-Length` needs
    #[must_use]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Never true for a rendered page
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shows_both_actions() {
        let page = StatusPage::render(false, 21.0).unwrap();
        assert!(page.as_str().contains("action=\"/alarmon\""));
        assert!(page.as_str().contains("action=\"/alarmoff\""));
    }

    #[test]
    fn shows_state_and_temperature() {
        let on = StatusPage::render(true, 23.456).unwrap();
        assert!(on.as_str().contains("<p>Alarm is ON</p>"));
        assert!(on.as_str().contains("<p>Temperature is 23.46</p>"));

        let off = StatusPage::render(false, -4.0).unwrap();
        assert!(off.as_str().contains("<p>Alarm is OFF</p>"));
        assert!(off.as_str().contains("<p>Temperature is -4.00</p>"));
    }

    #[test]
    fn length_is_bytes() {
        let page = StatusPage::render(true, 20.5).unwrap();
        assert_eq!(page.len(), page.as_str().as_bytes().len());
        assert!(!page.is_empty());
    }

    #[test]
    fn absurd_readings_still_fit() {
        assert!(StatusPage::render(true, f32::MAX).is_ok());
        assert!(StatusPage::render(true, f32::NAN).is_ok());
    }
}
