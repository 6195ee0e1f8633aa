//! # HTTP responder
//! Just enough HTTP/1.1 to switch the alarm from a browser or a script.
//!
//! Per connection: read the request line, drain the headers up to the blank line, apply the
//! route, then answer with the status page and let the caller close the socket. The method is
//! not inspected and no body is read. Every request that got as far as a request line is
//! answered with `200 OK`, whatever its path.
use core::fmt::{Debug, Display, Formatter, Write as _};

use embedded_io_async::{Read, Write};
use heapless::{String, Vec};

use crate::alarm::AlarmState;
use crate::page::StatusPage;
use crate::temperature::TemperatureSensor;

/// Port the responder listens on, on all interfaces
pub const HTTP_PORT: u16 = 80;

/// Longest line we keep. The rest of a longer line is read and dropped.
const MAX_LINE: usize = 128;

/// Bytes pulled from the connection per read
const READ_CHUNK: usize = 64;

/// Room for the response head
const HEAD_CAPACITY: usize = 128;

/// What a request does to the alarm
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Route {
    /// `/alarmon`
    Enable,
    /// `/alarmoff`
    Disable,
    /// Anything else, just report
    StatusOnly,
}

/// The paths with a side effect. Everything else is a status query.
const ROUTES: [(&str, Route); 2] = [("/alarmon", Route::Enable), ("/alarmoff", Route::Disable)];

impl Route {
    /// Look up a path in the route table.
    #[must_use]
    pub fn resolve(path: &str) -> Self {
        ROUTES
            .iter()
            .find(|(known, _)| *known == path)
            .map_or(Self::StatusOnly, |&(_, route)| route)
    }

    /// Route a request line such as `GET /alarmon? HTTP/1.1`.
    ///
    /// Only the path of the second token counts. The HTML forms append an empty query
    /// (`/alarmon?`), so query and fragment are cut off first.
    #[must_use]
    pub fn from_request_line(line: &[u8]) -> Self {
        let Ok(line) = core::str::from_utf8(line) else {
            return Self::StatusOnly;
        };
        line.split_ascii_whitespace()
            .nth(1)
            .map_or(Self::StatusOnly, |target| {
                let path = target.split(['?', '#']).next().unwrap_or(target);
                Self::resolve(path)
            })
    }

    /// Apply the route to the alarm state
    pub fn apply(self, alarm: &AlarmState) {
        match self {
            Self::Enable => alarm.set_enabled(true),
            Self::Disable => alarm.set_enabled(false),
            Self::StatusOnly => {}
        }
    }
}

/// Outcome of one answered request, for the log
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Exchange {
    /// The route that was applied
    pub route: Route,
    /// Alarm state reported back
    pub enabled: bool,
    /// Temperature reported back
    pub celsius: f32,
    /// Bytes of HTML sent
    pub body_len: usize,
}

/// Why a connection could not be served
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServeError<E, S> {
    /// Reading the request or writing the response failed, usually because the peer left
    Transport(E),
    /// The temperature could not be sampled
    Sensor(S),
    /// The page did not fit its buffer
    Render,
}

impl<E, S> ServeError<E, S> {
    /// Transport errors only cost the one connection. Everything else is a fault of the device.
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::Transport(_))
    }
}

impl<E: Debug, S: Debug> Display for ServeError<E, S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "connection failed: {e:?}"),
            Self::Sensor(e) => write!(f, "temperature reading failed: {e:?}"),
            Self::Render => f.write_str("status page too large"),
        }
    }
}

impl<E: Debug, S: Debug> core::error::Error for ServeError<E, S> {}

/// Serve one request on an accepted connection.
///
/// Returns `Ok(None)` if the peer closed the connection without sending anything. Closing the
/// connection is left to the caller.
///
/// # Errors
/// See [`ServeError`]. On a transport error the route has already been applied if the request
/// line was read completely.
pub async fn serve_connection<C, T>(
    conn: &mut C,
    alarm: &AlarmState,
    sensor: &mut T,
) -> Result<Option<Exchange>, ServeError<C::Error, T::Error>>
where
    C: Read + Write,
    T: TemperatureSensor,
{
    let Some(route) = read_request_head(conn).await.map_err(ServeError::Transport)? else {
        return Ok(None);
    };
    route.apply(alarm);
    let enabled = alarm.is_enabled();

    let celsius = sensor.read_celsius().await.map_err(ServeError::Sensor)?;
    let page = StatusPage::render(enabled, celsius).map_err(|_| ServeError::Render)?;
    write_status_page(conn, &page)
        .await
        .map_err(ServeError::Transport)?;

    Ok(Some(Exchange {
        route,
        enabled,
        celsius,
        body_len: page.len(),
    }))
}

/// Read the request line and drain the headers. Returns the route of the request, or `None`
/// if the stream ended before a request line arrived.
///
/// A stream that ends in the middle of the headers still counts as a request.
async fn read_request_head<C: Read>(conn: &mut C) -> Result<Option<Route>, C::Error> {
    let mut reader = LineReader::new(conn);
    let mut line = Vec::new();

    if !reader.next_line(&mut line).await? {
        return Ok(None);
    }
    let route = Route::from_request_line(&line);
    debug!("request routed to {:?}", route);

    while reader.next_line(&mut line).await? && !line.is_empty() {}
    Ok(Some(route))
}

/// Write the response head and the page, then flush.
async fn write_status_page<C: Write>(conn: &mut C, page: &StatusPage) -> Result<(), C::Error> {
    conn.write_all(response_head(page.len()).as_bytes()).await?;
    conn.write_all(page.as_str().as_bytes()).await?;
    conn.flush().await
}

/// The fixed response head for a body of `content_length` bytes
fn response_head(content_length: usize) -> String<HEAD_CAPACITY> {
    let mut head = String::new();
    // fixed text plus at most 20 digits, always fits
    let _ = write!(
        head,
        "HTTP/1.1 200 OK\r\n\
         Content-Length: {content_length}\r\n\
         Content-Type: text/html\r\n\
         Connection: close\r\n\
         \r\n"
    );
    head
}

/// Splits a byte stream into lines, reading it in small chunks.
struct LineReader<'c, C> {
    /// Source of the bytes
    conn: &'c mut C,
    /// Read buffer
    buf: [u8; READ_CHUNK],
    /// Next unread byte in `buf`
    pos: usize,
    /// Valid bytes in `buf`
    len: usize,
}

impl<'c, C: Read> LineReader<'c, C> {
    /// Wrap a connection
    const fn new(conn: &'c mut C) -> Self {
        Self {
            conn,
            buf: [0; READ_CHUNK],
            pos: 0,
            len: 0,
        }
    }

    /// Read the next line into `line`, without the `\n` or `\r\n` ending. Bytes past
    /// `MAX_LINE` are dropped.
    ///
    /// Returns `false` if the stream ended before a single byte of the line arrived.
    async fn next_line(&mut self, line: &mut Vec<u8, MAX_LINE>) -> Result<bool, C::Error> {
        line.clear();
        let mut got_any = false;
        loop {
            if self.pos == self.len {
                self.len = self.conn.read(&mut self.buf).await?;
                self.pos = 0;
                if self.len == 0 {
                    return Ok(got_any);
                }
            }
            let byte = self.buf[self.pos];
            self.pos += 1;
            got_any = true;

            if byte == b'\n' {
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                return Ok(true);
            }
            // overlong lines are truncated
            let _ = line.push(byte);
        }
    }
}
