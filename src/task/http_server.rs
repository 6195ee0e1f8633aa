//! # HTTP server task
//! Accepts one connection at a time on port 80 and hands it to the responder.
//!
//! A connection that fails only costs that connection. A sensor or render failure raises a
//! fault and ends the task, the supervisor takes it from there.
use core::fmt::{Display, Formatter};

use crate::task::task_messages::{ALARM_STATE, FAULT_SIGNAL};
use crate::task::temperature::OnboardTemperature;
use defmt::{Debug2Format, Format, debug, error, info, warn};
use embassy_net::Stack;
use embassy_net::tcp::{self, TcpSocket};
use embedded_io_async::{ErrorKind, ErrorType, Read, Write};
use pico_alarm_buzzer::fault::Fault;
use pico_alarm_buzzer::http::{HTTP_PORT, ServeError, serve_connection};
use pico_alarm_buzzer::page::state_label;
use portable_atomic::{AtomicU32, Ordering};

/// Socket buffer size, each way. Requests and responses are well below this.
const BUFFER_SIZE: usize = 1024;

/// Connections accepted since startup
static REQUESTS: AtomicU32 = AtomicU32::new(0);

/// Socket failure, as seen by the responder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub struct SocketError(tcp::Error);

impl Display for SocketError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "socket error: {:?}", self.0)
    }
}

impl core::error::Error for SocketError {}

impl embedded_io_async::Error for SocketError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// An accepted TCP connection, readable and writable by the responder
struct TcpConnection<'s, 'b>(&'s mut TcpSocket<'b>);

impl ErrorType for TcpConnection<'_, '_> {
    type Error = SocketError;
}

impl Read for TcpConnection<'_, '_> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, SocketError> {
        self.0.read(buf).await.map_err(SocketError)
    }
}

impl Write for TcpConnection<'_, '_> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, SocketError> {
        self.0.write(buf).await.map_err(SocketError)
    }

    async fn flush(&mut self) -> Result<(), SocketError> {
        self.0.flush().await.map_err(SocketError)
    }
}

/// Serve requests until a fault ends the task
#[embassy_executor::task]
pub async fn http_server(stack: Stack<'static>, mut sensor: OnboardTemperature) {
    let mut rx_buffer = [0; BUFFER_SIZE];
    let mut tx_buffer = [0; BUFFER_SIZE];

    info!("HTTP server listening on port {}", HTTP_PORT);

    loop {
        let mut socket = TcpSocket::new(stack, &mut rx_buffer, &mut tx_buffer);

        if let Err(e) = socket.accept(HTTP_PORT).await {
            warn!("accept failed: {:?}", e);
            continue;
        }
        let request = REQUESTS.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        debug!("request #{} from {:?}", request, socket.remote_endpoint());

        let outcome = serve_connection(&mut TcpConnection(&mut socket), &ALARM_STATE, &mut sensor).await;

        socket.close();
        let _ = socket.flush().await;
        socket.abort();

        match outcome {
            Ok(Some(exchange)) => info!(
                "request #{}: {:?}, alarm {}, {} °C, {} bytes",
                request,
                exchange.route,
                state_label(exchange.enabled),
                exchange.celsius,
                exchange.body_len
            ),
            Ok(None) => debug!("request #{}: peer left without a request", request),
            Err(ServeError::Transport(e)) => warn!("request #{}: {}", request, e),
            Err(ServeError::Sensor(e)) => {
                error!("temperature reading failed: {:?}", Debug2Format(&e));
                FAULT_SIGNAL.signal(Fault::Sensor);
                return;
            }
            Err(ServeError::Render) => {
                error!("status page did not fit");
                FAULT_SIGNAL.signal(Fault::Render);
                return;
            }
        }
    }
}
